//! External record-source contract.
//!
//! A `RecordSource` is an asynchronous record store behind the engine
//! boundary. A dataset backed by a source is not materialized until the
//! pipeline first touches it; the pipeline bridges the synchronous→
//! asynchronous transition at that point.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use rowmill_core::prelude::*;
use rowmill_expr::KeyFn;
use rowmill_operators::{reconcile, MergeMode};

/// Source-side row transform applied during `fetch_all`.
pub type RowFn = Arc<dyn Fn(Row) -> Row + Send + Sync>;

/// Source-side row predicate applied during `fetch_all`.
pub type PredFn = Arc<dyn Fn(&Row) -> bool + Send + Sync>;

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch every record, applying the optional filter and then the
    /// optional map on the source side.
    async fn fetch_all(&self, map: Option<RowFn>, filter: Option<PredFn>) -> Result<Vec<Row>>;

    /// Reconcile the store's records against `rows` by identity key.
    async fn reconcile(
        &self,
        mode: MergeMode,
        target_key: KeyFn,
        source_key: KeyFn,
        rows: Vec<Row>,
    ) -> Result<()>;
}

/// In-memory source, used by tests and as the reference implementation of
/// the contract.
pub struct MemorySource {
    rows: Mutex<Vec<Row>>,
}

impl MemorySource {
    pub fn new(rows: Vec<Row>) -> MemorySource {
        MemorySource {
            rows: Mutex::new(rows),
        }
    }

    pub fn from_json(v: serde_json::Value) -> MemorySource {
        MemorySource::new(rows_from_json(v))
    }

    /// Current contents, for assertions after a reconcile.
    pub fn snapshot(&self) -> Vec<Row> {
        self.rows.lock().expect("source mutex poisoned").clone()
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn fetch_all(&self, map: Option<RowFn>, filter: Option<PredFn>) -> Result<Vec<Row>> {
        let rows = self.snapshot();
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(pred) = &filter {
                if !pred(&row) {
                    continue;
                }
            }
            out.push(match &map {
                Some(f) => f(row),
                None => row,
            });
        }
        Ok(out)
    }

    async fn reconcile(
        &self,
        mode: MergeMode,
        target_key: KeyFn,
        source_key: KeyFn,
        rows: Vec<Row>,
    ) -> Result<()> {
        let mut guard = self.rows.lock().expect("source mutex poisoned");
        let target = std::mem::take(&mut *guard);
        *guard = reconcile(target, rows, &*target_key, &*source_key, mode);
        Ok(())
    }
}
