#![forbid(unsafe_code)]
//! rowmill: an in-memory relational/aggregation engine with deferred fluent
//! pipelines.
//!
//! This crate re-exports the public surface of the workspace members:
//! the row/value model and key signatures (`rowmill-core`), matchers and
//! the matcher→selector compiler (`rowmill-expr`), the flat operators
//! (`rowmill-operators`), nested datasets (`rowmill-dataset`), the
//! deferred pipeline (`rowmill-exec`), and markup rendering
//! (`rowmill-render`).

pub use rowmill_core::config::EngineConfig;
pub use rowmill_core::error::{Error, Result};
pub use rowmill_core::signature::KeySig;
pub use rowmill_core::value::{rows_from_json, value_cmp, value_eq, Record, Row, Value};

pub use rowmill_expr::{compile, FieldPath, KeyFn, MatchExpr, Matcher, PairedSelectors};

pub use rowmill_operators::aggregate;
pub use rowmill_operators::{
    join, quick_sort, reconcile, Aggregations, Algorithm, BucketIndex, JoinSpec, JoinType,
    MapMode, MapOut, MergeFlags, MergeMode, PairMap, Reducer,
};

pub use rowmill_dataset::{Data, Dataset};

pub use rowmill_exec::{MemorySource, Outcome, Pipeline, PredFn, RecordSource, RowFn, Status};

pub use rowmill_render::render;
