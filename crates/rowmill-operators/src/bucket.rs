//! Signature-keyed bucket partitioning.
//!
//! A `BucketIndex` partitions rows into insertion-ordered buckets keyed by
//! the canonical signature of a selector's output. Joins consume buckets
//! via `take`; grouping and distinct read them out in order.

use indexmap::map::Entry;
use indexmap::IndexMap;

use rowmill_core::prelude::*;

pub struct BucketIndex {
    buckets: IndexMap<KeySig, Vec<Row>>,
}

impl BucketIndex {
    /// Partition `rows` by the signature of `key`'s output. With `distinct`
    /// only the first row per signature is kept. Input order is preserved
    /// within and across buckets.
    pub fn build<F>(rows: Vec<Row>, key: &F, distinct: bool) -> BucketIndex
    where
        F: Fn(&Row) -> Value + ?Sized,
    {
        let mut buckets: IndexMap<KeySig, Vec<Row>> = IndexMap::new();
        for row in rows {
            let sig = KeySig::of(&key(&row));
            match buckets.entry(sig) {
                Entry::Occupied(mut e) => {
                    if !distinct {
                        e.get_mut().push(row);
                    }
                }
                Entry::Vacant(e) => {
                    e.insert(vec![row]);
                }
            }
        }
        BucketIndex { buckets }
    }

    /// Remove and return the bucket for a signature; empty when absent.
    /// Removal keeps the remaining buckets in insertion order.
    pub fn take(&mut self, sig: &KeySig) -> Vec<Row> {
        self.buckets.shift_remove(sig).unwrap_or_default()
    }

    /// Remove and return the oldest remaining bucket.
    pub fn pop_first(&mut self) -> Option<(KeySig, Vec<Row>)> {
        self.buckets.shift_remove_index(0)
    }

    pub fn keys(&self) -> impl Iterator<Item = &KeySig> {
        self.buckets.keys()
    }

    pub fn buckets(&self) -> impl Iterator<Item = &[Row]> {
        self.buckets.values().map(Vec::as_slice)
    }

    pub fn into_buckets(self) -> impl Iterator<Item = Vec<Row>> {
        self.buckets.into_values()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
