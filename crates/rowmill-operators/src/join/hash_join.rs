//! Bucket-partitioned join.
//!
//! Builds one `BucketIndex` per side from the paired key selectors, then
//! loop-joins each left bucket against the right bucket with the same
//! signature. The in-bucket pairs re-check the original matcher, since
//! extracted key tuples may under-approximate the predicate. Rows from
//! unclaimed right buckets are never paired, so they are emitted as
//! unmatched singles without re-validation.

use rowmill_core::prelude::*;
use rowmill_expr::{KeyFn, Matcher};

use crate::bucket::BucketIndex;

use super::{emit, loop_join, JoinType, PairMap};

#[allow(clippy::too_many_arguments)]
pub(crate) fn run(
    left: Vec<Row>,
    right: Vec<Row>,
    matcher: &Matcher,
    pair_map: &PairMap,
    join_type: JoinType,
    left_key: &KeyFn,
    right_key: &KeyFn,
    distinct: bool,
) -> Vec<Row> {
    let mut left_index = BucketIndex::build(left, &**left_key, distinct);
    let mut right_index = BucketIndex::build(right, &**right_key, distinct);

    let mut out = Vec::new();

    // Matches plus left-unmatched, bucket pair by bucket pair.
    while let Some((sig, left_bucket)) = left_index.pop_first() {
        let right_bucket = right_index.take(&sig);
        loop_join::run(
            &left_bucket,
            &right_bucket,
            matcher,
            pair_map,
            join_type,
            &mut out,
        );
    }

    // Whatever the left side never claimed is right-unmatched.
    if join_type.keeps_right() {
        for bucket in right_index.into_buckets() {
            for row in &bucket {
                emit(pair_map.map(None, Some(row)), &mut out);
            }
        }
    }

    out
}
