//! Exhaustive O(n·m) pairwise join.

use rowmill_core::prelude::*;
use rowmill_expr::Matcher;

use super::{emit, JoinType, PairMap};

/// Evaluate the matcher over the full cross product, emitting mapper output
/// for every match, then unmatched singles per the join type.
pub(crate) fn run(
    left: &[Row],
    right: &[Row],
    matcher: &Matcher,
    pair_map: &PairMap,
    join_type: JoinType,
    out: &mut Vec<Row>,
) {
    let mut left_hit = vec![false; left.len()];
    let mut right_hit = vec![false; right.len()];

    for (li, l) in left.iter().enumerate() {
        for (ri, r) in right.iter().enumerate() {
            if matcher.matches(l, r) {
                left_hit[li] = true;
                right_hit[ri] = true;
                emit(pair_map.map(Some(l), Some(r)), out);
            }
        }
    }

    if join_type.keeps_left() {
        for (li, l) in left.iter().enumerate() {
            if !left_hit[li] {
                emit(pair_map.map(Some(l), None), out);
            }
        }
    }

    if join_type.keeps_right() {
        for (ri, r) in right.iter().enumerate() {
            if !right_hit[ri] {
                emit(pair_map.map(None, Some(r)), out);
            }
        }
    }
}
