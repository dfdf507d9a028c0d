#![forbid(unsafe_code)]
//! rowmill-operators: flat-sequence operators of the engine.
//!
//! Everything here works on plain `Vec<Row>` at one nesting level; the
//! dataset crate lifts these operators to arbitrary group depth.

pub mod aggregate;
pub mod bucket;
pub mod join;
pub mod sort;

pub use aggregate::{Aggregations, Reducer};
pub use bucket::BucketIndex;
pub use join::reconcile::{reconcile, MergeFlags, MergeMode};
pub use join::{join, Algorithm, JoinSpec, JoinType, MapMode, MapOut, PairMap};
pub use sort::quick_sort;
