//! Convenient re-exports for downstream crates.

pub use crate::config::EngineConfig;
pub use crate::error::{Error, Result};
pub use crate::signature::KeySig;
pub use crate::value::{rows_from_json, value_cmp, value_eq, Record, Row, Value};
