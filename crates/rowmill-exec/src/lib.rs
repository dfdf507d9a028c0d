#![forbid(unsafe_code)]
//! rowmill-exec: the deferred pipeline runtime.
//!
//! A pipeline chains record operations fluently and runs them strictly in
//! declaration order. Chains over in-memory rows run synchronously end to
//! end; a chain whose origin is an external [`source::RecordSource`]
//! becomes asynchronous at the materialization point and stays
//! asynchronous, with every later step attached as a continuation.

pub mod deferred;
pub mod pipeline;
pub mod source;

pub use deferred::{Outcome, Status};
pub use pipeline::Pipeline;
pub use source::{MemorySource, PredFn, RecordSource, RowFn};
