//! Deferred pipeline values.
//!
//! A pipeline finishes either synchronously with a dataset in hand or with
//! an outstanding asynchronous value. Status never moves back from
//! `Promisified` to a synchronous state.

use futures::future::BoxFuture;

use rowmill_core::prelude::*;
use rowmill_dataset::Dataset;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Steps queued, nothing executed yet.
    Pending,
    /// Synchronous completion.
    Resolved,
    /// The result is an outstanding asynchronous value.
    Promisified,
    /// The error handler converted a failure into a value.
    Rejected,
}

/// Result of running a pipeline.
pub enum Outcome {
    Ready { dataset: Dataset, status: Status },
    Deferred(BoxFuture<'static, Result<Dataset>>),
}

impl Outcome {
    pub fn status(&self) -> Status {
        match self {
            Outcome::Ready { status, .. } => *status,
            Outcome::Deferred(_) => Status::Promisified,
        }
    }

    /// Await the dataset regardless of how the pipeline finished.
    pub async fn collect(self) -> Result<Dataset> {
        match self {
            Outcome::Ready { dataset, .. } => Ok(dataset),
            Outcome::Deferred(future) => future.await,
        }
    }

    /// The dataset of a synchronously finished pipeline.
    pub fn expect_sync(self) -> Result<Dataset> {
        match self {
            Outcome::Ready { dataset, .. } => Ok(dataset),
            Outcome::Deferred(_) => Err(Error::Source(
                "pipeline is promisified; collect it asynchronously".into(),
            )),
        }
    }
}
