//! The fluent chain surface.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use rowmill_core::prelude::*;
use rowmill_dataset::Dataset;
use rowmill_expr::KeyFn;
use rowmill_operators::{Aggregations, Algorithm, JoinSpec, MergeMode};

use crate::deferred::{Outcome, Status};
use crate::source::{PredFn, RecordSource, RowFn};

type Step = Box<dyn FnOnce(Dataset, &EngineConfig) -> Result<Dataset> + Send>;
type Handler = Box<dyn FnOnce(Error) -> Dataset + Send>;

enum Origin {
    Dataset(Dataset),
    Source {
        source: Arc<dyn RecordSource>,
        map: Option<RowFn>,
        filter: Option<PredFn>,
    },
}

/// A queued chain of record operations over one dataset value. Operations
/// only queue work; `run` (or `materialize`) executes the chain strictly
/// in declaration order.
pub struct Pipeline {
    origin: Origin,
    steps: Vec<Step>,
    handler: Option<Handler>,
    config: EngineConfig,
}

impl Pipeline {
    pub fn from_dataset(dataset: Dataset) -> Pipeline {
        Pipeline {
            origin: Origin::Dataset(dataset),
            steps: Vec::new(),
            handler: None,
            config: EngineConfig::default(),
        }
    }

    pub fn from_rows(rows: Vec<Row>) -> Pipeline {
        Pipeline::from_dataset(Dataset::from_rows(rows))
    }

    pub fn from_json(v: serde_json::Value) -> Pipeline {
        Pipeline::from_dataset(Dataset::from_json(v))
    }

    /// Chain over an unmaterialized external source. The pipeline becomes
    /// asynchronous at the first executed step and never reverts.
    pub fn from_source(source: Arc<dyn RecordSource>) -> Pipeline {
        Pipeline {
            origin: Origin::Source {
                source,
                map: None,
                filter: None,
            },
            steps: Vec::new(),
            handler: None,
            config: EngineConfig::default(),
        }
    }

    /// Same as [`Pipeline::from_source`], with a map/filter pushed down to
    /// the source's `fetch_all`.
    pub fn from_source_with(
        source: Arc<dyn RecordSource>,
        map: Option<RowFn>,
        filter: Option<PredFn>,
    ) -> Pipeline {
        Pipeline {
            origin: Origin::Source {
                source,
                map,
                filter,
            },
            steps: Vec::new(),
            handler: None,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Pipeline {
        self.config = config;
        self
    }

    /// Register the single error handler. A step failure is converted into
    /// the handler's replacement dataset and the run finishes `Rejected`;
    /// remaining steps are skipped.
    pub fn on_error(mut self, handler: impl FnOnce(Error) -> Dataset + Send + 'static) -> Pipeline {
        self.handler = Some(Box::new(handler));
        self
    }

    fn chain(mut self, step: impl FnOnce(Dataset, &EngineConfig) -> Result<Dataset> + Send + 'static) -> Pipeline {
        self.steps.push(Box::new(step));
        self
    }

    pub fn map(self, f: impl Fn(Row) -> Row + Send + Sync + 'static) -> Pipeline {
        self.chain(move |ds, _| ds.map(&f))
    }

    pub fn filter(self, pred: impl Fn(&Row) -> bool + Send + Sync + 'static) -> Pipeline {
        self.chain(move |ds, _| ds.filter(&pred))
    }

    pub fn sort(self, order: impl Fn(&Row) -> Value + Send + Sync + 'static) -> Pipeline {
        self.chain(move |ds, _| ds.sort(&order))
    }

    pub fn group(self, key: impl Fn(&Row) -> Value + Send + Sync + 'static) -> Pipeline {
        self.chain(move |ds, _| ds.group(&key))
    }

    pub fn ungroup(self) -> Pipeline {
        self.chain(|ds, _| ds.ungroup(None))
    }

    pub fn ungroup_with(
        self,
        combiner: impl Fn(Row) -> Row + Send + Sync + 'static,
    ) -> Pipeline {
        self.chain(move |ds, _| ds.ungroup(Some(&combiner)))
    }

    pub fn distinct(self) -> Pipeline {
        self.chain(|ds, _| ds.distinct(None, None))
    }

    pub fn distinct_by(self, key: KeyFn, tiebreak: Option<KeyFn>) -> Pipeline {
        self.chain(move |ds, _| {
            let keyf = |row: &Row| key(row);
            match &tiebreak {
                Some(t) => {
                    let tf = |row: &Row| t(row);
                    ds.distinct(Some(&keyf), Some(&tf))
                }
                None => ds.distinct(Some(&keyf), None),
            }
        })
    }

    pub fn reduce(self, aggregations: Aggregations) -> Pipeline {
        self.chain(move |ds, _| ds.reduce(&aggregations))
    }

    /// Join the current dataset (left side) against materialized right
    /// rows. An `Auto` algorithm hint honors the config's hash-join
    /// preference.
    pub fn join(self, right: Vec<Row>, spec: JoinSpec) -> Pipeline {
        self.chain(move |ds, cfg| {
            let mut spec = spec;
            if spec.algorithm == Algorithm::Auto && !cfg.prefer_hash_joins {
                spec.algorithm = Algorithm::Loop;
            }
            ds.join(&right, &spec)
        })
    }

    /// Reconcile the current dataset against source rows by identity key.
    pub fn merge(
        self,
        source: Vec<Row>,
        mode: MergeMode,
        target_key: KeyFn,
        source_key: KeyFn,
    ) -> Pipeline {
        self.chain(move |ds, _| {
            let tk = |row: &Row| target_key(row);
            let sk = |row: &Row| source_key(row);
            ds.reconcile(&source, &tk, &sk, mode)
        })
    }

    /// Peek at the current dataset without changing it.
    pub fn with(self, inspector: impl FnOnce(&Dataset) + Send + 'static) -> Pipeline {
        self.chain(move |ds, _| {
            inspector(&ds);
            Ok(ds)
        })
    }

    /// Execute the queued steps. Synchronous origins run to completion on
    /// the caller's thread; a source origin materializes asynchronously
    /// and every step becomes a continuation.
    pub fn run(self) -> Result<Outcome> {
        let config = self.config;
        let mut handler = self.handler;

        match self.origin {
            Origin::Dataset(dataset) => {
                let mut current = dataset;
                for step in self.steps {
                    match apply_step(step, current, &config) {
                        Ok(next) => current = next,
                        Err(err) => {
                            return match handler.take() {
                                Some(h) => Ok(Outcome::Ready {
                                    dataset: h(err),
                                    status: Status::Rejected,
                                }),
                                None => Err(err),
                            };
                        }
                    }
                }
                Ok(Outcome::Ready {
                    dataset: current,
                    status: Status::Resolved,
                })
            }
            Origin::Source {
                source,
                map,
                filter,
            } => {
                tracing::debug!("materializing external source; pipeline is now asynchronous");
                let mut future: BoxFuture<'static, Result<Dataset>> = async move {
                    Ok(Dataset::from_rows(source.fetch_all(map, filter).await?))
                }
                .boxed();

                for step in self.steps {
                    let cfg = config.clone();
                    let prev = future;
                    future = async move {
                        let dataset = prev.await?;
                        apply_step(step, dataset, &cfg)
                    }
                    .boxed();
                }

                let future = match handler.take() {
                    Some(h) => async move {
                        match future.await {
                            Ok(dataset) => Ok(dataset),
                            Err(err) => Ok(h(err)),
                        }
                    }
                    .boxed(),
                    None => future,
                };

                Ok(Outcome::Deferred(future))
            }
        }
    }

    /// Run, then await the dataset regardless of pipeline mode.
    pub async fn materialize(self) -> Result<Dataset> {
        self.run()?.collect().await
    }

    /// Run with one final map applied to each base row, then await.
    pub async fn materialize_with(
        self,
        f: impl Fn(Row) -> Row + Send + Sync + 'static,
    ) -> Result<Dataset> {
        self.map(f).materialize().await
    }

    /// Materialize and render the result as markup.
    pub async fn collect_markup(self, caption: Option<&str>) -> Result<String> {
        let config = self.config.clone();
        let dataset = self.materialize().await?;
        Ok(rowmill_render::render(
            &dataset.into_value(),
            caption,
            &config,
        ))
    }
}

fn apply_step(step: Step, dataset: Dataset, config: &EngineConfig) -> Result<Dataset> {
    let next = step(dataset, config)?;
    if config.strict_shapes {
        next.validate()?;
    }
    Ok(next)
}
