//! Dataset pipelines
//!
//! A pipeline applies an ordered list of [`ItemAction`]s to every item of a
//! dataset. Items run concurrently; the actions of one item run in order.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::actions::ItemAction;
use crate::dataset::{Context, Dataset, DatasetItem};
use crate::error::{FoundryError, FoundryResult};
use crate::events::{EventBus, PipelineEvent};

/// Run parameters; each entry becomes a context value (`context.<name>`)
pub type PipelineParams = Map<String, Value>;

/// A runnable unit of work supervised by a display session
#[async_trait]
pub trait Pipeline: Send + Sync {
    fn name(&self) -> &str;

    /// Run to completion or until `cancel` fires.
    ///
    /// On cancellation this returns [`FoundryError::Cancelled`], but only
    /// after every in-flight action has finished unwinding.
    async fn run(
        &self,
        params: &PipelineParams,
        events: &EventBus,
        cancel: CancellationToken,
    ) -> FoundryResult<PipelineReport>;
}

/// An action that failed for one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFailure {
    pub item_id: String,
    pub action: String,
    pub message: String,
}

/// Summary of a finished pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub name: String,
    pub items: usize,
    pub failures: Vec<ActionFailure>,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Applies actions to each item of a dataset
pub struct ItemPipeline {
    name: String,
    dataset: Dataset,
    actions: Vec<Arc<dyn ItemAction>>,
    context: Context,
    concurrency: usize,
}

impl ItemPipeline {
    pub fn new(name: impl Into<String>, dataset: Dataset, context: Context) -> Self {
        Self {
            name: name.into(),
            dataset,
            actions: Vec::new(),
            context,
            concurrency: 4,
        }
    }

    pub fn with_action(mut self, action: impl ItemAction + 'static) -> Self {
        self.actions.push(Arc::new(action));
        self
    }

    /// Maximum number of items processed at once (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// The dataset, including anything actions published during a run
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    async fn run_item(
        &self,
        item: &DatasetItem,
        context: &Context,
        events: &EventBus,
    ) -> Vec<ActionFailure> {
        let mut failures = Vec::new();
        if context.is_cancelled() {
            return failures;
        }

        events.publish(PipelineEvent::item_started(item.id()));
        for action in &self.actions {
            if context.is_cancelled() {
                debug!(item_id = %item.id(), action = action.name(), "Skipping action after cancellation");
                break;
            }

            match action.run(item, context).await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {
                    debug!(item_id = %item.id(), action = action.name(), "Action cancelled");
                    break;
                }
                Err(e) => {
                    error!(item_id = %item.id(), action = action.name(), "Action failed: {}", e);
                    failures.push(ActionFailure {
                        item_id: item.id().to_string(),
                        action: action.name().to_string(),
                        message: e.to_string(),
                    });
                    break;
                }
            }
        }

        events.publish(PipelineEvent::item_finished(item.id(), failures.is_empty()));
        failures
    }
}

#[async_trait]
impl Pipeline for ItemPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        params: &PipelineParams,
        events: &EventBus,
        cancel: CancellationToken,
    ) -> FoundryResult<PipelineReport> {
        let context = params
            .iter()
            .fold(self.context.clone(), |context, (key, value)| {
                context.with_value(key.clone(), value.clone())
            })
            .with_cancel(cancel.clone());

        info!(
            pipeline = %self.name,
            items = self.dataset.len(),
            concurrency = self.concurrency,
            "Starting pipeline"
        );
        events.publish(PipelineEvent::pipeline_started(&self.name));

        let context = &context;
        let items = self.dataset.items.iter().cloned();
        let failures: Vec<ActionFailure> = futures::stream::iter(items)
            .map(|item: Arc<DatasetItem>| async move {
                self.run_item(&item, context, events).await
            })
            .buffer_unordered(self.concurrency)
            .flat_map(futures::stream::iter)
            .collect()
            .await;

        if cancel.is_cancelled() {
            warn!(pipeline = %self.name, "Pipeline cancelled");
            events.publish(PipelineEvent::pipeline_finished(&self.name, false));
            return Err(FoundryError::Cancelled);
        }

        let report = PipelineReport {
            name: self.name.clone(),
            items: self.dataset.len(),
            failures,
        };
        info!(
            pipeline = %self.name,
            failures = report.failures.len(),
            "Pipeline finished"
        );
        events.publish(PipelineEvent::pipeline_finished(&self.name, report.succeeded()));
        Ok(report)
    }
}
