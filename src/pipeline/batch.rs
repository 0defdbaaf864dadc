use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream;
use tracing::{error, info};

use crate::customer::CustomerLookup;
use crate::model::AssembledRecord;

use super::classifier::Classifier;
use super::context::{MessageInput, RunContext};
use super::error::PipelineError;
use super::orchestrator::Orchestrator;
use super::sink::PayloadSink;

/// Outcome of one message in a batch.
pub type BatchResult = Result<AssembledRecord, PipelineError>;

impl<C, L, S> Orchestrator<C, L, S>
where
    C: Classifier + 'static,
    L: CustomerLookup + 'static,
    S: PayloadSink + 'static,
{
    /// Processes messages concurrently, at most `workers` at a time.
    ///
    /// Each message runs on its own task. Results arrive in completion order, not input
    /// order. A task that panics is logged and produces no result.
    pub async fn run_batch(
        self: Arc<Self>,
        inputs: Vec<MessageInput>,
        ctx: RunContext,
    ) -> Vec<BatchResult> {
        let workers = self.config().workers.max(1);
        let total = inputs.len();

        let results: Vec<BatchResult> = stream::iter(inputs.into_iter().map(|input| {
            let orchestrator = Arc::clone(&self);
            let ctx = ctx.clone();
            tokio::spawn(async move { orchestrator.run(&input, &ctx).await })
        }))
        .buffer_unordered(workers)
        .filter_map(|joined| async move {
            match joined {
                Ok(result) => Some(result),
                Err(e) => {
                    error!(error = %e, "Pipeline task panicked");
                    None
                }
            }
        })
        .collect()
        .await;

        let done = results.iter().filter(|r| r.is_ok()).count();
        info!(
            total,
            done,
            not_done = results.len() - done,
            workers,
            "Batch finished"
        );
        results
    }
}
