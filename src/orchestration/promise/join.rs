//! Parallel join over a composite action's executors.
//!
//! Each executor runs on its own spawned task. Results are reassembled in
//! descriptor order. The join resolves on the first failure it observes;
//! the remaining tasks are detached, not aborted, so they finish in the
//! background and their outcomes are dropped.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use tokio::task::JoinError;
use tracing::{debug, Instrument};

use crate::context::ExecutionContext;
use crate::descriptor::ActionTrigger;
use crate::error::TriggerError;
use crate::orchestration::trigger::EffectInvoker;

/// An executor failure observed by the join.
#[derive(Debug)]
pub struct JoinFailure {
    pub index: usize,
    pub error: TriggerError,
}

/// Run every executor concurrently and wait for all results, or the first
/// failure.
#[tracing::instrument(name = "promise.join", skip_all, fields(executors = executors.len()))]
pub async fn join_executors(
    effects: Arc<dyn EffectInvoker>,
    executors: Vec<ActionTrigger>,
    context: &ExecutionContext,
) -> Result<Vec<Value>, JoinFailure> {
    if executors.is_empty() {
        return Ok(Vec::new());
    }

    let total = executors.len();
    let mut pending: FuturesUnordered<_> = executors
        .into_iter()
        .enumerate()
        .map(|(index, trigger)| {
            let effects = Arc::clone(&effects);
            let context = context.clone();
            let kind = trigger.kind().unwrap_or("unknown").to_string();
            let span = tracing::debug_span!("promise.executor", index, %kind);
            let handle = tokio::spawn(
                async move { effects.invoke(trigger, &context).await }.instrument(span),
            );
            async move { (index, handle.await) }
        })
        .collect();

    let mut results: Vec<Option<Value>> = vec![None; total];
    while let Some((index, joined)) = pending.next().await {
        match flatten(joined) {
            Ok(value) => {
                debug!(index, "Executor completed");
                results[index] = Some(value);
            }
            Err(error) => {
                debug!(
                    index,
                    still_running = pending.len(),
                    error = %error,
                    "Executor failed, detaching remaining executors"
                );
                return Err(JoinFailure { index, error });
            }
        }
    }

    Ok(results
        .into_iter()
        .map(|r| r.unwrap_or(Value::Null))
        .collect())
}

fn flatten(joined: Result<Result<Value, TriggerError>, JoinError>) -> Result<Value, TriggerError> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => {
            let payload = e.into_panic();
            let message = payload
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(TriggerError::Panicked(message))
        }
        Err(e) => Err(TriggerError::failed_with("executor task aborted", e)),
    }
}
