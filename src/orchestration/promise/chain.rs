//! Sequential "then" chain.
//!
//! Links run strictly one after another. Each link receives the previous
//! link's declared result; the first link receives the joined executor
//! results.

use serde_json::Value;
use tracing::debug;

use crate::context::ExecutionContext;
use crate::descriptor::{placeholder_arguments, ActionRef};
use crate::error::TriggerError;
use crate::orchestration::trigger::FollowupInvoker;

/// A link failure that aborted the chain.
#[derive(Debug)]
pub struct ChainFailure {
    pub index: usize,
    pub error: TriggerError,
}

/// Argument set for the first link, built from the joined results.
///
/// One result is unwrapped. No results become the placeholder, as does a
/// single `null` result.
pub fn initial_arguments(mut results: Vec<Value>) -> Value {
    match results.len() {
        0 => placeholder_arguments(),
        1 => or_placeholder(results.pop()),
        _ => Value::Array(results),
    }
}

/// A link's declared result as the next link's arguments.
fn or_placeholder(result: Option<Value>) -> Value {
    match result {
        Some(Value::Null) | None => placeholder_arguments(),
        Some(value) => value,
    }
}

/// Walk the chain, threading each link's result into the next.
///
/// Returns the argument set a following link would receive.
#[tracing::instrument(name = "promise.chain", skip_all, fields(links = links.len()))]
pub async fn walk_chain(
    followups: &dyn FollowupInvoker,
    links: &[ActionRef],
    arguments: Value,
    context: &ExecutionContext,
    trace_arguments: bool,
) -> Result<Value, ChainFailure> {
    let mut arguments = arguments;
    for (index, link) in links.iter().enumerate() {
        if trace_arguments {
            debug!(index, %link, arguments = %arguments, "Running then link");
        } else {
            debug!(index, %link, "Running then link");
        }

        let request = context.followup(link, arguments);
        arguments = match followups.invoke(request).await {
            Ok(result) => or_placeholder(result),
            Err(error) => return Err(ChainFailure { index, error }),
        };
    }
    Ok(arguments)
}
