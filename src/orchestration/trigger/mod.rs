//! Collaborator contracts for composite action runs.
//!
//! `EffectInvoker` runs one executor; `FollowupInvoker` runs one
//! then/catch/finally action given its dynamic text and arguments.
//! `FailureSink` receives uncaught failures before they propagate.
//!
//! - `mock`: scripted in-memory invokers for tests

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;

use crate::context::{ExecutionContext, FollowupRequest};
use crate::descriptor::ActionTrigger;
use crate::error::{TriggerResult, UncaughtPromiseError};

/// Executes one executor of a composite action.
#[async_trait]
pub trait EffectInvoker: Send + Sync {
    /// Run the trigger and return its result.
    ///
    /// Fail with `TriggerError::Plugin` to hand structured response data to
    /// the catch action, or `TriggerError::Cancelled` when the user aborted.
    async fn invoke(&self, trigger: ActionTrigger, context: &ExecutionContext)
        -> TriggerResult<Value>;
}

/// Executes one follow-up action.
#[async_trait]
pub trait FollowupInvoker: Send + Sync {
    /// Run the action. `Ok(None)` means the action declared no result.
    async fn invoke(&self, request: FollowupRequest) -> TriggerResult<Option<Value>>;
}

/// Receives uncaught failures. Fire-and-forget.
pub trait FailureSink: Send + Sync {
    fn report(&self, error: &UncaughtPromiseError);
}

/// Logs uncaught failures through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFailureSink;

impl FailureSink for TracingFailureSink {
    fn report(&self, err: &UncaughtPromiseError) {
        error!(
            event_type = %err.context.event_type,
            stage = %err.stage,
            source = err.context.source().map(|s| s.name.as_str()).unwrap_or("unknown"),
            property = err.context.trigger_property_name().unwrap_or(""),
            error = %err.cause,
            "Uncaught promise failure"
        );
    }
}
