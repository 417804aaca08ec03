//! Error types for composite action execution.
//!
//! `TriggerError` is what collaborators (effect and follow-up invokers) fail
//! with. `CompositeActionError` is what the orchestrator returns to its
//! caller; it is only produced when a failure could not be recovered locally.

use std::fmt;

use serde_json::Value;

use crate::context::ExecutionContext;

/// Boxed error used as an opaque underlying cause.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for collaborator invocations.
pub type TriggerResult<T> = std::result::Result<T, TriggerError>;

/// Result type for a composite action run.
pub type Result<T> = std::result::Result<T, CompositeActionError>;

/// Failure raised by an executor or a follow-up action.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    /// The user cancelled the in-flight action.
    #[error("user cancelled action execution")]
    Cancelled,

    /// A plugin call failed and returned structured response data.
    #[error("{reason}")]
    Plugin {
        reason: String,
        response_data: Vec<Value>,
    },

    /// Any other failure.
    #[error("{reason}")]
    Failed {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The task running an executor panicked.
    #[error("executor task panicked: {0}")]
    Panicked(String),
}

impl TriggerError {
    /// Unstructured failure with no underlying cause.
    pub fn failed(reason: impl Into<String>) -> Self {
        TriggerError::Failed {
            reason: reason.into(),
            source: None,
        }
    }

    /// Unstructured failure wrapping an underlying cause.
    pub fn failed_with(reason: impl Into<String>, source: impl Into<BoxError>) -> Self {
        TriggerError::Failed {
            reason: reason.into(),
            source: Some(source.into()),
        }
    }

    /// Structured plugin failure.
    pub fn plugin(reason: impl Into<String>, response_data: Vec<Value>) -> Self {
        TriggerError::Plugin {
            reason: reason.into(),
            response_data,
        }
    }

    /// Returns true if this failure is a user cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TriggerError::Cancelled)
    }
}

/// Where in a run a failure was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Executor at the given position in the descriptor.
    Executor { index: usize },
    /// "then" link at the given position in the chain.
    Then { index: usize },
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Executor { index } => write!(f, "executor[{index}]"),
            FailureStage::Then { index } => write!(f, "then[{index}]"),
        }
    }
}

/// A failure with no catch action to route to.
///
/// Preserves the original message, the context of the run, and the
/// original failure as its source.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct UncaughtPromiseError {
    pub message: String,
    pub context: ExecutionContext,
    pub stage: FailureStage,
    #[source]
    pub cause: TriggerError,
}

impl UncaughtPromiseError {
    pub fn new(context: ExecutionContext, stage: FailureStage, cause: TriggerError) -> Self {
        Self {
            message: cause.to_string(),
            context,
            stage,
            cause,
        }
    }
}

/// Errors surfaced to the caller of a composite action run.
///
/// Any outcome other than `Err` (including swallowed cancellation and a
/// handled catch) is a success from the caller's point of view.
#[derive(Debug, thiserror::Error)]
pub enum CompositeActionError {
    /// A failure occurred and no catch action was declared.
    #[error("uncaught promise failure: {0}")]
    Uncaught(#[from] UncaughtPromiseError),

    /// The catch action itself failed.
    #[error("catch action failed: {source}")]
    Catch {
        context: ExecutionContext,
        #[source]
        source: TriggerError,
    },

    /// The finally action failed. `pending` holds the failure that was
    /// waiting to propagate when finally ran, if any.
    #[error("finally action failed: {source}")]
    Finally {
        context: ExecutionContext,
        #[source]
        source: TriggerError,
        pending: Option<Box<CompositeActionError>>,
    },
}

impl CompositeActionError {
    /// Context of the run that produced this error.
    pub fn context(&self) -> &ExecutionContext {
        match self {
            CompositeActionError::Uncaught(e) => &e.context,
            CompositeActionError::Catch { context, .. } => context,
            CompositeActionError::Finally { context, .. } => context,
        }
    }

    /// The uncaught failure, if this error carries one directly or as the
    /// pending failure behind a failed finally action.
    pub fn uncaught(&self) -> Option<&UncaughtPromiseError> {
        match self {
            CompositeActionError::Uncaught(e) => Some(e),
            CompositeActionError::Catch { .. } => None,
            CompositeActionError::Finally { pending, .. } => {
                pending.as_deref().and_then(CompositeActionError::uncaught)
            }
        }
    }
}
