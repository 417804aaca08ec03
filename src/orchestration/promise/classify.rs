//! Failure classification.
//!
//! Every failure raised during the join or the then chain is reduced to
//! one of three routes. Only the route decides what happens next; the
//! stage is kept for diagnostics.

use serde_json::Value;

use crate::error::TriggerError;

/// Routing class of a run failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedFailure {
    /// User cancellation. Swallowed: no catch, no propagation.
    Cancelled,
    /// Structured plugin failure. The payload goes to catch verbatim.
    PluginFailure(Vec<Value>),
    /// Anything else. The message goes to catch as a single argument.
    GenericFailure(String),
}

impl ClassifiedFailure {
    /// Classify a collaborator failure.
    pub fn of(err: &TriggerError) -> Self {
        match err {
            TriggerError::Cancelled => ClassifiedFailure::Cancelled,
            TriggerError::Plugin { response_data, .. } => {
                ClassifiedFailure::PluginFailure(response_data.clone())
            }
            TriggerError::Failed { .. } | TriggerError::Panicked(_) => {
                ClassifiedFailure::GenericFailure(err.to_string())
            }
        }
    }

    /// Argument set the catch action receives, or `None` when the failure
    /// must not reach catch at all.
    pub fn catch_arguments(&self) -> Option<Value> {
        match self {
            ClassifiedFailure::Cancelled => None,
            ClassifiedFailure::PluginFailure(payload) => Some(Value::Array(payload.clone())),
            ClassifiedFailure::GenericFailure(message) => {
                Some(Value::Array(vec![Value::String(message.clone())]))
            }
        }
    }
}
