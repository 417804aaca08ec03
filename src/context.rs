//! Execution context for a composite action run.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::ActionRef;

/// Name of the event that triggered the run (e.g. `ON_CLICK`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(String);

impl EventType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// The entity an invocation originates from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub entity_type: Option<String>,
}

/// Metadata about who triggered the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TriggerMeta {
    pub source: Option<TriggerSource>,
    pub trigger_property_name: Option<String>,
}

/// Immutable context for one run, handed unchanged to every action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub event_type: EventType,
    pub meta: TriggerMeta,
}

impl ExecutionContext {
    pub fn new(event_type: impl Into<EventType>) -> Self {
        Self {
            event_type: event_type.into(),
            meta: TriggerMeta::default(),
        }
    }

    pub fn with_meta(mut self, meta: TriggerMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn source(&self) -> Option<&TriggerSource> {
        self.meta.source.as_ref()
    }

    pub fn trigger_property_name(&self) -> Option<&str> {
        self.meta.trigger_property_name.as_deref()
    }

    /// Build the request for a follow-up action in this context.
    pub fn followup(&self, dynamic_string: &ActionRef, response_data: Value) -> FollowupRequest {
        FollowupRequest {
            dynamic_string: dynamic_string.clone(),
            event_type: self.event_type.clone(),
            response_data,
            source: self.meta.source.clone(),
            trigger_property_name: self.meta.trigger_property_name.clone(),
        }
    }
}

/// Parameters for one then/catch/finally invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowupRequest {
    pub dynamic_string: ActionRef,
    pub event_type: EventType,
    pub response_data: Value,
    pub source: Option<TriggerSource>,
    pub trigger_property_name: Option<String>,
}
