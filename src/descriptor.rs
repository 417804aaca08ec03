//! Composite action descriptor.
//!
//! A descriptor bundles the executors to run in parallel with the
//! follow-up actions (`then`, `catch`, `finally`) that consume their result.
//! Field names on the wire match the trigger payload the builder emits:
//! `executor`, `then`, `catch`, `finally`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Placeholder argument set used whenever there is no result to pass on.
pub fn placeholder_arguments() -> Value {
    json!([{}])
}

/// Opaque handle to a dynamic follow-up action.
///
/// The text is evaluated by the follow-up invoker; the orchestrator only
/// passes it through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionRef(String);

impl ActionRef {
    pub fn new(dynamic_string: impl Into<String>) -> Self {
        Self(dynamic_string.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Opaque description of one executor, handed to the effect invoker as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionTrigger(pub Value);

impl ActionTrigger {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The `type` field of the trigger, if it has one. Used for logging.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }
}

impl From<Value> for ActionTrigger {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Executors plus the then/catch/finally actions that follow them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeActionDescriptor {
    #[serde(default)]
    pub executor: Vec<ActionTrigger>,
    #[serde(default)]
    pub then: Vec<ActionRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catch: Option<ActionRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finally: Option<ActionRef>,
}

impl CompositeActionDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executor(mut self, trigger: impl Into<ActionTrigger>) -> Self {
        self.executor.push(trigger.into());
        self
    }

    pub fn then(mut self, action: impl Into<ActionRef>) -> Self {
        self.then.push(action.into());
        self
    }

    pub fn catch(mut self, action: impl Into<ActionRef>) -> Self {
        self.catch = Some(action.into());
        self
    }

    pub fn finally(mut self, action: impl Into<ActionRef>) -> Self {
        self.finally = Some(action.into());
        self
    }

    /// Parse a descriptor from its JSON trigger payload.
    pub fn from_json(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_trigger_payload() {
        let descriptor = CompositeActionDescriptor::from_json(json!({
            "executor": [
                { "type": "RUN_PLUGIN_ACTION", "actionId": "q1" },
                { "type": "STORE_VALUE", "key": "k", "value": 1 }
            ],
            "then": ["{{ showAlert('done') }}"],
            "catch": "{{ showAlert('failed') }}"
        }))
        .unwrap();

        assert_eq!(descriptor.executor.len(), 2);
        assert_eq!(descriptor.executor[0].kind(), Some("RUN_PLUGIN_ACTION"));
        assert_eq!(descriptor.then, vec![ActionRef::new("{{ showAlert('done') }}")]);
        assert!(descriptor.catch.is_some());
        assert!(descriptor.finally.is_none());
    }

    #[test]
    fn test_missing_then_is_empty() {
        let descriptor = CompositeActionDescriptor::from_json(json!({ "executor": [] })).unwrap();
        assert!(descriptor.then.is_empty());
        assert!(descriptor.executor.is_empty());
    }

    #[test]
    fn test_builder() {
        let descriptor = CompositeActionDescriptor::new()
            .executor(json!({ "type": "A" }))
            .then("a")
            .then("b")
            .finally("f");
        assert_eq!(descriptor.then.len(), 2);
        assert_eq!(descriptor.finally.as_ref().map(ActionRef::as_str), Some("f"));
    }

    #[test]
    fn test_placeholder_shape() {
        assert_eq!(placeholder_arguments(), json!([{}]));
    }
}
