//! Scripted invokers for testing.
//!
//! Executors are keyed by the `id` field of their trigger; follow-up
//! actions by their dynamic text. Unscripted keys succeed with `null`
//! (effects) or no declared result (follow-ups).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{EffectInvoker, FailureSink, FollowupInvoker};
use crate::context::{ExecutionContext, FollowupRequest};
use crate::descriptor::ActionTrigger;
use crate::error::{TriggerError, TriggerResult, UncaughtPromiseError};

/// What a scripted invocation does once its delay has elapsed.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Succeed with a result.
    Returns(Value),
    /// Succeed without a declared result.
    NoResult,
    /// Fail with structured plugin response data.
    Plugin { reason: String, data: Vec<Value> },
    /// Fail with a plain message.
    Fails(String),
    /// Report a user cancellation.
    Cancelled,
    /// Panic inside the invocation.
    Panics(String),
}

impl Scripted {
    fn error(&self) -> Option<TriggerError> {
        match self {
            Scripted::Returns(_) | Scripted::NoResult => None,
            Scripted::Plugin { reason, data } => Some(TriggerError::plugin(reason, data.clone())),
            Scripted::Fails(reason) => Some(TriggerError::failed(reason)),
            Scripted::Cancelled => Some(TriggerError::Cancelled),
            Scripted::Panics(msg) => panic!("{msg}"),
        }
    }

    fn into_result(self) -> TriggerResult<Option<Value>> {
        if let Some(err) = self.error() {
            return Err(err);
        }
        match self {
            Scripted::Returns(v) => Ok(Some(v)),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone)]
struct Script {
    delay: Duration,
    outcome: Scripted,
}

/// Key the mock uses for a trigger: its `id` field, else its JSON text.
pub fn trigger_key(trigger: &ActionTrigger) -> String {
    trigger
        .0
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| trigger.0.to_string())
}

/// Effect invoker driven by per-trigger scripts.
#[derive(Default)]
pub struct MockEffects {
    scripts: RwLock<HashMap<String, Script>>,
    started: RwLock<Vec<String>>,
    completed: RwLock<Vec<String>>,
    contexts: RwLock<Vec<ExecutionContext>>,
}

impl MockEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn script(&self, id: &str, delay: Duration, outcome: Scripted) {
        self.scripts
            .write()
            .await
            .insert(id.to_string(), Script { delay, outcome });
    }

    /// Trigger keys in the order their invocations began.
    pub async fn started(&self) -> Vec<String> {
        self.started.read().await.clone()
    }

    /// Trigger keys in the order their invocations finished.
    pub async fn completed(&self) -> Vec<String> {
        self.completed.read().await.clone()
    }

    pub async fn contexts(&self) -> Vec<ExecutionContext> {
        self.contexts.read().await.clone()
    }
}

#[async_trait]
impl EffectInvoker for MockEffects {
    async fn invoke(
        &self,
        trigger: ActionTrigger,
        context: &ExecutionContext,
    ) -> TriggerResult<Value> {
        let key = trigger_key(&trigger);
        self.started.write().await.push(key.clone());
        self.contexts.write().await.push(context.clone());

        let script = self.scripts.read().await.get(&key).cloned();
        let Some(script) = script else {
            self.completed.write().await.push(key);
            return Ok(Value::Null);
        };

        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }
        self.completed.write().await.push(key);
        script
            .outcome
            .into_result()
            .map(|v| v.unwrap_or(Value::Null))
    }
}

/// Follow-up invoker driven by per-action scripts.
#[derive(Default)]
pub struct MockFollowups {
    scripts: RwLock<HashMap<String, Script>>,
    requests: RwLock<Vec<FollowupRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFollowups {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn script(&self, action: &str, delay: Duration, outcome: Scripted) {
        self.scripts
            .write()
            .await
            .insert(action.to_string(), Script { delay, outcome });
    }

    /// Every request received, in call order.
    pub async fn requests(&self) -> Vec<FollowupRequest> {
        self.requests.read().await.clone()
    }

    /// Requests received for one action.
    pub async fn requests_for(&self, action: &str) -> Vec<FollowupRequest> {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.dynamic_string.as_str() == action)
            .cloned()
            .collect()
    }

    pub async fn calls(&self, action: &str) -> usize {
        self.requests_for(action).await.len()
    }

    /// Highest number of follow-ups ever running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FollowupInvoker for MockFollowups {
    async fn invoke(&self, request: FollowupRequest) -> TriggerResult<Option<Value>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let key = request.dynamic_string.as_str().to_string();
        self.requests.write().await.push(request);

        let script = self.scripts.read().await.get(&key).cloned();
        let result = match script {
            Some(script) => {
                if !script.delay.is_zero() {
                    tokio::time::sleep(script.delay).await;
                }
                script.outcome.into_result()
            }
            None => Ok(None),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Failure sink that keeps the messages it was handed.
#[derive(Default)]
pub struct RecordingSink {
    reports: std::sync::Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<String> {
        self.reports
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl FailureSink for RecordingSink {
    fn report(&self, error: &UncaughtPromiseError) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(error.message.clone());
        }
    }
}
