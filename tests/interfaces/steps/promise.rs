//! Composite promise action step definitions.

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when, World};
use promise_action::orchestration::trigger::mock::{
    MockEffects, MockFollowups, RecordingSink, Scripted,
};
use promise_action::{
    CompositeActionDescriptor, CompositeActionError, EventType, PromiseOrchestrator, TriggerMeta,
};
use serde_json::{json, Value};

/// Test context for composite action scenarios.
#[derive(World)]
#[world(init = Self::new)]
pub struct PromiseWorld {
    effects: Arc<MockEffects>,
    followups: Arc<MockFollowups>,
    sink: Arc<RecordingSink>,
    descriptor: CompositeActionDescriptor,
    outcome: Option<Result<(), CompositeActionError>>,
}

impl std::fmt::Debug for PromiseWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromiseWorld")
            .field("descriptor", &self.descriptor)
            .field("outcome", &self.outcome)
            .finish()
    }
}

impl PromiseWorld {
    fn new() -> Self {
        Self {
            effects: Arc::new(MockEffects::new()),
            followups: Arc::new(MockFollowups::new()),
            sink: Arc::new(RecordingSink::new()),
            descriptor: CompositeActionDescriptor::new(),
            outcome: None,
        }
    }

    fn outcome(&self) -> &Result<(), CompositeActionError> {
        self.outcome.as_ref().expect("Composite action has not run")
    }
}

fn parse_json(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|e| panic!("Invalid JSON {text:?}: {e}"))
}

fn names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

// ==========================================================================
// Background
// ==========================================================================

#[given("a promise test environment")]
async fn given_environment(_world: &mut PromiseWorld) {
    // Environment is initialized via World::new
}

// ==========================================================================
// Executor scripts
// ==========================================================================

#[given(expr = "executor {string} returns {string}")]
async fn given_executor_returns(world: &mut PromiseWorld, id: String, result: String) {
    world
        .effects
        .script(&id, Duration::ZERO, Scripted::Returns(parse_json(&result)))
        .await;
}

#[given(expr = "executor {string} returns {string} after {int} ms")]
async fn given_executor_returns_after(
    world: &mut PromiseWorld,
    id: String,
    result: String,
    millis: u64,
) {
    world
        .effects
        .script(
            &id,
            Duration::from_millis(millis),
            Scripted::Returns(parse_json(&result)),
        )
        .await;
}

#[given(expr = "executor {string} fails with {string}")]
async fn given_executor_fails(world: &mut PromiseWorld, id: String, reason: String) {
    world
        .effects
        .script(&id, Duration::ZERO, Scripted::Fails(reason))
        .await;
}

#[given(expr = "executor {string} fails with plugin data {string}")]
async fn given_executor_plugin_failure(world: &mut PromiseWorld, id: String, data: String) {
    let data = match parse_json(&data) {
        Value::Array(items) => items,
        other => vec![other],
    };
    world
        .effects
        .script(
            &id,
            Duration::ZERO,
            Scripted::Plugin {
                reason: "plugin call failed".to_string(),
                data,
            },
        )
        .await;
}

#[given(expr = "executor {string} is cancelled after {int} ms")]
async fn given_executor_cancelled(world: &mut PromiseWorld, id: String, millis: u64) {
    world
        .effects
        .script(&id, Duration::from_millis(millis), Scripted::Cancelled)
        .await;
}

// ==========================================================================
// Follow-up scripts
// ==========================================================================

#[given(expr = "action {string} returns {string}")]
async fn given_action_returns(world: &mut PromiseWorld, action: String, result: String) {
    world
        .followups
        .script(&action, Duration::ZERO, Scripted::Returns(parse_json(&result)))
        .await;
}

#[given(expr = "action {string} returns nothing")]
async fn given_action_returns_nothing(world: &mut PromiseWorld, action: String) {
    world
        .followups
        .script(&action, Duration::ZERO, Scripted::NoResult)
        .await;
}

#[given(expr = "action {string} fails with {string}")]
async fn given_action_fails(world: &mut PromiseWorld, action: String, reason: String) {
    world
        .followups
        .script(&action, Duration::ZERO, Scripted::Fails(reason))
        .await;
}

#[given(expr = "action {string} is cancelled")]
async fn given_action_cancelled(world: &mut PromiseWorld, action: String) {
    world
        .followups
        .script(&action, Duration::ZERO, Scripted::Cancelled)
        .await;
}

// ==========================================================================
// Descriptor
// ==========================================================================

#[given(expr = "executors {string}")]
async fn given_executors(world: &mut PromiseWorld, ids: String) {
    for id in names(&ids) {
        world.descriptor.executor.push(json!({ "id": id }).into());
    }
}

#[given(expr = "a then chain {string}")]
async fn given_then_chain(world: &mut PromiseWorld, links: String) {
    for link in names(&links) {
        world.descriptor.then.push(link.into());
    }
}

#[given(expr = "a catch action {string}")]
async fn given_catch(world: &mut PromiseWorld, action: String) {
    world.descriptor.catch = Some(action.as_str().into());
}

#[given(expr = "a finally action {string}")]
async fn given_finally(world: &mut PromiseWorld, action: String) {
    world.descriptor.finally = Some(action.as_str().into());
}

// ==========================================================================
// Run
// ==========================================================================

#[when("the composite action runs")]
async fn when_runs(world: &mut PromiseWorld) {
    let orchestrator = PromiseOrchestrator::new(world.effects.clone(), world.followups.clone())
        .with_sink(world.sink.clone());
    let outcome = orchestrator
        .run(
            world.descriptor.clone(),
            EventType::new("ON_CLICK"),
            TriggerMeta::default(),
        )
        .await;
    world.outcome = Some(outcome);
}

// ==========================================================================
// Assertions
// ==========================================================================

#[then("the run succeeds")]
async fn then_succeeds(world: &mut PromiseWorld) {
    assert!(
        world.outcome().is_ok(),
        "Expected success, got {:?}",
        world.outcome()
    );
    assert!(world.sink.reports().is_empty(), "Nothing should be reported");
}

#[then(expr = "the run fails uncaught with {string}")]
async fn then_fails_uncaught(world: &mut PromiseWorld, message: String) {
    match world.outcome() {
        Err(CompositeActionError::Uncaught(e)) => assert_eq!(e.message, message),
        other => panic!("Expected uncaught failure, got {other:?}"),
    }
    assert_eq!(world.sink.reports(), vec![message]);
}

#[then(expr = "the uncaught failure came from {string}")]
async fn then_uncaught_stage(world: &mut PromiseWorld, stage: String) {
    let err = world.outcome().as_ref().expect_err("Expected failure");
    let uncaught = err.uncaught().expect("Expected uncaught failure");
    assert_eq!(uncaught.stage.to_string(), stage);
}

#[then(expr = "action {string} ran {int} time(s)")]
async fn then_action_ran(world: &mut PromiseWorld, action: String, times: usize) {
    assert_eq!(
        world.followups.calls(&action).await,
        times,
        "Unexpected call count for {action}"
    );
}

#[then(expr = "action {string} received {string}")]
async fn then_action_received(world: &mut PromiseWorld, action: String, arguments: String) {
    let requests = world.followups.requests_for(&action).await;
    let request = requests
        .first()
        .unwrap_or_else(|| panic!("Action {action} never ran"));
    assert_eq!(request.response_data, parse_json(&arguments));
}
