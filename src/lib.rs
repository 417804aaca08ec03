//! Promise action orchestration.
//!
//! Runs composite actions: a set of executors launched concurrently whose
//! joined result feeds a sequential "then" chain, with a "catch" action for
//! failures and a "finally" action that runs on every exit path.

pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod orchestration;
pub mod utils;

pub use context::{EventType, ExecutionContext, FollowupRequest, TriggerMeta, TriggerSource};
pub use descriptor::{ActionRef, ActionTrigger, CompositeActionDescriptor};
pub use error::{CompositeActionError, FailureStage, TriggerError, UncaughtPromiseError};
pub use orchestration::promise::{execute_promise, PromiseOrchestrator};
pub use orchestration::trigger::{EffectInvoker, FailureSink, FollowupInvoker, TracingFailureSink};
