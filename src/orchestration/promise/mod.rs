//! Promise action orchestration.
//!
//! `PromiseOrchestrator::run` executes a composite action the way a
//! `Promise.all(executors).then(..).catch(..).finally(..)` chain would:
//!
//! 1. Join: run all executors concurrently, collect results in order
//! 2. Chain: thread the joined result through the "then" links in sequence
//! 3. Classify: route a failure from either stage to swallow, catch, or
//!    uncaught propagation
//! 4. Finally: run the finally action on every exit path, then propagate
//!    any pending failure
//!
//! - `join`: parallel fan-out and fan-in over executors
//! - `chain`: sequential then-link walker
//! - `classify`: failure routing

pub mod chain;
pub mod classify;
pub mod join;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{Config, OrchestratorConfig};
use crate::context::{EventType, ExecutionContext, TriggerMeta};
use crate::descriptor::{
    placeholder_arguments, ActionRef, ActionTrigger, CompositeActionDescriptor,
};
use crate::error::{
    CompositeActionError, FailureStage, Result, TriggerError, UncaughtPromiseError,
};
use crate::orchestration::trigger::{
    EffectInvoker, FailureSink, FollowupInvoker, TracingFailureSink,
};

use self::chain::{initial_arguments, walk_chain};
use self::classify::ClassifiedFailure;
use self::join::join_executors;

/// How the join/chain/catch part of a run settled, before finally.
#[derive(Debug)]
enum Settled {
    /// Executors and every then link succeeded.
    Completed,
    /// A cancellation was swallowed.
    Swallowed,
    /// The catch action handled the failure.
    Caught,
    /// No catch action; propagates after finally.
    Uncaught(UncaughtPromiseError),
    /// The catch action itself failed; propagates after finally.
    CatchFailed(TriggerError),
}

impl Settled {
    fn into_pending(self, context: &ExecutionContext) -> Option<CompositeActionError> {
        match self {
            Settled::Completed | Settled::Swallowed | Settled::Caught => None,
            Settled::Uncaught(e) => Some(CompositeActionError::Uncaught(e)),
            Settled::CatchFailed(source) => Some(CompositeActionError::Catch {
                context: context.clone(),
                source,
            }),
        }
    }
}

/// Runs composite actions against a pair of invokers.
///
/// Holds no per-run state; one instance can serve any number of
/// concurrent runs.
#[derive(Clone)]
pub struct PromiseOrchestrator {
    effects: Arc<dyn EffectInvoker>,
    followups: Arc<dyn FollowupInvoker>,
    sink: Arc<dyn FailureSink>,
    config: OrchestratorConfig,
}

impl PromiseOrchestrator {
    pub fn new(effects: Arc<dyn EffectInvoker>, followups: Arc<dyn FollowupInvoker>) -> Self {
        Self {
            effects,
            followups,
            sink: Arc::new(TracingFailureSink),
            config: OrchestratorConfig::default(),
        }
    }

    /// Build an orchestrator with settings from a loaded `Config`.
    ///
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use promise_action::config::Config;
    /// # use promise_action::{EffectInvoker, FollowupInvoker, PromiseOrchestrator};
    /// # fn build(effects: Arc<dyn EffectInvoker>, followups: Arc<dyn FollowupInvoker>)
    /// #     -> Result<PromiseOrchestrator, Box<dyn std::error::Error>> {
    /// let config = Config::load(None)?;
    /// let orchestrator = PromiseOrchestrator::from_config(effects, followups, &config);
    /// # Ok(orchestrator)
    /// # }
    /// ```
    pub fn from_config(
        effects: Arc<dyn EffectInvoker>,
        followups: Arc<dyn FollowupInvoker>,
        config: &Config,
    ) -> Self {
        Self::new(effects, followups).with_config(config.orchestrator.clone())
    }

    pub fn with_sink(mut self, sink: Arc<dyn FailureSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Run a composite action triggered by `event_type`.
    pub async fn run(
        &self,
        descriptor: CompositeActionDescriptor,
        event_type: EventType,
        meta: TriggerMeta,
    ) -> Result<()> {
        let context = ExecutionContext { event_type, meta };
        self.run_in(descriptor, context).await
    }

    /// Run a composite action in an already-built context.
    #[tracing::instrument(
        name = "promise.run",
        skip_all,
        fields(
            event_type = %context.event_type,
            executors = descriptor.executor.len(),
            then_links = descriptor.then.len(),
        )
    )]
    pub async fn run_in(
        &self,
        descriptor: CompositeActionDescriptor,
        context: ExecutionContext,
    ) -> Result<()> {
        let CompositeActionDescriptor {
            executor,
            then,
            catch,
            finally,
        } = descriptor;

        let settled = match self.attempt(executor, &then, &context).await {
            Ok(()) => Settled::Completed,
            Err((stage, error)) => {
                self.settle_failure(stage, error, catch.as_ref(), &context)
                    .await
            }
        };
        debug!(outcome = ?settled, "Promise settled");

        let pending = settled.into_pending(&context);

        if let Some(action) = finally.as_ref() {
            debug!(%action, "Running finally action");
            let request = context.followup(action, placeholder_arguments());
            match self.followups.invoke(request).await {
                Ok(_) => {}
                Err(TriggerError::Cancelled) => {
                    info!(%action, "Finally action cancelled by user");
                }
                Err(source) => {
                    warn!(error = %source, "Finally action failed");
                    return Err(CompositeActionError::Finally {
                        context,
                        source,
                        pending: pending.map(Box::new),
                    });
                }
            }
        }

        match pending {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Join the executors, then walk the chain.
    async fn attempt(
        &self,
        executors: Vec<ActionTrigger>,
        then: &[ActionRef],
        context: &ExecutionContext,
    ) -> std::result::Result<(), (FailureStage, TriggerError)> {
        let results = join_executors(Arc::clone(&self.effects), executors, context)
            .await
            .map_err(|f| (FailureStage::Executor { index: f.index }, f.error))?;

        if then.is_empty() {
            return Ok(());
        }

        let arguments = initial_arguments(results);
        walk_chain(
            self.followups.as_ref(),
            then,
            arguments,
            context,
            self.config.trace_arguments,
        )
        .await
        .map_err(|f| (FailureStage::Then { index: f.index }, f.error))?;

        Ok(())
    }

    /// Route a failure from the join or the chain.
    async fn settle_failure(
        &self,
        stage: FailureStage,
        error: TriggerError,
        catch: Option<&ActionRef>,
        context: &ExecutionContext,
    ) -> Settled {
        let class = ClassifiedFailure::of(&error);

        let arguments = match class.catch_arguments() {
            None => {
                info!(%stage, "Action cancelled by user, skipping catch");
                return Settled::Swallowed;
            }
            Some(arguments) => arguments,
        };

        let Some(action) = catch else {
            let uncaught = UncaughtPromiseError::new(context.clone(), stage, error);
            if self.config.report_uncaught {
                self.sink.report(&uncaught);
            } else {
                debug!(%stage, error = %uncaught.cause, "Uncaught promise failure");
            }
            return Settled::Uncaught(uncaught);
        };

        warn!(%stage, error = %error, %action, "Promise failed, running catch action");
        if self.config.trace_arguments {
            debug!(arguments = %arguments, "Catch arguments");
        }

        let request = context.followup(action, arguments);
        match self.followups.invoke(request).await {
            Ok(_) => Settled::Caught,
            Err(TriggerError::Cancelled) => {
                info!(%action, "Catch action cancelled by user");
                Settled::Swallowed
            }
            Err(source) => {
                warn!(error = %source, "Catch action failed");
                Settled::CatchFailed(source)
            }
        }
    }
}

/// Run a composite action with default configuration and the tracing sink.
pub async fn execute_promise(
    effects: Arc<dyn EffectInvoker>,
    followups: Arc<dyn FollowupInvoker>,
    descriptor: CompositeActionDescriptor,
    event_type: EventType,
    meta: TriggerMeta,
) -> Result<()> {
    PromiseOrchestrator::new(effects, followups)
        .run(descriptor, event_type, meta)
        .await
}
