//! # Use-Case Pipeline
//!
//! [`UseCasePipeline`] runs one invocation of a use case:
//!
//! 1. `on_start` hooks (populate the context, acquire guards)
//! 2. the [`DomainOperation`]
//! 3. `on_end` hooks (persist, commit)
//! 4. `on_finally` hooks, always, exactly once
//! 5. the leak check: any watched guard still active is an invariant violation
//!
//! The first error from steps 1–3 is the one returned. Errors from steps 4–5 never replace it;
//! they are attached to the [`PipelineFailure`] as suppressed errors and logged.
//!
//! ## Stages
//!
//! ```text
//! NotStarted → Starting ─┬─▶ DomainRunning ─┬─▶ Ending ─┬─▶ Finalizing → Done
//!                        └─▶ StartFailed ─┐ └─▶ DomainFailed ─┐ └─▶ EndFailed ─┐
//!                                         └──────────────────┴────────────────┴─▶ Finalizing
//! ```
//!
//! ## Ownership
//!
//! The context is moved into [`UseCasePipeline::execute`] and lent mutably to each phase in
//! turn. It comes back to the caller on success and is dropped on failure.

use crate::error::UseCaseError;
use crate::guard::Guard;
use crate::hook::{Hook, HookChain};
use crate::operation::DomainOperation;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Progress of a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NotStarted,
    Starting,
    StartFailed,
    DomainRunning,
    DomainFailed,
    Ending,
    EndFailed,
    Finalizing,
    Done,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::NotStarted => "not started",
            Stage::Starting => "starting",
            Stage::StartFailed => "start failed",
            Stage::DomainRunning => "domain running",
            Stage::DomainFailed => "domain failed",
            Stage::Ending => "ending",
            Stage::EndFailed => "end failed",
            Stage::Finalizing => "finalizing",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A failed invocation.
///
/// `error` is the primary cause: the first failure of the start, domain, or end phase, or,
/// when those all succeeded, the first cleanup failure. Everything that went wrong afterwards
/// is kept in `suppressed`.
#[derive(Debug, thiserror::Error)]
#[error("use case failed ({stage}): {error}")]
pub struct PipelineFailure {
    #[source]
    error: UseCaseError,
    stage: Stage,
    suppressed: Vec<UseCaseError>,
}

impl PipelineFailure {
    /// A failure with no suppressed errors, for callers that detect a defect after the pipeline
    /// itself succeeded.
    pub fn new(error: UseCaseError, stage: Stage) -> Self {
        Self {
            error,
            stage,
            suppressed: Vec::new(),
        }
    }

    pub fn error(&self) -> &UseCaseError {
        &self.error
    }

    /// The stage in which the primary error occurred.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Cleanup errors and invariant violations recorded after the primary error.
    pub fn suppressed(&self) -> &[UseCaseError] {
        &self.suppressed
    }

    pub fn into_error(self) -> UseCaseError {
        self.error
    }
}

/// Wraps a [`DomainOperation`] with a [`HookChain`] and guarantees cleanup.
pub struct UseCasePipeline<C: Send> {
    name: String,
    operation: Arc<dyn DomainOperation<C>>,
    hooks: HookChain<C>,
    guards: Vec<Arc<dyn Guard>>,
}

/// Builder for [`UseCasePipeline`]. Hooks run in the order they are added.
pub struct PipelineBuilder<C: Send> {
    name: String,
    operation: Arc<dyn DomainOperation<C>>,
    hooks: HookChain<C>,
    guards: Vec<Arc<dyn Guard>>,
}

impl<C: Send + 'static> PipelineBuilder<C> {
    pub fn hook(mut self, hook: impl Hook<C> + 'static) -> Self {
        self.hooks.register(hook);
        self
    }

    pub fn shared_hook(mut self, hook: Arc<dyn Hook<C>>) -> Self {
        self.hooks.register_shared(hook);
        self
    }

    /// Adds a guard to the post-cleanup leak check.
    pub fn watch<G: Guard + 'static>(mut self, guard: Arc<G>) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn build(self) -> UseCasePipeline<C> {
        UseCasePipeline {
            name: self.name,
            operation: self.operation,
            hooks: self.hooks,
            guards: self.guards,
        }
    }
}

impl<C: Send + 'static> UseCasePipeline<C> {
    pub fn builder(name: impl Into<String>, operation: impl DomainOperation<C> + 'static) -> PipelineBuilder<C> {
        PipelineBuilder {
            name: name.into(),
            operation: Arc::new(operation),
            hooks: HookChain::new(),
            guards: Vec::new(),
        }
    }

    /// Creates a pipeline from an already assembled chain, with no watched guards.
    pub fn new(name: impl Into<String>, operation: impl DomainOperation<C> + 'static, hooks: HookChain<C>) -> Self {
        Self {
            name: name.into(),
            operation: Arc::new(operation),
            hooks,
            guards: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hooks(&self) -> &HookChain<C> {
        &self.hooks
    }

    /// Runs one invocation.
    ///
    /// # Errors
    /// A [`PipelineFailure`] carrying the primary error and any suppressed cleanup errors.
    /// `on_finally` hooks have run by the time this returns, whatever the outcome.
    pub async fn execute(&self, ctx: C) -> Result<C, PipelineFailure> {
        let span = info_span!("use_case", name = %self.name);
        self.drive(ctx).instrument(span).await
    }

    async fn drive(&self, mut ctx: C) -> Result<C, PipelineFailure> {
        let mut stage = Stage::NotStarted;
        let outcome = self.run_body(&mut ctx, &mut stage).await;
        let failed_at = stage;

        advance(&mut stage, Stage::Finalizing);
        let mut cleanup = self.hooks.run_on_finally(&mut ctx).await;
        cleanup.extend(self.leaked_guards());
        advance(&mut stage, Stage::Done);

        match outcome {
            Err(error) => {
                if !cleanup.is_empty() {
                    warn!(
                        error = %error,
                        suppressed = cleanup.len(),
                        "Cleanup failed after primary error; keeping primary"
                    );
                }
                Err(PipelineFailure {
                    error,
                    stage: failed_at,
                    suppressed: cleanup,
                })
            }
            Ok(()) => {
                let mut cleanup = cleanup.into_iter();
                match cleanup.next() {
                    None => {
                        info!("Use case completed");
                        Ok(ctx)
                    }
                    Some(error) => {
                        warn!(error = %error, "Use case succeeded but cleanup failed");
                        Err(PipelineFailure {
                            error,
                            stage: Stage::Finalizing,
                            suppressed: cleanup.collect(),
                        })
                    }
                }
            }
        }
    }

    async fn run_body(&self, ctx: &mut C, stage: &mut Stage) -> Result<(), UseCaseError> {
        advance(stage, Stage::Starting);
        if let Err(e) = self.hooks.run_on_start(ctx).await {
            advance(stage, Stage::StartFailed);
            return Err(e);
        }

        advance(stage, Stage::DomainRunning);
        if let Err(e) = self.operation.run(ctx) {
            debug!(operation = self.operation.name(), error = %e, "Domain operation rejected");
            advance(stage, Stage::DomainFailed);
            return Err(e);
        }

        advance(stage, Stage::Ending);
        if let Err(e) = self.hooks.run_on_end(ctx).await {
            advance(stage, Stage::EndFailed);
            return Err(e);
        }
        Ok(())
    }

    fn leaked_guards(&self) -> Vec<UseCaseError> {
        self.guards
            .iter()
            .filter(|guard| guard.is_active())
            .map(|guard| {
                error!(guard = guard.kind(), "Guard still active after cleanup");
                UseCaseError::InvariantViolation(format!(
                    "{} guard still active after on_finally",
                    guard.kind()
                ))
            })
            .collect()
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    let from = *stage;
    debug!(%from, to = %next, "Stage");
    *stage = next;
}
