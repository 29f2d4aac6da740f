//! # Hooks & the Hook Chain
//!
//! A [`Hook`] observes the lifecycle of one use-case invocation. Every phase method is a
//! **provided method** returning `Ok(())`, so a hook implements only the phases it cares
//! about: a persistence hook overrides `on_end`, a span hook overrides `on_start` and
//! `on_finally`.
//!
//! ## Ordering
//!
//! [`HookChain`] dispatches every phase in registration order. The chain is not commutative:
//! a hook that persists the result relies on an earlier hook having begun the transaction.
//!
//! ## Failure Semantics
//!
//! | Phase | On error |
//! |---|---|
//! | `on_start` | stop the phase, propagate |
//! | `on_end` | stop the phase, propagate |
//! | `on_finally` | record, keep running the remaining hooks |

use crate::error::UseCaseError;
use async_trait::async_trait;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lifecycle phase a hook reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Start,
    End,
    Finally,
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Start => "on_start",
            Phase::End => "on_end",
            Phase::Finally => "on_finally",
        };
        f.write_str(name)
    }
}

/// Observer of a use-case invocation over a context of type `C`.
///
/// The context is lent mutably for the duration of each call and never retained, so a hook
/// keeps no per-invocation data of its own beyond the guards it was built with.
#[async_trait]
pub trait Hook<C: Send>: Send + Sync {
    /// Name used in logs. Defaults to the type name without its module path.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Runs before the domain operation. May populate the context or acquire guards.
    async fn on_start(&self, _ctx: &mut C) -> Result<(), UseCaseError> {
        Ok(())
    }

    /// Runs after a successful domain operation. May persist the result or commit guards.
    async fn on_end(&self, _ctx: &mut C) -> Result<(), UseCaseError> {
        Ok(())
    }

    /// Runs exactly once per invocation, on every exit path. Releases whatever is still held.
    async fn on_finally(&self, _ctx: &mut C) -> Result<(), UseCaseError> {
        Ok(())
    }
}

/// Ordered collection of hooks, fixed once the pipeline is built.
pub struct HookChain<C: Send> {
    hooks: Vec<Arc<dyn Hook<C>>>,
}

impl<C: Send + 'static> HookChain<C> {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Appends a hook; it runs after every hook registered before it.
    pub fn register(&mut self, hook: impl Hook<C> + 'static) -> &mut Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Appends a hook that is also held elsewhere.
    pub fn register_shared(&mut self, hook: Arc<dyn Hook<C>>) -> &mut Self {
        self.hooks.push(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Hook names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.hooks.iter().map(|hook| hook.name()).collect()
    }

    /// Runs every `on_start` in order, stopping at the first error.
    pub async fn run_on_start(&self, ctx: &mut C) -> Result<(), UseCaseError> {
        self.run_fail_fast(Phase::Start, ctx).await
    }

    /// Runs every `on_end` in order, stopping at the first error.
    pub async fn run_on_end(&self, ctx: &mut C) -> Result<(), UseCaseError> {
        self.run_fail_fast(Phase::End, ctx).await
    }

    /// Runs every `on_finally` in order. A failing hook never prevents the ones after it
    /// from running; all errors are returned in the order they occurred.
    pub async fn run_on_finally(&self, ctx: &mut C) -> Vec<UseCaseError> {
        let mut errors = Vec::new();
        for hook in &self.hooks {
            debug!(hook = hook.name(), phase = %Phase::Finally, "Running hook");
            if let Err(e) = hook.on_finally(ctx).await {
                warn!(hook = hook.name(), phase = %Phase::Finally, error = %e, "Cleanup hook failed");
                errors.push(e);
            }
        }
        errors
    }

    async fn run_fail_fast(&self, phase: Phase, ctx: &mut C) -> Result<(), UseCaseError> {
        for hook in &self.hooks {
            debug!(hook = hook.name(), %phase, "Running hook");
            let result = match phase {
                Phase::Start => hook.on_start(ctx).await,
                Phase::End => hook.on_end(ctx).await,
                Phase::Finally => hook.on_finally(ctx).await,
            };
            if let Err(e) = result {
                warn!(hook = hook.name(), %phase, error = %e, "Hook failed");
                return Err(e);
            }
        }
        Ok(())
    }
}

impl<C: Send + 'static> Default for HookChain<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{CallLog, ScriptedHook};

    struct EndOnly;

    #[async_trait]
    impl Hook<Vec<&'static str>> for EndOnly {
        async fn on_end(&self, ctx: &mut Vec<&'static str>) -> Result<(), UseCaseError> {
            ctx.push("end-only");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_default_phases_are_noops() {
        let mut chain = HookChain::new();
        chain.register(EndOnly);
        let mut ctx = Vec::new();

        chain.run_on_start(&mut ctx).await.unwrap();
        assert!(chain.run_on_finally(&mut ctx).await.is_empty());
        assert!(ctx.is_empty());

        chain.run_on_end(&mut ctx).await.unwrap();
        assert_eq!(ctx, vec!["end-only"]);
        assert_eq!(chain.names(), vec!["EndOnly"]);
    }

    #[tokio::test]
    async fn test_phases_run_in_registration_order() {
        let calls = CallLog::new();
        let mut chain = HookChain::<()>::new();
        chain
            .register(ScriptedHook::new("a", calls.clone()))
            .register(ScriptedHook::new("b", calls.clone()));

        chain.run_on_start(&mut ()).await.unwrap();
        chain.run_on_end(&mut ()).await.unwrap();
        assert!(chain.run_on_finally(&mut ()).await.is_empty());

        assert_eq!(
            calls.calls(),
            vec![
                "a:on_start",
                "b:on_start",
                "a:on_end",
                "b:on_end",
                "a:on_finally",
                "b:on_finally",
            ]
        );
    }

    #[tokio::test]
    async fn test_start_failure_skips_later_hooks() {
        let calls = CallLog::new();
        let mut chain = HookChain::<()>::new();
        chain
            .register(ScriptedHook::new("a", calls.clone()).fail_on(Phase::Start))
            .register(ScriptedHook::new("b", calls.clone()));

        assert!(chain.run_on_start(&mut ()).await.is_err());
        assert_eq!(calls.calls(), vec!["a:on_start"]);
    }

    #[tokio::test]
    async fn test_finally_failure_does_not_skip_later_hooks() {
        let calls = CallLog::new();
        let mut chain = HookChain::<()>::new();
        chain
            .register(ScriptedHook::new("a", calls.clone()).fail_on(Phase::Finally))
            .register(ScriptedHook::new("b", calls.clone()).fail_on(Phase::Finally))
            .register(ScriptedHook::new("c", calls.clone()));

        let errors = chain.run_on_finally(&mut ()).await;
        assert_eq!(errors.len(), 2);
        assert_eq!(calls.calls(), vec!["a:on_finally", "b:on_finally", "c:on_finally"]);
    }
}
