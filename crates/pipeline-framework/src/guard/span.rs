//! Observability span guard: `start(label)` / `stop` over a [`TimeSpanManager`], with
//! free-text event annotations while the span is open.

use super::{GuardedResource, ResourceGuard};
use crate::error::GuardError;
use std::fmt::Display;
use std::sync::Arc;

/// Backend-assigned span identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(pub u64);

impl Display for SpanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "span_{}", self.0)
    }
}

/// A timing/telemetry backend.
pub trait TimeSpanManager: Send + Sync {
    fn start_span(&self, label: &str) -> Result<SpanId, GuardError>;
    fn add_event(&self, span: SpanId, event: &str) -> Result<(), GuardError>;
    fn stop_span(&self, span: SpanId) -> Result<(), GuardError>;
}

/// [`GuardedResource`] adapter for a shared [`TimeSpanManager`].
#[derive(Clone)]
pub struct Spans(Arc<dyn TimeSpanManager>);

impl Spans {
    pub fn new(manager: Arc<dyn TimeSpanManager>) -> Self {
        Self(manager)
    }
}

impl GuardedResource for Spans {
    type Handle = SpanId;

    fn kind(&self) -> &'static str {
        "span"
    }

    fn acquire(&self, label: &str) -> Result<SpanId, GuardError> {
        self.0.start_span(label)
    }

    // A span has no separate failure path: both ends close it.
    fn finish(&self, handle: SpanId) -> Result<(), GuardError> {
        self.0.stop_span(handle)
    }

    fn abort(&self, handle: SpanId) -> Result<(), GuardError> {
        self.0.stop_span(handle)
    }
}

/// Guard over one time span of one invocation.
pub type SpanGuard = ResourceGuard<Spans>;

impl ResourceGuard<Spans> {
    /// Creates an inactive span guard.
    pub fn span(manager: Arc<dyn TimeSpanManager>) -> Self {
        Self::new(Spans::new(manager))
    }

    pub fn start(&self, label: &str) -> Result<SpanId, GuardError> {
        self.acquire(label)
    }

    pub fn stop(&self) -> Result<(), GuardError> {
        self.finish()
    }

    /// Annotates the open span.
    ///
    /// # Errors
    /// [`GuardError::NotActive`] if no span is open.
    pub fn add_event(&self, event: &str) -> Result<(), GuardError> {
        let span = self.handle().ok_or(GuardError::NotActive { kind: "span" })?;
        self.resource().0.add_event(span, event)
    }
}
