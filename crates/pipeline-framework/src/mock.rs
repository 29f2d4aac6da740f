//! # Recording Backends & Scripted Hooks
//!
//! In-memory stand-ins for the external collaborators of a pipeline. They let a test assert the
//! exact sequence of backend calls (`begin`, `commit`, `stop_span`, ...) and inject failures at
//! any of them without a database or a telemetry agent.
//!
//! | Type | Replaces | Failure injection |
//! |------|----------|-------------------|
//! | [`RecordingTransactionManager`] | a database transaction API | `fail_on(BackendOp::Commit)` |
//! | [`RecordingSpanManager`] | a tracing/APM agent | `fail_on(BackendOp::StopSpan)` |
//! | [`ScriptedHook`] | any [`Hook`] | `fail_on(Phase::Finally)` |
//!
//! Both recording managers push into a shared [`EventLog`], so the interleaving of transaction
//! and span calls is visible in one place:
//!
//! ```rust
//! use pipeline_framework::mock::{BackendEvent, EventLog, RecordingTransactionManager};
//! use pipeline_framework::TransactionGuard;
//! use std::sync::Arc;
//!
//! let log = EventLog::new();
//! let guard = TransactionGuard::transaction(Arc::new(RecordingTransactionManager::new(log.clone())));
//!
//! let id = guard.begin().unwrap();
//! guard.rollback().unwrap();
//! assert_eq!(log.events(), vec![BackendEvent::Begin(id), BackendEvent::Rollback(id)]);
//! ```
//!
//! A failed call is **not** recorded: the log only shows what the backend accepted.

use crate::error::{GuardError, UseCaseError};
use crate::guard::{SpanId, TimeSpanManager, TransactionId, TransactionManager};
use crate::hook::{Hook, Phase};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One accepted backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    Begin(TransactionId),
    Commit(TransactionId),
    Rollback(TransactionId),
    SpanStart(SpanId, String),
    SpanEvent(SpanId, String),
    SpanStop(SpanId),
}

/// Backend calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    Begin,
    Commit,
    Rollback,
    StartSpan,
    AddEvent,
    StopSpan,
}

impl BackendOp {
    fn name(self) -> &'static str {
        match self {
            BackendOp::Begin => "begin",
            BackendOp::Commit => "commit",
            BackendOp::Rollback => "rollback",
            BackendOp::StartSpan => "start",
            BackendOp::AddEvent => "add_event",
            BackendOp::StopSpan => "stop",
        }
    }
}

/// Shared, append-only record of backend calls.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<BackendEvent>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: BackendEvent) {
        lock(&self.0).push(event);
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<BackendEvent> {
        lock(&self.0).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.0).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.0).is_empty()
    }

    /// Number of recorded events matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&BackendEvent) -> bool) -> usize {
        lock(&self.0).iter().filter(|event| predicate(event)).count()
    }
}

#[derive(Debug, Default)]
struct Failures(Mutex<HashSet<BackendOp>>);

impl Failures {
    fn set(&self, op: BackendOp) {
        lock(&self.0).insert(op);
    }

    fn clear(&self, op: BackendOp) {
        lock(&self.0).remove(&op);
    }

    fn check(&self, kind: &'static str, op: BackendOp) -> Result<(), GuardError> {
        if lock(&self.0).contains(&op) {
            return Err(GuardError::backend(kind, op.name(), "injected failure"));
        }
        Ok(())
    }
}

/// [`TransactionManager`] that records every accepted call.
#[derive(Debug)]
pub struct RecordingTransactionManager {
    log: EventLog,
    next_id: AtomicU64,
    failures: Failures,
}

impl RecordingTransactionManager {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            next_id: AtomicU64::new(1),
            failures: Failures::default(),
        }
    }

    /// Makes every subsequent `op` call fail until [`recover`](Self::recover).
    pub fn fail_on(&self, op: BackendOp) {
        self.failures.set(op);
    }

    pub fn recover(&self, op: BackendOp) {
        self.failures.clear(op);
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }
}

impl TransactionManager for RecordingTransactionManager {
    fn begin(&self) -> Result<TransactionId, GuardError> {
        self.failures.check("transaction", BackendOp::Begin)?;
        let id = TransactionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.log.push(BackendEvent::Begin(id));
        Ok(id)
    }

    fn commit(&self, id: TransactionId) -> Result<(), GuardError> {
        self.failures.check("transaction", BackendOp::Commit)?;
        self.log.push(BackendEvent::Commit(id));
        Ok(())
    }

    fn rollback(&self, id: TransactionId) -> Result<(), GuardError> {
        self.failures.check("transaction", BackendOp::Rollback)?;
        self.log.push(BackendEvent::Rollback(id));
        Ok(())
    }
}

/// [`TimeSpanManager`] that records every accepted call.
#[derive(Debug)]
pub struct RecordingSpanManager {
    log: EventLog,
    next_id: AtomicU64,
    failures: Failures,
}

impl RecordingSpanManager {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            next_id: AtomicU64::new(1),
            failures: Failures::default(),
        }
    }

    pub fn fail_on(&self, op: BackendOp) {
        self.failures.set(op);
    }

    pub fn recover(&self, op: BackendOp) {
        self.failures.clear(op);
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }
}

impl TimeSpanManager for RecordingSpanManager {
    fn start_span(&self, label: &str) -> Result<SpanId, GuardError> {
        self.failures.check("span", BackendOp::StartSpan)?;
        let id = SpanId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.log.push(BackendEvent::SpanStart(id, label.to_string()));
        Ok(id)
    }

    fn add_event(&self, span: SpanId, event: &str) -> Result<(), GuardError> {
        self.failures.check("span", BackendOp::AddEvent)?;
        self.log.push(BackendEvent::SpanEvent(span, event.to_string()));
        Ok(())
    }

    fn stop_span(&self, span: SpanId) -> Result<(), GuardError> {
        self.failures.check("span", BackendOp::StopSpan)?;
        self.log.push(BackendEvent::SpanStop(span));
        Ok(())
    }
}

/// Shared record of hook invocations, formatted as `"{hook}:{phase}"`.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        lock(&self.0).push(entry.into());
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.0).clone()
    }
}

/// Error returned by a [`ScriptedHook`] in a phase it was told to fail.
#[derive(Debug, thiserror::Error)]
#[error("{hook} failed in {phase}")]
pub struct ScriptedFailure {
    pub hook: String,
    pub phase: Phase,
}

/// A hook that records each phase call and fails where scripted.
///
/// Works over any context type, so chain and pipeline behavior can be tested without a domain.
#[derive(Debug)]
pub struct ScriptedHook {
    name: String,
    calls: CallLog,
    failing: HashSet<Phase>,
}

impl ScriptedHook {
    pub fn new(name: impl Into<String>, calls: CallLog) -> Self {
        Self {
            name: name.into(),
            calls,
            failing: HashSet::new(),
        }
    }

    /// Makes `phase` return a [`UseCaseError::Persistence`] wrapping a [`ScriptedFailure`].
    pub fn fail_on(mut self, phase: Phase) -> Self {
        self.failing.insert(phase);
        self
    }

    fn visit(&self, phase: Phase) -> Result<(), UseCaseError> {
        self.calls.record(format!("{}:{}", self.name, phase));
        if self.failing.contains(&phase) {
            return Err(UseCaseError::persistence(ScriptedFailure {
                hook: self.name.clone(),
                phase,
            }));
        }
        Ok(())
    }
}

#[async_trait]
impl<C: Send> Hook<C> for ScriptedHook {
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_start(&self, _ctx: &mut C) -> Result<(), UseCaseError> {
        self.visit(Phase::Start)
    }

    async fn on_end(&self, _ctx: &mut C) -> Result<(), UseCaseError> {
        self.visit(Phase::End)
    }

    async fn on_finally(&self, _ctx: &mut C) -> Result<(), UseCaseError> {
        self.visit(Phase::Finally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_call_is_not_recorded() {
        let log = EventLog::new();
        let manager = RecordingTransactionManager::new(log.clone());
        manager.fail_on(BackendOp::Commit);

        let id = manager.begin().unwrap();
        let err = manager.commit(id).unwrap_err();
        assert_eq!(err, GuardError::backend("transaction", "commit", "injected failure"));
        assert_eq!(log.events(), vec![BackendEvent::Begin(id)]);

        manager.recover(BackendOp::Commit);
        manager.commit(id).unwrap();
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_scripted_hook_reports_its_phase() {
        let calls = CallLog::new();
        let hook = ScriptedHook::new("audit", calls.clone()).fail_on(Phase::End);

        Hook::<()>::on_start(&hook, &mut ()).await.unwrap();
        let err = Hook::<()>::on_end(&hook, &mut ()).await.unwrap_err();

        let source = err.downcast_source::<ScriptedFailure>().unwrap();
        assert_eq!(source.phase, Phase::End);
        assert_eq!(calls.calls(), vec!["audit:on_start", "audit:on_end"]);
    }
}
