use pipeline_framework::{GuardError, SpanId, TimeSpanManager};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{info, info_span, Span};

struct OpenSpan {
    span: Span,
    started: Instant,
}

/// A [`TimeSpanManager`] that records time spans through `tracing`.
///
/// Each time span becomes an `info`-level `time_span` span whose parent is whatever span is
/// current when it starts, so nested time spans nest in the log output as well. Events are logged
/// inside the span; stopping it logs the elapsed time.
#[derive(Default)]
pub struct TracingSpanManager {
    next_id: AtomicU64,
    open: Mutex<HashMap<SpanId, OpenSpan>>,
}

impl TracingSpanManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn open(&self) -> MutexGuard<'_, HashMap<SpanId, OpenSpan>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open_count(&self) -> usize {
        self.open().len()
    }
}

fn unknown(operation: &'static str, id: SpanId) -> GuardError {
    GuardError::backend("span", operation, format!("{id} is not open"))
}

impl TimeSpanManager for TracingSpanManager {
    fn start_span(&self, label: &str) -> Result<SpanId, GuardError> {
        let id = SpanId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let span = info_span!("time_span", %id, label);
        span.in_scope(|| info!("Span started"));
        self.open().insert(
            id,
            OpenSpan {
                span,
                started: Instant::now(),
            },
        );
        Ok(id)
    }

    fn add_event(&self, id: SpanId, event: &str) -> Result<(), GuardError> {
        let open = self.open();
        let entry = open.get(&id).ok_or_else(|| unknown("add_event", id))?;
        entry.span.in_scope(|| info!(event, "Span event"));
        Ok(())
    }

    fn stop_span(&self, id: SpanId) -> Result<(), GuardError> {
        let entry = self.open().remove(&id).ok_or_else(|| unknown("stop", id))?;
        let elapsed_ms = entry.started.elapsed().as_millis() as u64;
        entry.span.in_scope(|| info!(elapsed_ms, "Span stopped"));
        Ok(())
    }
}
