//! # Resource Guards
//!
//! A guard is a stateful handle over one external resource (a database transaction, a timing
//! span) with a begin/end lifecycle and an activity predicate.
//!
//! ## The Generic Guard
//!
//! [`ResourceGuard<R>`] owns the lifecycle state; [`GuardedResource`] is the backend seam that
//! performs the side effects. The two concrete instantiations live in [`transaction`] and
//! [`span`]:
//!
//! | Guard | Acquire | Finish | Abort |
//! |---|---|---|---|
//! | [`TransactionGuard`] | `begin` | `commit` | `rollback` |
//! | [`SpanGuard`] | `start(label)` | `stop` | `stop` |
//!
//! ## State Machine
//!
//! ```text
//!            acquire
//! Inactive ──────────▶ Active(handle)
//!    ▲                    │
//!    └────────────────────┘
//!      finish / abort
//! ```
//!
//! - `finish` on a backend failure leaves the guard **Active**, so a later abort still runs.
//! - `abort` always leaves the guard **Inactive**: the handle is spent even if the backend
//!   reported an error.
//! - Dropping an active guard aborts it, so a resource is released on every exit path,
//!   including a cancelled pipeline future.
//!
//! The backend handle is stored inside the guard itself. Two invocations running on the same
//! worker thread therefore never confuse each other's transactions.

pub mod span;
pub mod transaction;

pub use span::{SpanGuard, SpanId, Spans, TimeSpanManager};
pub use transaction::{TransactionGuard, TransactionId, TransactionManager, Transactions};

use crate::error::GuardError;
use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Backend contract for anything a [`ResourceGuard`] can hold.
pub trait GuardedResource: Send + Sync + 'static {
    /// Backend correlation handle (transaction id, span id).
    type Handle: Copy + Debug + Send + Sync + 'static;

    /// Short name used in logs and errors ("transaction", "span").
    fn kind(&self) -> &'static str;

    /// Acquires the resource.
    fn acquire(&self, label: &str) -> Result<Self::Handle, GuardError>;

    /// Finalizes the resource on the success path.
    fn finish(&self, handle: Self::Handle) -> Result<(), GuardError>;

    /// Releases the resource on the failure path.
    fn abort(&self, handle: Self::Handle) -> Result<(), GuardError>;
}

/// Lifecycle state of a guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState<H> {
    Inactive,
    Active(H),
}

/// Object-safe view of a guard, used by the pipeline to detect leaked resources.
pub trait Guard: Send + Sync {
    fn kind(&self) -> &'static str;
    fn is_active(&self) -> bool;
}

/// Generic guard over a [`GuardedResource`].
///
/// All methods take `&self` so that several hooks can share one guard through an `Arc`;
/// the state sits behind a mutex and backend calls happen while it is held, which makes
/// "check active, then release" atomic.
pub struct ResourceGuard<R: GuardedResource> {
    resource: R,
    state: Mutex<GuardState<R::Handle>>,
}

impl<R: GuardedResource> ResourceGuard<R> {
    /// Creates an inactive guard over `resource`.
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            state: Mutex::new(GuardState::Inactive),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GuardState<R::Handle>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The backend this guard drives.
    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Current state.
    pub fn state(&self) -> GuardState<R::Handle> {
        *self.lock()
    }

    /// Handle of the held resource, if any.
    pub fn handle(&self) -> Option<R::Handle> {
        match *self.lock() {
            GuardState::Active(handle) => Some(handle),
            GuardState::Inactive => None,
        }
    }

    /// Whether the guard currently holds a resource. Never touches the backend.
    pub fn is_active(&self) -> bool {
        matches!(*self.lock(), GuardState::Active(_))
    }

    /// `Inactive → Active`.
    ///
    /// # Errors
    /// [`GuardError::AlreadyActive`] if a resource is already held, or the backend's error.
    /// The guard stays inactive on failure.
    pub fn acquire(&self, label: &str) -> Result<R::Handle, GuardError> {
        let kind = self.resource.kind();
        let mut state = self.lock();
        if let GuardState::Active(held) = *state {
            warn!(kind, ?held, "acquire on active guard");
            return Err(GuardError::AlreadyActive { kind });
        }
        let handle = self.resource.acquire(label)?;
        *state = GuardState::Active(handle);
        debug!(kind, ?handle, label, "Guard acquired");
        Ok(handle)
    }

    /// `Active → Inactive` on the success path.
    ///
    /// # Errors
    /// [`GuardError::NotActive`] when nothing is held. A backend failure is returned and the
    /// guard remains active.
    pub fn finish(&self) -> Result<(), GuardError> {
        let kind = self.resource.kind();
        let mut state = self.lock();
        let GuardState::Active(handle) = *state else {
            return Err(GuardError::NotActive { kind });
        };
        self.resource.finish(handle)?;
        *state = GuardState::Inactive;
        debug!(kind, ?handle, "Guard finished");
        Ok(())
    }

    /// `Active → Inactive` on the failure path.
    ///
    /// # Errors
    /// [`GuardError::NotActive`] when nothing is held, or the backend's error (the guard is
    /// inactive afterwards either way).
    pub fn abort(&self) -> Result<(), GuardError> {
        let kind = self.resource.kind();
        let mut state = self.lock();
        let GuardState::Active(handle) = *state else {
            return Err(GuardError::NotActive { kind });
        };
        *state = GuardState::Inactive;
        debug!(kind, ?handle, "Guard aborted");
        self.resource.abort(handle)
    }

    /// Aborts the resource if one is held. Returns whether an abort was sent.
    pub fn release_if_active(&self) -> Result<bool, GuardError> {
        let mut state = self.lock();
        let GuardState::Active(handle) = *state else {
            return Ok(false);
        };
        *state = GuardState::Inactive;
        debug!(kind = self.resource.kind(), ?handle, "Guard released");
        self.resource.abort(handle).map(|()| true)
    }
}

impl<R: GuardedResource> Guard for ResourceGuard<R> {
    fn kind(&self) -> &'static str {
        self.resource.kind()
    }

    fn is_active(&self) -> bool {
        ResourceGuard::is_active(self)
    }
}

impl<R: GuardedResource> Debug for ResourceGuard<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceGuard")
            .field("kind", &self.resource.kind())
            .field("state", &self.state())
            .finish()
    }
}

impl<R: GuardedResource> Drop for ResourceGuard<R> {
    fn drop(&mut self) {
        let kind = self.resource.kind();
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let GuardState::Active(handle) = *state {
            *state = GuardState::Inactive;
            warn!(kind, ?handle, "Guard dropped while active, aborting");
            if let Err(e) = self.resource.abort(handle) {
                warn!(kind, ?handle, error = %e, "Abort on drop failed");
            }
        }
    }
}
