//! Transaction guard: `begin` / `commit` / `rollback` over a [`TransactionManager`].

use super::{GuardedResource, ResourceGuard};
use crate::error::GuardError;
use std::fmt::Display;
use std::sync::Arc;

/// Backend-assigned transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(pub u64);

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx_{}", self.0)
    }
}

/// A unit-of-work backend. Implementations must tolerate concurrent callers; correlation
/// between `begin` and `commit`/`rollback` travels through the returned [`TransactionId`].
pub trait TransactionManager: Send + Sync {
    fn begin(&self) -> Result<TransactionId, GuardError>;
    fn commit(&self, id: TransactionId) -> Result<(), GuardError>;
    fn rollback(&self, id: TransactionId) -> Result<(), GuardError>;
}

/// [`GuardedResource`] adapter for a shared [`TransactionManager`].
#[derive(Clone)]
pub struct Transactions(Arc<dyn TransactionManager>);

impl Transactions {
    pub fn new(manager: Arc<dyn TransactionManager>) -> Self {
        Self(manager)
    }
}

impl GuardedResource for Transactions {
    type Handle = TransactionId;

    fn kind(&self) -> &'static str {
        "transaction"
    }

    fn acquire(&self, _label: &str) -> Result<TransactionId, GuardError> {
        self.0.begin()
    }

    fn finish(&self, handle: TransactionId) -> Result<(), GuardError> {
        self.0.commit(handle)
    }

    fn abort(&self, handle: TransactionId) -> Result<(), GuardError> {
        self.0.rollback(handle)
    }
}

/// Guard over one transaction of one invocation.
pub type TransactionGuard = ResourceGuard<Transactions>;

impl ResourceGuard<Transactions> {
    /// Creates an inactive transaction guard.
    pub fn transaction(manager: Arc<dyn TransactionManager>) -> Self {
        Self::new(Transactions::new(manager))
    }

    pub fn begin(&self) -> Result<TransactionId, GuardError> {
        self.acquire("transaction")
    }

    pub fn commit(&self) -> Result<(), GuardError> {
        self.finish()
    }

    pub fn rollback(&self) -> Result<(), GuardError> {
        self.abort()
    }
}
