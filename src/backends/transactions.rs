use pipeline_framework::{GuardError, TransactionId, TransactionManager};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Keeps the set of open transactions and logs each begin, commit and rollback.
///
/// Ending a transaction that is not open is a backend error, which catches double commits and
/// commits of transactions begun elsewhere.
#[derive(Debug)]
pub struct LoggingTransactionManager {
    next_id: AtomicU64,
    open: Mutex<HashSet<TransactionId>>,
    committed: AtomicU64,
    rolled_back: AtomicU64,
}

impl LoggingTransactionManager {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            open: Mutex::new(HashSet::new()),
            committed: AtomicU64::new(0),
            rolled_back: AtomicU64::new(0),
        }
    }

    fn open(&self) -> MutexGuard<'_, HashSet<TransactionId>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of transactions begun but not yet ended.
    pub fn open_count(&self) -> usize {
        self.open().len()
    }

    pub fn committed_count(&self) -> u64 {
        self.committed.load(Ordering::SeqCst)
    }

    pub fn rolled_back_count(&self) -> u64 {
        self.rolled_back.load(Ordering::SeqCst)
    }

    fn end(&self, id: TransactionId, operation: &'static str) -> Result<(), GuardError> {
        if !self.open().remove(&id) {
            warn!(%id, operation, "Unknown transaction");
            return Err(GuardError::backend("transaction", operation, format!("{id} is not open")));
        }
        Ok(())
    }
}

impl Default for LoggingTransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionManager for LoggingTransactionManager {
    fn begin(&self) -> Result<TransactionId, GuardError> {
        let id = TransactionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.open().insert(id);
        debug!(%id, "Transaction begun");
        Ok(id)
    }

    fn commit(&self, id: TransactionId) -> Result<(), GuardError> {
        self.end(id, "commit")?;
        self.committed.fetch_add(1, Ordering::SeqCst);
        info!(%id, "Transaction committed");
        Ok(())
    }

    fn rollback(&self, id: TransactionId) -> Result<(), GuardError> {
        self.end(id, "rollback")?;
        self.rolled_back.fetch_add(1, Ordering::SeqCst);
        info!(%id, "Transaction rolled back");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_closes_transaction() {
        let manager = LoggingTransactionManager::new();
        let id = manager.begin().unwrap();
        assert_eq!(manager.open_count(), 1);

        manager.commit(id).unwrap();
        assert_eq!(manager.open_count(), 0);
        assert_eq!(manager.committed_count(), 1);
    }

    #[test]
    fn test_second_end_is_rejected() {
        let manager = LoggingTransactionManager::new();
        let id = manager.begin().unwrap();
        manager.rollback(id).unwrap();

        let err = manager.commit(id).unwrap_err();
        assert_eq!(err, GuardError::backend("transaction", "commit", "tx_1 is not open"));
        assert_eq!(manager.rolled_back_count(), 1);
        assert_eq!(manager.committed_count(), 0);
    }
}
