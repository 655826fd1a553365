//! Transaction manager for coordinating transaction lifecycle.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use super::id::{TransactionId, TransactionIdGenerator};
use super::operation::Operation;
use super::state::{IsolationLevel, Transaction, TransactionState};

/// Error types for transaction operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransactionError {
    #[error("Transaction {0} not found")]
    NotFound(TransactionId),

    #[error("Transaction {0} is in invalid state: {1}")]
    InvalidState(TransactionId, TransactionState),
}

/// Result type for transaction operations.
pub type Result<T> = std::result::Result<T, TransactionError>;

struct Inner {
    id_generator: TransactionIdGenerator,
    transactions: BTreeMap<TransactionId, Transaction>,
}

impl Inner {
    fn get_mut(&mut self, id: TransactionId) -> Result<&mut Transaction> {
        self.transactions
            .get_mut(&id)
            .ok_or(TransactionError::NotFound(id))
    }
}

/// The transaction manager handles the lifecycle of all transactions.
///
/// Every operation runs under a single lock covering both the id generator
/// and the transaction table, so all calls are totally ordered. Finished
/// transactions stay queryable until [`cleanup_finished`] removes them.
///
/// [`cleanup_finished`]: TransactionManager::cleanup_finished
pub struct TransactionManager {
    inner: Mutex<Inner>,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                id_generator: TransactionIdGenerator::new(),
                transactions: BTreeMap::new(),
            }),
        }
    }

    /// Begins a new transaction and returns its id.
    pub fn begin_transaction(&self, isolation_level: IsolationLevel) -> TransactionId {
        let mut inner = self.inner.lock();
        let id = inner.id_generator.next();
        inner
            .transactions
            .insert(id, Transaction::new(id, isolation_level));

        log::debug!("Began {} ({})", id, isolation_level);
        id
    }

    /// Commits an active transaction.
    pub fn commit_transaction(&self, id: TransactionId) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.get_mut(id)?.commit()?;

        log::debug!("Committed {}", id);
        Ok(())
    }

    /// Rolls back a transaction. Rolling back one that already finished is a
    /// no-op.
    pub fn rollback_transaction(&self, id: TransactionId) -> Result<()> {
        let mut inner = self.inner.lock();
        let txn = inner.get_mut(id)?;
        if txn.rollback() {
            log::debug!("Rolled back {}", id);
        } else {
            log::trace!("Ignoring rollback of {}: already {}", id, txn.state());
        }
        Ok(())
    }

    /// Snapshot of the transaction.
    pub fn get_transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.inner.lock().transactions.get(&id).cloned()
    }

    /// Gets the state of a transaction.
    pub fn get_state(&self, id: TransactionId) -> Result<TransactionState> {
        self.inner
            .lock()
            .transactions
            .get(&id)
            .map(Transaction::state)
            .ok_or(TransactionError::NotFound(id))
    }

    /// Checks if a transaction exists and is active.
    pub fn is_transaction_active(&self, id: TransactionId) -> bool {
        self.get_state(id)
            .map(|state| state.is_active())
            .unwrap_or(false)
    }

    pub fn active_transaction_ids(&self) -> Vec<TransactionId> {
        self.inner
            .lock()
            .transactions
            .values()
            .filter(|txn| txn.state().is_active())
            .map(Transaction::id)
            .collect()
    }

    /// Appends `operation` to an active transaction's log.
    pub fn record_operation(&self, id: TransactionId, operation: Operation) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.get_mut(id)?.add_operation(operation)?;

        log::trace!("{}: {}", id, operation);
        Ok(())
    }

    /// Returns the total number of transactions (active and finished).
    pub fn transaction_count(&self) -> usize {
        self.inner.lock().transactions.len()
    }

    /// Removes finished transactions and returns how many were dropped.
    pub fn cleanup_finished(&self) -> usize {
        let mut inner = self.inner.lock();
        let initial_count = inner.transactions.len();

        inner.transactions.retain(|_, txn| !txn.state().is_finished());

        let removed = initial_count - inner.transactions.len();
        log::debug!("Removed {} finished transactions", removed);
        removed
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle to a transaction that rolls back on drop unless committed.
pub struct TransactionGuard {
    id: TransactionId,
    manager: Arc<TransactionManager>,
    finished: bool,
}

impl TransactionGuard {
    pub fn begin(manager: Arc<TransactionManager>, isolation_level: IsolationLevel) -> Self {
        let id = manager.begin_transaction(isolation_level);
        Self {
            id,
            manager,
            finished: false,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn record(&self, operation: Operation) -> Result<()> {
        self.manager.record_operation(self.id, operation)
    }

    pub fn commit(mut self) -> Result<()> {
        self.manager.commit_transaction(self.id)?;
        self.finished = true;
        Ok(())
    }

    pub fn rollback(mut self) -> Result<()> {
        self.manager.rollback_transaction(self.id)?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        if !self.finished {
            // Best effort rollback - ignore errors
            let _ = self.manager.rollback_transaction(self.id);
        }
    }
}
