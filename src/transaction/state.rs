//! Transaction state management.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::id::TransactionId;
use super::manager::{Result, TransactionError};
use super::operation::Operation;

/// The possible states of a transaction.
///
/// `Active` moves to `Committed` through `InCommit`, or to `Aborted`.
/// `Committed` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionState {
    /// The transaction is currently active and can perform operations.
    Active,
    /// The transaction is in the middle of committing.
    InCommit,
    /// The transaction has been successfully committed.
    Committed,
    /// The transaction has been aborted (rolled back).
    Aborted,
}

impl TransactionState {
    /// Returns true if the transaction is active.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns true if the transaction is finished (committed or aborted).
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Committed | Self::Aborted)
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::InCommit => write!(f, "InCommit"),
            Self::Committed => write!(f, "Committed"),
            Self::Aborted => write!(f, "Aborted"),
        }
    }
}

/// Isolation level requested when a transaction begins.
///
/// The level is recorded for the layer that evaluates visibility; storage
/// itself does not interpret it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IsolationLevel {
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl std::fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ReadUncommitted => "READ UNCOMMITTED",
            Self::ReadCommitted => "READ COMMITTED",
            Self::RepeatableRead => "REPEATABLE READ",
            Self::Serializable => "SERIALIZABLE",
        };
        write!(f, "{}", name)
    }
}

/// A transaction as tracked by the manager.
#[derive(Debug, Clone)]
pub struct Transaction {
    id: TransactionId,
    isolation_level: IsolationLevel,
    state: TransactionState,
    start_time: Instant,
    end_time: Option<Instant>,
    operations: Vec<Operation>,
}

impl Transaction {
    pub(crate) fn new(id: TransactionId, isolation_level: IsolationLevel) -> Self {
        Self {
            id,
            isolation_level,
            state: TransactionState::Active,
            start_time: Instant::now(),
            end_time: None,
            operations: Vec::new(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn isolation_level(&self) -> IsolationLevel {
        self.isolation_level
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    pub fn end_time(&self) -> Option<Instant> {
        self.end_time
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Returns the duration for which the transaction has been running.
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Active -> InCommit -> Committed.
    pub(crate) fn commit(&mut self) -> Result<()> {
        self.enter_commit()?;
        self.finish(TransactionState::Committed);
        Ok(())
    }

    /// Aborts the transaction. Returns false, leaving it untouched, when it
    /// had already finished.
    pub(crate) fn rollback(&mut self) -> bool {
        if self.state.is_finished() {
            return false;
        }
        self.finish(TransactionState::Aborted);
        true
    }

    pub(crate) fn add_operation(&mut self, operation: Operation) -> Result<()> {
        if !self.state.is_active() {
            return Err(TransactionError::InvalidState(self.id, self.state));
        }
        self.operations.push(operation);
        Ok(())
    }

    fn enter_commit(&mut self) -> Result<()> {
        if !self.state.is_active() {
            return Err(TransactionError::InvalidState(self.id, self.state));
        }
        self.state = TransactionState::InCommit;
        Ok(())
    }

    fn finish(&mut self, state: TransactionState) {
        self.state = state;
        self.end_time = Some(Instant::now());
    }
}
