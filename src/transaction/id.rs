//! Transaction ID generation.

use serde::{Deserialize, Serialize};

/// A unique identifier for a transaction.
///
/// Ids handed out by the manager start at 1; `TransactionId(0)` is the
/// "unset" value found in the `xmax` of a tuple nobody has superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl TransactionId {
    pub const INVALID: TransactionId = TransactionId(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the inner u64 value.
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Txn{}", self.0)
    }
}

/// Monotonic id source owned by the transaction manager.
///
/// It is not synchronized on its own; the manager only touches it while
/// holding its lock, so ids are handed out in the same order transactions
/// are registered.
#[derive(Debug)]
pub struct TransactionIdGenerator {
    next_id: u64,
}

impl TransactionIdGenerator {
    /// Creates a generator whose first id is 1.
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    pub fn next(&mut self) -> TransactionId {
        let id = TransactionId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Returns the last id handed out, or `INVALID` if none was.
    pub fn current(&self) -> TransactionId {
        TransactionId(self.next_id - 1)
    }
}

impl Default for TransactionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
