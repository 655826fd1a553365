//! Transaction management module.
//!
//! Transactions here only hand out identifiers and track their lifecycle:
//! - Transaction lifecycle management (begin, commit, rollback)
//! - Isolation level bookkeeping
//! - Per-transaction operation log
//!
//! The storage layer stamps these ids onto tuple headers; deciding which
//! versions a transaction may see is left to the layer above.

pub mod id;
pub mod manager;
pub mod operation;
pub mod state;

// Re-export commonly used types
pub use id::{TransactionId, TransactionIdGenerator};
pub use manager::{TransactionError, TransactionGuard, TransactionManager};
pub use operation::Operation;
pub use state::{IsolationLevel, Transaction, TransactionState};
