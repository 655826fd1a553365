//! Storage layer implementation for heapdb.
//!
//! Pages are the unit of space management. Each table's heap is a growable
//! sequence of them, all held in memory:
//!
//! - **HeapPage**: Fixed-capacity slotted block that owns tuple versions
//! - **StorageConfig**: Page sizing shared by all heap files
//! - **StorageError**: Failures surfaced by page, heap and catalog operations

pub mod config;
pub mod error;
pub mod page;

pub use config::{StorageConfig, DEFAULT_PAGE_SIZE};
pub use error::{StorageError, StorageResult};
pub use page::{HeapPage, PageId};
