//! Access layer for tuple-oriented operations.
//!
//! - **HeapFile**: one table's tuples spread over a growing list of pages
//! - **Tuple**: a row version with its MVCC header, addressed by a TupleId
//! - **Value**: Type-safe representation of column values
//!
//! Updates that no longer fit in place are written as a new version and the
//! old one is linked to it through its header, so a `TupleId` always names
//! the same version for as long as the table exists.

pub mod heap;
pub mod tuple;
pub mod value;

pub use heap::HeapFile;
pub use tuple::{Tuple, TupleHeader, TupleId, TUPLE_HEADER_SIZE};
pub use value::{DataType, Value};
