//! Storage layer error types.

use thiserror::Error;

use crate::access::tuple::TupleId;
use crate::access::value::DataType;
use crate::catalog::{ColumnId, TableId};
use crate::storage::page::PageId;

/// Errors that can occur in the storage layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Tuple not found: {tuple_id} is unknown or deleted")]
    TupleNotFound { tuple_id: TupleId },

    #[error("Page {page_id} is full: requires {required} bytes but only {available} available")]
    PageFull {
        page_id: PageId,
        required: usize,
        available: usize,
    },

    #[error("Tuple {tuple_id} was superseded by {successor} and cannot be modified")]
    TupleSuperseded { tuple_id: TupleId, successor: TupleId },

    #[error("Tuple of {size} bytes can never fit in a page with {capacity} usable bytes")]
    TupleTooLarge { size: usize, capacity: usize },

    #[error("Page {page_id} has no slot numbers left")]
    SlotsExhausted { page_id: PageId },

    #[error("Tuple has {actual} values but schema expects {expected} columns")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("Column '{column}' cannot be NULL")]
    NullViolation { column: String },

    #[error("Column '{column}' expects {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("Duplicate column id {0} in schema")]
    DuplicateColumn(ColumnId),

    #[error("Tuple schema does not match the schema of table {table_id}")]
    SchemaMismatch { table_id: TableId },

    #[error("Invalid page size {size}: must be at least {minimum} bytes")]
    InvalidPageSize { size: usize, minimum: usize },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
