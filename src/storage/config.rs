//! Storage configuration.

use crate::access::tuple::TUPLE_HEADER_SIZE;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{PAGE_HEADER_SIZE, SLOT_SIZE};

/// Default logical page capacity in bytes (8KB, as in PostgreSQL).
pub const DEFAULT_PAGE_SIZE: usize = 8192;

/// Smallest page that can hold its header and one zero-column tuple.
pub const MIN_PAGE_SIZE: usize = PAGE_HEADER_SIZE + TUPLE_HEADER_SIZE + SLOT_SIZE;

/// Settings shared by every heap file a [`StorageManager`] creates.
///
/// [`StorageManager`]: crate::catalog::StorageManager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    page_size: usize,
}

impl StorageConfig {
    /// Creates a configuration with the given page size.
    pub fn new(page_size: usize) -> StorageResult<Self> {
        if page_size < MIN_PAGE_SIZE {
            return Err(StorageError::InvalidPageSize {
                size: page_size,
                minimum: MIN_PAGE_SIZE,
            });
        }
        Ok(Self { page_size })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
