pub mod heap_page;

use serde::{Deserialize, Serialize};

/// Identifies a page within one table's heap. Ids start at 1 and are dense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub u64);

impl PageId {
    /// Sentinel used by the "no successor" tuple address.
    pub const INVALID: PageId = PageId(0);

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub use heap_page::{HeapPage, PAGE_HEADER_SIZE, SLOT_SIZE};
