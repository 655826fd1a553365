use std::collections::BTreeMap;

use crate::access::tuple::{Tuple, TupleId};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::PageId;

// Fixed page overhead (16 bytes): page id, free space counter, slot counter
pub const PAGE_HEADER_SIZE: usize = 16;

// Slot directory entry charged per tuple (4 bytes: 2 for offset, 2 for length)
pub const SLOT_SIZE: usize = 4;

/// Fixed-capacity slotted page holding tuple versions.
///
/// Slot numbers come from a per-page counter and are never reused, so a
/// `TupleId` stays a stable address for the lifetime of the version. Deleting
/// a tuple only sets its tombstone; the slot and its charged space remain.
#[derive(Debug)]
pub struct HeapPage {
    page_id: PageId,
    page_size: usize,
    free_space: usize,
    slots: BTreeMap<u16, Tuple>,
    // u32 so that slot u16::MAX can still be handed out
    next_slot: u32,
}

impl HeapPage {
    pub fn new(page_id: PageId, page_size: usize) -> Self {
        Self {
            page_id,
            page_size,
            free_space: Self::capacity_for(page_size),
            slots: BTreeMap::new(),
            next_slot: 0,
        }
    }

    /// Usable bytes of an empty page of the given size.
    pub fn capacity_for(page_size: usize) -> usize {
        page_size.saturating_sub(PAGE_HEADER_SIZE)
    }

    /// Bytes charged against free space for a tuple of `tuple_size` bytes.
    pub fn required_space_for(tuple_size: usize) -> usize {
        tuple_size + SLOT_SIZE
    }

    pub fn insert_tuple(&mut self, tuple: &Tuple) -> StorageResult<TupleId> {
        let slot_id = u16::try_from(self.next_slot).map_err(|_| StorageError::SlotsExhausted {
            page_id: self.page_id,
        })?;

        let required = Self::required_space_for(tuple.size());
        if !self.has_free_space(required) {
            return Err(StorageError::PageFull {
                page_id: self.page_id,
                required,
                available: self.free_space,
            });
        }

        self.next_slot += 1;
        self.slots.insert(slot_id, tuple.clone());
        self.free_space -= required;

        Ok(TupleId::new(self.page_id, slot_id))
    }

    /// Returns the live tuple at `tuple_id`, hiding tombstoned versions.
    pub fn get_tuple(&self, tuple_id: TupleId) -> Option<&Tuple> {
        self.get_version(tuple_id)
            .filter(|tuple| !tuple.header().is_deleted())
    }

    /// Returns the stored version at `tuple_id` even if it is tombstoned.
    pub fn get_version(&self, tuple_id: TupleId) -> Option<&Tuple> {
        if tuple_id.page_id != self.page_id {
            return None;
        }
        self.slots.get(&tuple_id.slot_id)
    }

    pub(crate) fn get_version_mut(&mut self, tuple_id: TupleId) -> Option<&mut Tuple> {
        if tuple_id.page_id != self.page_id {
            return None;
        }
        self.slots.get_mut(&tuple_id.slot_id)
    }

    /// Returns the newest version at `tuple_id`, the only kind that may be
    /// updated or deleted.
    fn current_version(&self, tuple_id: TupleId) -> StorageResult<&Tuple> {
        let tuple = self
            .get_tuple(tuple_id)
            .ok_or(StorageError::TupleNotFound { tuple_id })?;
        if tuple.header().has_successor() {
            return Err(StorageError::TupleSuperseded {
                tuple_id,
                successor: tuple.header().ctid(),
            });
        }
        Ok(tuple)
    }

    /// Replaces the current tuple at `tuple_id` in place.
    ///
    /// Growth must fit in the remaining free space; there is no relocation
    /// here, the heap file falls back to inserting elsewhere.
    pub fn update_tuple(&mut self, tuple_id: TupleId, new_tuple: &Tuple) -> StorageResult<()> {
        let old_size = Self::required_space_for(self.current_version(tuple_id)?.size());
        let new_size = Self::required_space_for(new_tuple.size());

        if new_size > old_size && !self.has_free_space(new_size - old_size) {
            return Err(StorageError::PageFull {
                page_id: self.page_id,
                required: new_size - old_size,
                available: self.free_space,
            });
        }

        self.slots.insert(tuple_id.slot_id, new_tuple.clone());
        self.free_space = self.free_space + old_size - new_size;

        Ok(())
    }

    /// Marks the tuple at `tuple_id` as deleted without reclaiming its space.
    pub fn delete_tuple(&mut self, tuple_id: TupleId) -> StorageResult<()> {
        self.current_version(tuple_id)?;
        if let Some(tuple) = self.get_version_mut(tuple_id) {
            tuple.header_mut().set_deleted(true);
        }
        Ok(())
    }

    pub fn has_free_space(&self, required_size: usize) -> bool {
        self.free_space >= required_size
    }

    /// True while the slot counter can still number a new tuple.
    pub fn has_free_slot(&self) -> bool {
        self.next_slot <= u32::from(u16::MAX)
    }

    /// Whether a tuple charged `required_size` bytes can be inserted.
    pub fn can_insert(&self, required_size: usize) -> bool {
        self.has_free_slot() && self.has_free_space(required_size)
    }

    /// Live tuples in slot order.
    pub fn tuples(&self) -> impl Iterator<Item = (TupleId, &Tuple)> + '_ {
        self.slots
            .iter()
            .filter(|(_, tuple)| !tuple.header().is_deleted())
            .map(move |(slot_id, tuple)| (TupleId::new(self.page_id, *slot_id), tuple))
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn free_space(&self) -> usize {
        self.free_space
    }

    /// Number of slots ever allocated, tombstones included.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn live_tuple_count(&self) -> usize {
        self.slots
            .values()
            .filter(|tuple| !tuple.header().is_deleted())
            .count()
    }

    /// Sum of the space charged by every stored version, tombstones included.
    pub fn charged_space(&self) -> usize {
        self.slots
            .values()
            .map(|tuple| Self::required_space_for(tuple.size()))
            .sum()
    }
}
