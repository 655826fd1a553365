use crate::access::value::Value;
use crate::catalog::{ColumnId, Schema};
use crate::storage::error::StorageResult;
use crate::storage::page::PageId;
use crate::transaction::TransactionId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

// Header layout (27 bytes): xmin(8) | xmax(8) | ctid page(8) + slot(2) | deleted(1)
pub const TUPLE_HEADER_SIZE: usize = 27;

/// Address of a tuple version: the page holding it and its slot number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TupleId {
    pub page_id: PageId,
    pub slot_id: u16,
}

impl TupleId {
    /// `(0, 0)`: the "no successor" value of a header's ctid.
    pub const INVALID: TupleId = TupleId {
        page_id: PageId::INVALID,
        slot_id: 0,
    };

    pub fn new(page_id: PageId, slot_id: u16) -> Self {
        Self { page_id, slot_id }
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl PartialOrd for TupleId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TupleId {
    fn cmp(&self, other: &Self) -> Ordering {
        // First compare by page_id, then by slot_id
        match self.page_id.cmp(&other.page_id) {
            Ordering::Equal => self.slot_id.cmp(&other.slot_id),
            other => other,
        }
    }
}

impl std::fmt::Display for TupleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.page_id, self.slot_id)
    }
}

/// MVCC metadata carried by every tuple version.
///
/// `xmin` is fixed when the version is created. `xmax` names the transaction
/// that deleted or superseded it, and `ctid` points at the next newer version
/// when one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TupleHeader {
    xmin: TransactionId,
    xmax: TransactionId,
    ctid: TupleId,
    deleted: bool,
}

impl TupleHeader {
    pub fn new(xmin: TransactionId) -> Self {
        Self {
            xmin,
            xmax: TransactionId::INVALID,
            ctid: TupleId::INVALID,
            deleted: false,
        }
    }

    pub fn xmin(&self) -> TransactionId {
        self.xmin
    }

    pub fn xmax(&self) -> TransactionId {
        self.xmax
    }

    pub fn ctid(&self) -> TupleId {
        self.ctid
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// True once a newer version has been linked through `ctid`.
    pub fn has_successor(&self) -> bool {
        self.ctid.is_valid()
    }

    pub fn set_xmax(&mut self, xmax: TransactionId) {
        self.xmax = xmax;
    }

    pub fn set_ctid(&mut self, ctid: TupleId) {
        self.ctid = ctid;
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }
}

/// Represents one version of a row
#[derive(Debug, Clone)]
pub struct Tuple {
    schema: Arc<Schema>,
    values: Vec<Value>,
    header: TupleHeader,
}

impl Tuple {
    /// Builds a tuple after checking `values` against `schema`.
    pub fn new(schema: Arc<Schema>, values: Vec<Value>, xmin: TransactionId) -> StorageResult<Self> {
        schema.validate_values(&values)?;
        Ok(Self {
            schema,
            values,
            header: TupleHeader::new(xmin),
        })
    }

    /// Copy of this row's values under a fresh header created by `xmin`.
    pub(crate) fn new_version(&self, xmin: TransactionId) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            values: self.values.clone(),
            header: TupleHeader::new(xmin),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn column_count(&self) -> usize {
        self.values.len()
    }

    /// Value of the column identified by `column_id`.
    pub fn value(&self, column_id: ColumnId) -> Option<&Value> {
        self.schema
            .column_index(column_id)
            .and_then(|index| self.values.get(index))
    }

    /// Value at the given position in schema order.
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn xmin(&self) -> TransactionId {
        self.header.xmin()
    }

    pub fn header(&self) -> &TupleHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut TupleHeader {
        &mut self.header
    }

    /// Size in bytes: header plus the stored size of every value.
    pub fn size(&self) -> usize {
        TUPLE_HEADER_SIZE + self.values.iter().map(Value::stored_size).sum::<usize>()
    }
}
