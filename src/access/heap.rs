use crate::access::tuple::{Tuple, TupleId};
use crate::catalog::{Schema, TableId};
use crate::storage::config::DEFAULT_PAGE_SIZE;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{HeapPage, PageId};
use crate::transaction::TransactionId;
use std::collections::HashSet;
use std::sync::Arc;

/// Manages a table that spans multiple heap pages.
///
/// Pages are kept in creation order and never removed. Their ids are dense
/// and start at 1, so page `n` lives at index `n - 1`.
#[derive(Debug)]
pub struct HeapFile {
    table_id: TableId,
    name: String,
    schema: Arc<Schema>,
    pages: Vec<HeapPage>,
    next_page_id: PageId,
    page_size: usize,
}

impl HeapFile {
    pub fn new(table_id: TableId, name: impl Into<String>, schema: Arc<Schema>) -> Self {
        Self::with_page_size(table_id, name, schema, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(
        table_id: TableId,
        name: impl Into<String>,
        schema: Arc<Schema>,
        page_size: usize,
    ) -> Self {
        Self {
            table_id,
            name: name.into(),
            schema,
            pages: Vec::new(),
            next_page_id: PageId(1),
            page_size,
        }
    }

    /// Insert a tuple into the table
    ///
    /// The stored version gets a fresh header with `xmin = txn_id`.
    pub fn insert_tuple(&mut self, tuple: &Tuple, txn_id: TransactionId) -> StorageResult<TupleId> {
        self.check_schema(tuple)?;
        let tuple_id = self.insert_version(&tuple.new_version(txn_id))?;
        log::trace!("{}: inserted {} by {}", self.name, tuple_id, txn_id);
        Ok(tuple_id)
    }

    /// Replace the tuple at `old_id` with a new version created by `txn_id`.
    ///
    /// The version is rewritten in place when it fits, keeping `old_id`.
    /// Otherwise it is stored elsewhere and the old version is linked to it
    /// through `xmax` and `ctid`. Only the newest version of a row can be
    /// updated; a superseded `old_id` fails with `TupleSuperseded`.
    pub fn update_tuple(
        &mut self,
        old_id: TupleId,
        tuple: &Tuple,
        txn_id: TransactionId,
    ) -> StorageResult<TupleId> {
        self.check_schema(tuple)?;
        let version = tuple.new_version(txn_id);

        let page = self
            .page_mut(old_id.page_id)
            .ok_or(StorageError::TupleNotFound { tuple_id: old_id })?;
        match page.update_tuple(old_id, &version) {
            Ok(()) => return Ok(old_id),
            Err(StorageError::PageFull { .. }) => {}
            Err(e) => return Err(e),
        }

        let new_id = self.insert_version(&version)?;
        if let Some(previous) = self
            .page_mut(old_id.page_id)
            .and_then(|page| page.get_version_mut(old_id))
        {
            let header = previous.header_mut();
            header.set_xmax(txn_id);
            header.set_ctid(new_id);
        }

        log::debug!(
            "{}: {} relocated to {} by {}",
            self.name,
            old_id,
            new_id,
            txn_id
        );
        Ok(new_id)
    }

    /// Tombstone the tuple at `tuple_id` and stamp `xmax = txn_id`.
    ///
    /// Like updates, deletes must target the newest version of a row.
    pub fn delete_tuple(&mut self, tuple_id: TupleId, txn_id: TransactionId) -> StorageResult<()> {
        let page = self
            .page_mut(tuple_id.page_id)
            .ok_or(StorageError::TupleNotFound { tuple_id })?;
        page.delete_tuple(tuple_id)?;
        if let Some(tuple) = page.get_version_mut(tuple_id) {
            tuple.header_mut().set_xmax(txn_id);
        }

        log::trace!("{}: deleted {} by {}", self.name, tuple_id, txn_id);
        Ok(())
    }

    /// Get the live tuple at `tuple_id`.
    pub fn get_tuple(&self, tuple_id: TupleId) -> Option<&Tuple> {
        self.page(tuple_id.page_id)?.get_tuple(tuple_id)
    }

    /// Get the stored version at `tuple_id`, tombstoned or not.
    pub fn get_version(&self, tuple_id: TupleId) -> Option<&Tuple> {
        self.page(tuple_id.page_id)?.get_version(tuple_id)
    }

    /// Live tuples in page order, then slot order.
    ///
    /// Superseded versions left behind by a relocating update are not
    /// tombstoned, so a relocated row appears once per version here.
    pub fn tuples(&self) -> impl Iterator<Item = (TupleId, &Tuple)> + '_ {
        self.pages.iter().flat_map(HeapPage::tuples)
    }

    /// Newest version of every live row: `tuples()` minus superseded versions.
    pub fn current_tuples(&self) -> impl Iterator<Item = (TupleId, &Tuple)> + '_ {
        self.tuples()
            .filter(|(_, tuple)| !tuple.header().has_successor())
    }

    /// Copies of every live version, superseded ones included (see `tuples`).
    pub fn get_all_tuples(&self) -> Vec<Tuple> {
        self.tuples().map(|(_, tuple)| tuple.clone()).collect()
    }

    /// Follows `ctid` links from `tuple_id` to the newest version.
    ///
    /// The result starts with `tuple_id` itself and is empty if no version is
    /// stored there.
    pub fn version_chain(&self, tuple_id: TupleId) -> Vec<TupleId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = tuple_id;

        while let Some(version) = self.get_version(current) {
            if !seen.insert(current) {
                break;
            }
            chain.push(current);

            let next = version.header().ctid();
            if !next.is_valid() {
                break;
            }
            current = next;
        }

        chain
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[HeapPage] {
        &self.pages
    }

    pub fn page(&self, page_id: PageId) -> Option<&HeapPage> {
        self.page_index(page_id).map(|index| &self.pages[index])
    }

    fn page_mut(&mut self, page_id: PageId) -> Option<&mut HeapPage> {
        self.page_index(page_id).map(move |index| &mut self.pages[index])
    }

    fn page_index(&self, page_id: PageId) -> Option<usize> {
        if !page_id.is_valid() {
            return None;
        }
        let index = usize::try_from(page_id.0 - 1).ok()?;
        (index < self.pages.len()).then_some(index)
    }

    fn check_schema(&self, tuple: &Tuple) -> StorageResult<()> {
        if Arc::ptr_eq(tuple.schema(), &self.schema) || **tuple.schema() == *self.schema {
            Ok(())
        } else {
            Err(StorageError::SchemaMismatch {
                table_id: self.table_id,
            })
        }
    }

    // First fit over existing pages, then a fresh page.
    fn insert_version(&mut self, version: &Tuple) -> StorageResult<TupleId> {
        let required = HeapPage::required_space_for(version.size());
        let capacity = HeapPage::capacity_for(self.page_size);
        if required > capacity {
            return Err(StorageError::TupleTooLarge {
                size: required,
                capacity,
            });
        }

        if let Some(page) = self
            .pages
            .iter_mut()
            .find(|page| page.can_insert(required))
        {
            return page.insert_tuple(version);
        }

        self.allocate_page().insert_tuple(version)
    }

    fn allocate_page(&mut self) -> &mut HeapPage {
        let page_id = self.next_page_id;
        self.next_page_id = PageId(page_id.0 + 1);

        log::debug!("{}: allocating page {}", self.name, page_id);
        let index = self.pages.len();
        self.pages.push(HeapPage::new(page_id, self.page_size));
        &mut self.pages[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::value::{DataType, Value};
    use crate::catalog::{Column, ColumnId};
    use crate::storage::page::PAGE_HEADER_SIZE;

    fn users_schema() -> Arc<Schema> {
        Arc::new(
            Schema::with_columns(vec![
                Column::new(ColumnId(0), "id", DataType::Integer).primary_key(),
                Column::new(ColumnId(1), "name", DataType::Text),
            ])
            .unwrap(),
        )
    }

    fn row(schema: &Arc<Schema>, id: i64, name: Option<&str>) -> Tuple {
        let name = name.map_or(Value::Null, |n| Value::Text(n.to_string()));
        Tuple::new(Arc::clone(schema), vec![Value::Integer(id), name], TransactionId(1)).unwrap()
    }

    fn users_heap(page_size: usize) -> HeapFile {
        HeapFile::with_page_size(TableId(1), "users", users_schema(), page_size)
    }

    #[test]
    fn test_insert_and_get() -> anyhow::Result<()> {
        let mut heap = users_heap(DEFAULT_PAGE_SIZE);
        let schema = Arc::clone(heap.schema());
        assert_eq!(heap.page_count(), 0);

        let tid = heap.insert_tuple(&row(&schema, 1, Some("alice")), TransactionId(10))?;
        assert_eq!(tid, TupleId::new(PageId(1), 0));
        assert_eq!(heap.page_count(), 1);

        let stored = heap.get_tuple(tid).unwrap();
        assert_eq!(
            stored.values(),
            &[Value::Integer(1), Value::Text("alice".to_string())]
        );
        // The stored version is stamped by the inserting transaction
        assert_eq!(stored.xmin(), TransactionId(10));
        assert_eq!(stored.header().xmax(), TransactionId::INVALID);
        Ok(())
    }

    #[test]
    fn test_get_unknown_ids() {
        let heap = users_heap(DEFAULT_PAGE_SIZE);
        assert!(heap.get_tuple(TupleId::INVALID).is_none());
        assert!(heap.get_tuple(TupleId::new(PageId(1), 0)).is_none());
        assert!(heap.get_version(TupleId::new(PageId(7), 3)).is_none());
        assert!(heap.page(PageId(0)).is_none());
    }

    #[test]
    fn test_schema_mismatch() -> anyhow::Result<()> {
        let mut heap = users_heap(DEFAULT_PAGE_SIZE);

        let other = Arc::new(Schema::with_columns(vec![Column::new(
            ColumnId(0),
            "flag",
            DataType::Boolean,
        )])?);
        let tuple = Tuple::new(other, vec![Value::Boolean(true)], TransactionId(1))?;
        assert_eq!(
            heap.insert_tuple(&tuple, TransactionId(1)),
            Err(StorageError::SchemaMismatch {
                table_id: TableId(1)
            })
        );
        assert_eq!(heap.page_count(), 0);

        // An equal schema behind a different Arc is accepted
        let equal = users_schema();
        assert!(heap.insert_tuple(&row(&equal, 1, None), TransactionId(1)).is_ok());
        Ok(())
    }

    #[test]
    fn test_tuple_too_large_allocates_nothing() {
        let mut heap = users_heap(128);
        let schema = Arc::clone(heap.schema());
        let big = "x".repeat(200);

        let result = heap.insert_tuple(&row(&schema, 1, Some(&big)), TransactionId(1));
        assert!(matches!(result, Err(StorageError::TupleTooLarge { .. })));
        assert_eq!(heap.page_count(), 0);
    }

    #[test]
    fn test_many_inserts_fill_pages_in_order() -> anyhow::Result<()> {
        let schema = Arc::new(Schema::with_columns(vec![Column::new(
            ColumnId(0),
            "id",
            DataType::Integer,
        )
        .not_null()])?);
        let mut heap = HeapFile::new(TableId(1), "numbers", Arc::clone(&schema));

        let mut last_page_count = 0;
        for i in 0..250 {
            let tuple = Tuple::new(Arc::clone(&schema), vec![Value::Integer(i)], TransactionId(1))?;
            heap.insert_tuple(&tuple, TransactionId(1))?;
            assert!(heap.page_count() >= last_page_count);
            last_page_count = heap.page_count();
        }

        // 40 bytes charged per tuple: 204 fit in the first 8192-byte page
        assert_eq!(heap.page_count(), 2);
        assert_eq!(heap.page(PageId(1)).unwrap().live_tuple_count(), 204);
        assert_eq!(heap.page(PageId(2)).unwrap().live_tuple_count(), 46);

        let ids: Vec<Value> = heap
            .get_all_tuples()
            .iter()
            .map(|t| t.values()[0].clone())
            .collect();
        assert_eq!(ids, (0..250).map(Value::Integer).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_first_fit_reuses_earlier_page() -> anyhow::Result<()> {
        // Room for two "a" rows (46 bytes each) plus one null-name row (41 bytes)
        let mut heap = users_heap(PAGE_HEADER_SIZE + 46 * 2 + 41);
        let schema = Arc::clone(heap.schema());

        heap.insert_tuple(&row(&schema, 1, Some("a")), TransactionId(1))?;
        heap.insert_tuple(&row(&schema, 2, Some("a")), TransactionId(1))?;
        let wide = heap.insert_tuple(&row(&schema, 3, Some("abcdef")), TransactionId(1))?;
        assert_eq!(wide.page_id, PageId(2));

        let narrow = heap.insert_tuple(&row(&schema, 4, None), TransactionId(1))?;
        assert_eq!(narrow.page_id, PageId(1));
        assert_eq!(heap.page(PageId(1)).unwrap().free_space(), 0);
        Ok(())
    }

    #[test]
    fn test_update_in_place() -> anyhow::Result<()> {
        let mut heap = users_heap(DEFAULT_PAGE_SIZE);
        let schema = Arc::clone(heap.schema());
        let tid = heap.insert_tuple(&row(&schema, 1, Some("alice")), TransactionId(10))?;

        let same = heap.update_tuple(tid, &row(&schema, 1, Some("alicia")), TransactionId(20))?;
        assert_eq!(same, tid);
        let smaller = heap.update_tuple(tid, &row(&schema, 1, None), TransactionId(21))?;
        assert_eq!(smaller, tid);

        let stored = heap.get_tuple(tid).unwrap();
        assert_eq!(stored.value(ColumnId(1)), Some(&Value::Null));
        assert_eq!(stored.xmin(), TransactionId(21));
        assert!(!stored.header().has_successor());
        assert_eq!(heap.version_chain(tid), vec![tid]);
        Ok(())
    }

    #[test]
    fn test_update_relocates_and_links_versions() -> anyhow::Result<()> {
        // Exactly two "a" rows fit on a page
        let mut heap = users_heap(PAGE_HEADER_SIZE + 46 * 2);
        let schema = Arc::clone(heap.schema());
        let old = heap.insert_tuple(&row(&schema, 1, Some("a")), TransactionId(10))?;
        heap.insert_tuple(&row(&schema, 2, Some("a")), TransactionId(10))?;

        let new = heap.update_tuple(old, &row(&schema, 1, Some("abcdef")), TransactionId(20))?;
        assert_ne!(new, old);
        assert_eq!(new.page_id, PageId(2));
        assert_eq!(heap.page_count(), 2);

        let previous = heap.get_version(old).unwrap();
        assert_eq!(previous.header().xmax(), TransactionId(20));
        assert_eq!(previous.header().ctid(), new);
        assert!(!previous.header().is_deleted());
        assert_eq!(previous.value(ColumnId(1)), Some(&Value::Text("a".to_string())));

        let current = heap.get_tuple(new).unwrap();
        assert_eq!(current.xmin(), TransactionId(20));
        assert_eq!(current.value(ColumnId(1)), Some(&Value::Text("abcdef".to_string())));

        assert_eq!(heap.version_chain(old), vec![old, new]);
        assert_eq!(heap.version_chain(new), vec![new]);
        Ok(())
    }

    #[test]
    fn test_superseded_version_rejects_update_and_delete() -> anyhow::Result<()> {
        let mut heap = users_heap(PAGE_HEADER_SIZE + 46 * 2);
        let schema = Arc::clone(heap.schema());
        let old = heap.insert_tuple(&row(&schema, 1, Some("a")), TransactionId(10))?;
        heap.insert_tuple(&row(&schema, 2, Some("b")), TransactionId(10))?;
        let new = heap.update_tuple(old, &row(&schema, 1, Some("abcdef")), TransactionId(20))?;

        let superseded = StorageError::TupleSuperseded {
            tuple_id: old,
            successor: new,
        };
        assert_eq!(
            heap.update_tuple(old, &row(&schema, 1, Some("z")), TransactionId(30)),
            Err(superseded.clone())
        );
        assert_eq!(heap.delete_tuple(old, TransactionId(99)), Err(superseded));

        let previous = heap.get_version(old).unwrap();
        assert_eq!(previous.header().xmax(), TransactionId(20));
        assert_eq!(previous.header().ctid(), new);
        assert!(heap.get_tuple(new).is_some());
        assert_eq!(heap.version_chain(old), vec![old, new]);

        // The newest version is still writable
        heap.delete_tuple(new, TransactionId(40))?;
        assert!(heap.get_tuple(new).is_none());
        Ok(())
    }

    #[test]
    fn test_current_tuples_skip_superseded_versions() -> anyhow::Result<()> {
        let mut heap = users_heap(PAGE_HEADER_SIZE + 46 * 2);
        let schema = Arc::clone(heap.schema());
        let old = heap.insert_tuple(&row(&schema, 1, Some("a")), TransactionId(1))?;
        let other = heap.insert_tuple(&row(&schema, 2, Some("b")), TransactionId(1))?;
        let new = heap.update_tuple(old, &row(&schema, 1, Some("abcdef")), TransactionId(2))?;

        assert_eq!(heap.tuples().count(), 3);
        assert_eq!(heap.get_all_tuples().len(), 3);
        let current: Vec<TupleId> = heap.current_tuples().map(|(tid, _)| tid).collect();
        assert_eq!(current, vec![other, new]);
        Ok(())
    }

    #[test]
    fn test_insert_moves_on_when_page_slots_run_out() -> anyhow::Result<()> {
        let empty = Arc::new(Schema::new());
        let tuple = Tuple::new(Arc::clone(&empty), vec![], TransactionId(1))?;
        let required = HeapPage::required_space_for(tuple.size());
        let mut heap =
            HeapFile::with_page_size(TableId(1), "wide", empty, PAGE_HEADER_SIZE + required * 70_000);

        let slots_per_page = usize::from(u16::MAX) + 1;
        let mut last = TupleId::INVALID;
        for _ in 0..slots_per_page {
            last = heap.insert_tuple(&tuple, TransactionId(1))?;
        }
        assert_eq!(last, TupleId::new(PageId(1), u16::MAX));
        assert_eq!(heap.page_count(), 1);

        // Page 1 still has bytes to spare but no slot numbers left
        let first = heap.page(PageId(1)).unwrap();
        assert!(first.has_free_space(required));
        assert!(!first.can_insert(required));

        let next = heap.insert_tuple(&tuple, TransactionId(1))?;
        assert_eq!(next, TupleId::new(PageId(2), 0));
        assert_eq!(heap.page_count(), 2);
        Ok(())
    }

    #[test]
    fn test_update_missing_or_deleted() -> anyhow::Result<()> {
        let mut heap = users_heap(DEFAULT_PAGE_SIZE);
        let schema = Arc::clone(heap.schema());

        let never = TupleId::new(PageId(1), 0);
        assert_eq!(
            heap.update_tuple(never, &row(&schema, 1, None), TransactionId(1)),
            Err(StorageError::TupleNotFound { tuple_id: never })
        );

        let tid = heap.insert_tuple(&row(&schema, 1, None), TransactionId(1))?;
        let unknown_slot = TupleId::new(PageId(1), 5);
        assert!(heap
            .update_tuple(unknown_slot, &row(&schema, 1, None), TransactionId(2))
            .is_err());

        heap.delete_tuple(tid, TransactionId(3))?;
        assert_eq!(
            heap.update_tuple(tid, &row(&schema, 1, Some("b")), TransactionId(4)),
            Err(StorageError::TupleNotFound { tuple_id: tid })
        );
        Ok(())
    }

    #[test]
    fn test_delete() -> anyhow::Result<()> {
        let mut heap = users_heap(DEFAULT_PAGE_SIZE);
        let schema = Arc::clone(heap.schema());
        let first = heap.insert_tuple(&row(&schema, 1, Some("a")), TransactionId(1))?;
        let second = heap.insert_tuple(&row(&schema, 2, Some("b")), TransactionId(1))?;
        let free_before = heap.page(PageId(1)).unwrap().free_space();

        heap.delete_tuple(first, TransactionId(5))?;
        assert!(heap.get_tuple(first).is_none());
        assert!(heap.get_tuple(second).is_some());

        let tombstone = heap.get_version(first).unwrap();
        assert!(tombstone.header().is_deleted());
        assert_eq!(tombstone.header().xmax(), TransactionId(5));

        // Space is not reclaimed and the slot stays allocated
        let page = heap.page(PageId(1)).unwrap();
        assert_eq!(page.free_space(), free_before);
        assert_eq!(page.slot_count(), 2);

        assert_eq!(
            heap.delete_tuple(first, TransactionId(6)),
            Err(StorageError::TupleNotFound { tuple_id: first })
        );
        assert!(heap.delete_tuple(TupleId::new(PageId(9), 0), TransactionId(6)).is_err());

        let remaining: Vec<TupleId> = heap.tuples().map(|(tid, _)| tid).collect();
        assert_eq!(remaining, vec![second]);
        assert_eq!(heap.get_all_tuples().len(), 1);
        Ok(())
    }
}
