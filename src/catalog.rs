//! Table catalog.
//!
//! The [`StorageManager`] owns every [`HeapFile`] of the database, keyed by
//! [`TableId`], together with the schema each table was created with.

pub mod column_info;
pub mod schema;
pub mod table_info;

pub use column_info::{Column, ColumnId};
pub use schema::Schema;
pub use table_info::TableId;

use crate::access::HeapFile;
use crate::storage::StorageConfig;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct StorageManager {
    tables: BTreeMap<TableId, HeapFile>,
    next_table_id: u32,
    config: StorageConfig,
}

impl StorageManager {
    pub fn new() -> Self {
        Self::with_config(StorageConfig::default())
    }

    /// Creates a manager whose tables use the given page size.
    pub fn with_config(config: StorageConfig) -> Self {
        Self {
            tables: BTreeMap::new(),
            next_table_id: 1,
            config,
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Registers a new, empty table and returns its id.
    pub fn create_table(&mut self, name: impl Into<String>, schema: Schema) -> TableId {
        let table_id = TableId(self.next_table_id);
        self.next_table_id += 1;

        let name = name.into();
        log::debug!(
            "Creating table '{}' as {} with {} columns",
            name,
            table_id,
            schema.column_count()
        );

        let heap = HeapFile::with_page_size(
            table_id,
            name,
            Arc::new(schema),
            self.config.page_size(),
        );
        self.tables.insert(table_id, heap);
        table_id
    }

    pub fn get_table(&self, table_id: TableId) -> Option<&HeapFile> {
        self.tables.get(&table_id)
    }

    pub fn get_table_mut(&mut self, table_id: TableId) -> Option<&mut HeapFile> {
        self.tables.get_mut(&table_id)
    }

    /// Id of the table called `name`. With duplicate names the oldest table wins.
    pub fn table_id(&self, name: &str) -> Option<TableId> {
        self.tables
            .values()
            .find(|heap| heap.name() == name)
            .map(HeapFile::table_id)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

impl Default for StorageManager {
    fn default() -> Self {
        Self::new()
    }
}
