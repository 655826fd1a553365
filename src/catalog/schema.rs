//! Table schemas.

use crate::access::Value;
use crate::catalog::column_info::{Column, ColumnId};
use crate::storage::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};

/// Ordered column definitions of a table.
///
/// Tables and tuples share a schema through `Arc<Schema>`, so it cannot be
/// changed once rows are built against it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(columns: Vec<Column>) -> StorageResult<Self> {
        let mut schema = Self::new();
        for column in columns {
            schema.add_column(column)?;
        }
        Ok(schema)
    }

    pub fn add_column(&mut self, column: Column) -> StorageResult<()> {
        if self.column(column.column_id).is_some() {
            return Err(StorageError::DuplicateColumn(column.column_id));
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn column(&self, column_id: ColumnId) -> Option<&Column> {
        self.columns.iter().find(|col| col.column_id == column_id)
    }

    /// Position of the column in schema order.
    pub fn column_index(&self, column_id: ColumnId) -> Option<usize> {
        self.columns.iter().position(|col| col.column_id == column_id)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|col| col.name == name)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|col| col.primary_key)
    }

    /// Checks arity, NOT NULL constraints and type compatibility.
    pub fn validate_values(&self, values: &[Value]) -> StorageResult<()> {
        if values.len() != self.columns.len() {
            return Err(StorageError::ArityMismatch {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }

        for (column, value) in self.columns.iter().zip(values) {
            match value.data_type() {
                None if !column.nullable => {
                    return Err(StorageError::NullViolation {
                        column: column.name.clone(),
                    });
                }
                Some(actual) if actual != column.data_type => {
                    return Err(StorageError::TypeMismatch {
                        column: column.name.clone(),
                        expected: column.data_type,
                        actual,
                    });
                }
                _ => {}
            }
        }

        Ok(())
    }
}
