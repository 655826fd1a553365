//! Operations recorded against a transaction.

use serde::{Deserialize, Serialize};

use crate::access::TupleId;
use crate::catalog::TableId;

/// A storage change made on behalf of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Insert {
        table_id: TableId,
        tuple_id: TupleId,
    },
    /// `old` and `new` are equal when the row was rewritten in place.
    Update {
        table_id: TableId,
        old: TupleId,
        new: TupleId,
    },
    Delete {
        table_id: TableId,
        tuple_id: TupleId,
    },
}

impl Operation {
    pub fn table_id(&self) -> TableId {
        match self {
            Self::Insert { table_id, .. }
            | Self::Update { table_id, .. }
            | Self::Delete { table_id, .. } => *table_id,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Insert { table_id, tuple_id } => {
                write!(f, "INSERT table {} at {}", table_id, tuple_id)
            }
            Self::Update { table_id, old, new } => {
                write!(f, "UPDATE table {} {} -> {}", table_id, old, new)
            }
            Self::Delete { table_id, tuple_id } => {
                write!(f, "DELETE table {} at {}", table_id, tuple_id)
            }
        }
    }
}
