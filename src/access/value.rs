use serde::{Deserialize, Serialize};

/// Width of the variant tag stored with every value
pub const VALUE_TAG_SIZE: usize = 1;

/// Width of the length prefix stored before a text payload
pub const TEXT_LENGTH_SIZE: usize = 4;

/// Data types supported by the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Double,
    Text,
    Boolean,
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataType::Integer => "INTEGER",
            DataType::Double => "DOUBLE",
            DataType::Text => "TEXT",
            DataType::Boolean => "BOOLEAN",
        };
        write!(f, "{}", name)
    }
}

/// Values that can be stored in the database.
///
/// Equality is structural: values of different variants are never equal,
/// so `Integer(1)` differs from both `Double(1.0)` and `Text("1")`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Integer(i64),
    Double(f64),
    Text(String),
    Boolean(bool),
    Null,
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Integer(_) => Some(DataType::Integer),
            Value::Double(_) => Some(DataType::Double),
            Value::Text(_) => Some(DataType::Text),
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is compatible with the given data type
    pub fn is_compatible_with(&self, data_type: DataType) -> bool {
        match self.data_type() {
            None => true, // NULL is compatible with any type
            Some(own) => own == data_type,
        }
    }

    /// Bytes this value occupies inside a tuple: tag, fixed payload, text bytes.
    pub fn stored_size(&self) -> usize {
        let payload = match self {
            Value::Integer(_) | Value::Double(_) => 8,
            Value::Boolean(_) => 1,
            Value::Text(s) => TEXT_LENGTH_SIZE + s.len(),
            Value::Null => 0,
        };
        VALUE_TAG_SIZE + payload
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Double(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "NULL"),
        }
    }
}
