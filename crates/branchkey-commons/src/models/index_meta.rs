//! Index metadata

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an index by its backing constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
    /// Backed by a PRIMARY KEY constraint
    Primary,
    /// Backed by a UNIQUE constraint
    Unique,
    /// Any other index
    Normal,
}

impl IndexType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexType::Primary => "PRIMARY",
            IndexType::Unique => "UNIQUE",
            IndexType::Normal => "NORMAL",
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named index.
///
/// Participating columns are stored by name in key order and resolved through
/// the owning [`TableMeta`](super::TableMeta).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub index_name: String,
    pub non_unique: bool,
    pub index_type: IndexType,
    /// Column names in key order
    pub columns: Vec<String>,
}

impl IndexMeta {
    pub fn new(index_name: impl Into<String>, index_type: IndexType, non_unique: bool) -> Self {
        Self {
            index_name: index_name.into(),
            non_unique,
            index_type,
            columns: Vec::new(),
        }
    }

    /// Append a participating column, ignoring repeats of the same name
    pub fn push_column(&mut self, column_name: impl Into<String>) {
        let column_name = column_name.into();
        if !self.columns.iter().any(|c| c == &column_name) {
            self.columns.push(column_name);
        }
    }

    pub fn is_primary(&self) -> bool {
        self.index_type == IndexType::Primary
    }
}
