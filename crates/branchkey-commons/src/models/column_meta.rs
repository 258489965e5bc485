//! Column metadata as reported by a driver's column catalog

use serde::{Deserialize, Serialize};

/// Nullability reported by the column catalog (`NULLABLE` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Nullability {
    /// Column does not allow NULL values
    NoNulls,
    /// Column allows NULL values
    Nullable,
    /// Nullability could not be determined
    #[default]
    Unknown,
}

impl Nullability {
    /// Map the numeric catalog code (0 = no nulls, 1 = nullable, 2 = unknown)
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Nullability::NoNulls,
            1 => Nullability::Nullable,
            _ => Nullability::Unknown,
        }
    }
}

/// One table column.
///
/// Immutable once built; owned by a [`TableMeta`](super::TableMeta) and shared
/// read-only through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ColumnMeta {
    pub table_cat: Option<String>,
    pub table_schema_name: Option<String>,
    pub table_name: String,
    pub column_name: String,

    /// Driver-reported type code
    pub data_type: i32,
    pub data_type_name: String,
    pub column_size: i32,
    pub decimal_digits: i32,
    pub num_prec_radix: i32,

    pub nullable: Nullability,
    /// Raw `IS_NULLABLE` text ("YES" / "NO" / "")
    pub is_nullable: String,
    pub remarks: Option<String>,
    pub column_def: Option<String>,

    /// 1-indexed position of the column in the table
    pub ordinal_position: u32,

    pub is_autoincrement: bool,
}

impl ColumnMeta {
    /// Create a column with the minimal set of attributes the resolver needs.
    ///
    /// Everything else starts at its catalog default and can be filled in with
    /// the `with_*` builders.
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        data_type_name: impl Into<String>,
        ordinal_position: u32,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            data_type_name: data_type_name.into(),
            ordinal_position,
            ..Default::default()
        }
    }

    pub fn with_autoincrement(mut self, auto: bool) -> Self {
        self.is_autoincrement = auto;
        self
    }

    pub fn with_nullable(mut self, nullable: Nullability) -> Self {
        self.is_nullable = match nullable {
            Nullability::NoNulls => "NO".to_string(),
            Nullability::Nullable => "YES".to_string(),
            Nullability::Unknown => String::new(),
        };
        self.nullable = nullable;
        self
    }

    pub fn with_default(mut self, column_def: impl Into<String>) -> Self {
        self.column_def = Some(column_def.into());
        self
    }

    pub fn with_data_type(mut self, data_type: i32) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_size(mut self, column_size: i32, decimal_digits: i32) -> Self {
        self.column_size = column_size;
        self.decimal_digits = decimal_digits;
        self
    }

    pub fn is_autoincrement(&self) -> bool {
        self.is_autoincrement
    }
}
