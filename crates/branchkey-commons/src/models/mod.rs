//! Model types shared across branchkey crates.

pub mod cache_key;
pub mod column_meta;
pub mod dialect_kind;
pub mod index_meta;
pub mod pk_values;
pub mod sql_value;
pub mod table_meta;

pub use cache_key::CacheKey;
pub use column_meta::{ColumnMeta, Nullability};
pub use dialect_kind::DialectKind;
pub use index_meta::{IndexMeta, IndexType};
pub use pk_values::PkValueMap;
pub use sql_value::SqlValue;
pub use table_meta::{TableMeta, TableMetaBuilder, TableMetaError};
