//! # branchkey-commons
//!
//! Shared model types for branchkey: column, index and table metadata, the
//! dialect-normalized cache key, and the primary-key value map handed to the
//! undo-log builder.
//!
//! This crate carries no async code and no driver types so that every other
//! crate (and external collaborators such as an undo-log builder) can depend
//! on it cheaply.
//!
//! ## Example Usage
//!
//! ```rust
//! use branchkey_commons::models::{PkValueMap, SqlValue};
//!
//! let mut pk_values = PkValueMap::new();
//! pk_values.insert_column("ID", vec![SqlValue::Int(1), SqlValue::Int(2)]);
//! assert_eq!(pk_values.row_count(), Some(2));
//! ```

pub mod models;

pub use models::{
    CacheKey, ColumnMeta, DialectKind, IndexMeta, IndexType, Nullability, PkValueMap, SqlValue,
    TableMeta, TableMetaBuilder, TableMetaError,
};
