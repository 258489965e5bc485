//! Schema Registry module
//!
//! Fetches and memoizes table snapshots (columns, indexes, primary key) per
//! resource and table.

pub mod registry;
pub mod table_cache;

pub use registry::SchemaRegistry;
pub use table_cache::{CacheStats, CachedTableMeta, TableCache};
