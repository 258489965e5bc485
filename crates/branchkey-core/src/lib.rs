// branchkey Core Library
//
// This crate provides primary-key resolution for INSERT statements executed
// inside a distributed-transaction branch, the per-resource table schema
// registry it reads from, and the per-database dialects both depend on.

pub mod dialect;
pub mod driver;
pub mod error;
pub mod keywords;
pub mod pk;
pub mod schema_registry;
pub mod statement;
pub mod test_helpers;

pub use dialect::{dialect_for, Dialect};
pub use driver::{DbConnection, ExecutedStatement, MemoryCursor, Row, RowCursor};
pub use error::{
    DriverError, DriverErrorKind, GeneratedKeyError, PkResolveError, ResolutionError,
    SchemaFetchError,
};
pub use keywords::{keyword_checker, KeywordChecker};
pub use pk::{GeneratedKeyOptions, PkResolver};
pub use schema_registry::{CacheStats, SchemaRegistry};
pub use statement::{InsertStatement, InsertValue, SequenceExpr};
