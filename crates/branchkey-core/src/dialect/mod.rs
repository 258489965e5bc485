//! Per-database capabilities.
//!
//! Each supported database implements [`Dialect`]: how a table name becomes a
//! cache key, how the schema is read from its catalogs, and which
//! session-scoped query reports the last generated identity. The dialect is
//! chosen once at startup from configuration via [`dialect_for`].

pub mod catalog;
pub mod gbasedbt;
pub mod identifiers;
pub mod mysql;
pub mod oracle;
pub mod postgresql;

pub use gbasedbt::GBasedbtDialect;
pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgresql::PostgreSqlDialect;

use crate::driver::{DbConnection, ExecutedStatement};
use crate::error::{GeneratedKeyError, SchemaFetchError};
use crate::keywords::{keyword_checker, KeywordChecker};
use crate::pk::generated::{fetch_auto_keys, GeneratedKeyOptions};
use async_trait::async_trait;
use branchkey_commons::{CacheKey, DialectKind, PkValueMap, TableMeta};
use std::fmt;
use std::sync::Arc;

/// Database-specific behaviour used by the schema registry and the PK resolver
#[async_trait]
pub trait Dialect: Send + Sync + fmt::Debug {
    fn kind(&self) -> DialectKind;

    /// Normalize `table_name` as written in SQL into a cache identity.
    ///
    /// Every spelling of one physical table (quoted or not, any case the
    /// database folds) must produce the same key.
    fn cache_key(&self, table_name: &str, resource_id: &str) -> CacheKey;

    /// Read columns and indexes of `table_name` from the database catalogs
    async fn fetch_schema(
        &self,
        conn: &dyn DbConnection,
        table_name: &str,
    ) -> Result<TableMeta, SchemaFetchError>;

    /// Session-scoped query reporting the last generated identity, if the
    /// database has one
    fn generated_key_fallback_sql(&self) -> Option<&'static str>;

    /// Read database-generated values of the auto-increment key column
    async fn fetch_generated_keys(
        &self,
        table_meta: &TableMeta,
        executed: &mut dyn ExecutedStatement,
        options: &GeneratedKeyOptions,
    ) -> Result<PkValueMap, GeneratedKeyError> {
        fetch_auto_keys(self.generated_key_fallback_sql(), table_meta, executed, options).await
    }

    fn keyword_checker(&self) -> &'static KeywordChecker {
        keyword_checker(self.kind())
    }
}

/// Resolve the dialect implementation for a configured kind
pub fn dialect_for(kind: DialectKind) -> Arc<dyn Dialect> {
    match kind {
        DialectKind::GBasedbt => Arc::new(GBasedbtDialect),
        DialectKind::Oracle => Arc::new(OracleDialect),
        DialectKind::MySql => Arc::new(MySqlDialect),
        DialectKind::PostgreSql => Arc::new(PostgreSqlDialect),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_returns_matching_kind() {
        for kind in DialectKind::all() {
            assert_eq!(dialect_for(*kind).kind(), *kind);
        }
    }

    #[test]
    fn test_fallback_queries() {
        assert_eq!(
            dialect_for(DialectKind::GBasedbt).generated_key_fallback_sql(),
            Some("select dbinfo('sqlca.sqlerrd1') from dual")
        );
        assert_eq!(
            dialect_for(DialectKind::MySql).generated_key_fallback_sql(),
            Some("SELECT LAST_INSERT_ID()")
        );
        assert_eq!(
            dialect_for(DialectKind::PostgreSql).generated_key_fallback_sql(),
            Some("SELECT lastval()")
        );
        assert_eq!(dialect_for(DialectKind::Oracle).generated_key_fallback_sql(), None);
    }
}
