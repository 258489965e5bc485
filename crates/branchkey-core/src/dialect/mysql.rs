//! MySQL
//!
//! Backticks are never significant for identity. Table name case is kept as
//! written: with `lower_case_table_names=0` (the Linux default) `Orders` and
//! `orders` are two tables, and the catalog is queried with the same spelling.

use super::catalog::{fetch_table_meta, keep_column, required_str, CatalogRequest, IndexRow};
use super::identifiers::split_qualified;
use super::Dialect;
use crate::driver::{DbConnection, Row};
use crate::error::SchemaFetchError;
use async_trait::async_trait;
use branchkey_commons::{CacheKey, DialectKind, IndexType, SqlValue, TableMeta};

const INDEX_SQL: &str = "SELECT s.INDEX_NAME, s.COLUMN_NAME, s.NON_UNIQUE \
     FROM information_schema.STATISTICS s \
     WHERE s.TABLE_SCHEMA = COALESCE(?, DATABASE()) AND s.TABLE_NAME = ? \
     ORDER BY s.INDEX_NAME, s.SEQ_IN_INDEX";

#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    fn strip(ident: &str) -> String {
        ident.trim().replace('`', "")
    }

    fn map_index_row(row: &Row) -> Option<IndexRow> {
        let index_name = required_str(row, "INDEX_NAME")?;
        let column_name = required_str(row, "COLUMN_NAME")?;
        let non_unique = row
            .get_by_name("NON_UNIQUE")
            .and_then(SqlValue::as_bool)
            .unwrap_or(true);
        let index_type = if index_name.eq_ignore_ascii_case("PRIMARY") {
            IndexType::Primary
        } else if !non_unique {
            IndexType::Unique
        } else {
            IndexType::Normal
        };
        Some(IndexRow {
            index_name: index_name.to_string(),
            column_name: column_name.to_string(),
            index_type,
            non_unique,
        })
    }
}

#[async_trait]
impl Dialect for MySqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::MySql
    }

    fn cache_key(&self, table_name: &str, resource_id: &str) -> CacheKey {
        CacheKey::new(resource_id, Self::strip(table_name))
    }

    async fn fetch_schema(
        &self,
        conn: &dyn DbConnection,
        table_name: &str,
    ) -> Result<TableMeta, SchemaFetchError> {
        let (database, table) = split_qualified(table_name);
        let table = Self::strip(table);
        let database = database.map(Self::strip).or_else(|| conn.catalog());

        let request = CatalogRequest {
            display_name: table_name,
            catalog: database.as_deref(),
            schema: None,
            table: &table,
            index_sql: INDEX_SQL,
            index_params: vec![SqlValue::from(database.clone()), SqlValue::Text(table.clone())],
        };
        fetch_table_meta(conn, request, Self::map_index_row, keep_column).await
    }

    fn generated_key_fallback_sql(&self) -> Option<&'static str> {
        Some("SELECT LAST_INSERT_ID()")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_ignores_backticks_and_keeps_case() {
        let d = MySqlDialect;
        assert_eq!(d.cache_key("`orders`", "res"), CacheKey::new("res", "orders"));
        assert_eq!(d.cache_key("`Orders`", "res"), CacheKey::new("res", "Orders"));
        assert_ne!(d.cache_key("Orders", "res"), d.cache_key("orders", "res"));
        assert_eq!(d.cache_key("`shop`.`orders`", "res"), CacheKey::new("res", "shop.orders"));
    }
}
