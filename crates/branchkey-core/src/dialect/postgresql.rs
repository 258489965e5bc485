//! PostgreSQL
//!
//! Unquoted identifiers fold to lower case. serial/identity columns show up
//! with a `nextval(...)` default, and `lastval()` reports the last value
//! produced by a sequence in the session.

use super::catalog::{fetch_table_meta, required_str, CatalogRequest, IndexRow};
use super::identifiers::{normalize_part, split_qualified, CaseFold};
use super::Dialect;
use crate::driver::{DbConnection, Row};
use crate::error::SchemaFetchError;
use async_trait::async_trait;
use branchkey_commons::{CacheKey, ColumnMeta, DialectKind, IndexType, SqlValue, TableMeta};

const INDEX_SQL: &str = "SELECT i.relname AS index_name, a.attname AS column_name, \
     ix.indisprimary AS is_primary, ix.indisunique AS is_unique \
     FROM pg_index ix \
     JOIN pg_class t ON t.oid = ix.indrelid \
     JOIN pg_class i ON i.oid = ix.indexrelid \
     JOIN pg_namespace n ON n.oid = t.relnamespace \
     JOIN LATERAL unnest(ix.indkey) WITH ORDINALITY AS k(attnum, ord) ON true \
     JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum \
     WHERE t.relname = $1 AND n.nspname = COALESCE($2, current_schema()) \
     ORDER BY i.relname, k.ord";

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgreSqlDialect;

impl PostgreSqlDialect {
    fn normalize(ident: &str) -> String {
        normalize_part(ident, '"', CaseFold::Lower)
    }

    fn map_index_row(row: &Row) -> Option<IndexRow> {
        let index_name = required_str(row, "index_name")?;
        let column_name = required_str(row, "column_name")?;
        let flag = |name: &str| row.get_by_name(name).and_then(SqlValue::as_bool).unwrap_or(false);
        let (primary, unique) = (flag("is_primary"), flag("is_unique"));
        let index_type = if primary {
            IndexType::Primary
        } else if unique {
            IndexType::Unique
        } else {
            IndexType::Normal
        };
        Some(IndexRow {
            index_name: index_name.to_string(),
            column_name: column_name.to_string(),
            index_type,
            non_unique: !unique,
        })
    }

    fn mark_sequence_default(mut column: ColumnMeta) -> ColumnMeta {
        let from_sequence = column
            .column_def
            .as_deref()
            .map(|d| d.trim_start().to_ascii_lowercase().starts_with("nextval("))
            .unwrap_or(false);
        if from_sequence {
            column.is_autoincrement = true;
        }
        column
    }
}

#[async_trait]
impl Dialect for PostgreSqlDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::PostgreSql
    }

    fn cache_key(&self, table_name: &str, resource_id: &str) -> CacheKey {
        let normalized = match split_qualified(table_name) {
            (Some(schema), table) => {
                format!("{}.{}", Self::normalize(schema), Self::normalize(table))
            }
            (None, table) => Self::normalize(table),
        };
        CacheKey::new(resource_id, normalized)
    }

    async fn fetch_schema(
        &self,
        conn: &dyn DbConnection,
        table_name: &str,
    ) -> Result<TableMeta, SchemaFetchError> {
        let (schema, table) = split_qualified(table_name);
        let table = Self::normalize(table);
        let schema = schema.map(Self::normalize);

        let request = CatalogRequest {
            display_name: table_name,
            catalog: None,
            schema: schema.as_deref(),
            table: &table,
            index_sql: INDEX_SQL,
            index_params: vec![SqlValue::Text(table.clone()), SqlValue::from(schema.clone())],
        };
        fetch_table_meta(conn, request, Self::map_index_row, Self::mark_sequence_default).await
    }

    fn generated_key_fallback_sql(&self) -> Option<&'static str> {
        Some("SELECT lastval()")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_folds_each_part() {
        let d = PostgreSqlDialect;
        assert_eq!(d.cache_key("Orders", "res"), CacheKey::new("res", "orders"));
        assert_eq!(d.cache_key("\"orders\"", "res"), CacheKey::new("res", "orders"));
        assert_eq!(d.cache_key("\"Orders\"", "res"), CacheKey::new("res", "Orders"));
        assert_eq!(
            d.cache_key("Shop.\"Orders\"", "res"),
            CacheKey::new("res", "shop.Orders")
        );
    }

    #[test]
    fn test_nextval_default_marks_auto_increment() {
        let col = ColumnMeta::new("orders", "id", "int8", 1)
            .with_default("nextval('orders_id_seq'::regclass)");
        assert!(PostgreSqlDialect::mark_sequence_default(col).is_autoincrement);
    }
}
