//! Oracle
//!
//! Unquoted identifiers fold to upper case. Identity values are only
//! reachable through the driver's generated keys; there is no session-scoped
//! "last identity" function to fall back on.

use super::catalog::{fetch_table_meta, keep_column, required_str, CatalogRequest, IndexRow};
use super::identifiers::{normalize_part, split_qualified, CaseFold};
use super::Dialect;
use crate::driver::{DbConnection, Row};
use crate::error::SchemaFetchError;
use async_trait::async_trait;
use branchkey_commons::{CacheKey, DialectKind, IndexType, SqlValue, TableMeta};

const INDEX_SQL: &str = "SELECT ai.INDEX_NAME, aic.COLUMN_NAME, ai.UNIQUENESS, ac.CONSTRAINT_TYPE \
     FROM ALL_INDEXES ai \
     JOIN ALL_IND_COLUMNS aic ON aic.INDEX_OWNER = ai.OWNER AND aic.INDEX_NAME = ai.INDEX_NAME \
     LEFT JOIN ALL_CONSTRAINTS ac ON ac.OWNER = ai.TABLE_OWNER AND ac.INDEX_NAME = ai.INDEX_NAME \
     AND ac.CONSTRAINT_TYPE IN ('P', 'U') \
     WHERE ai.TABLE_NAME = :1 AND ai.TABLE_OWNER = NVL(:2, USER) \
     ORDER BY ai.INDEX_NAME, aic.COLUMN_POSITION";

#[derive(Debug, Clone, Copy, Default)]
pub struct OracleDialect;

impl OracleDialect {
    fn normalize(ident: &str) -> String {
        normalize_part(ident, '"', CaseFold::Upper)
    }

    fn map_index_row(row: &Row) -> Option<IndexRow> {
        let index_name = required_str(row, "INDEX_NAME")?;
        let column_name = required_str(row, "COLUMN_NAME")?;
        let unique = row.get_str("UNIQUENESS") == Some("UNIQUE");
        let index_type = match row.get_str("CONSTRAINT_TYPE") {
            Some("P") => IndexType::Primary,
            Some("U") => IndexType::Unique,
            _ if unique => IndexType::Unique,
            _ => IndexType::Normal,
        };
        Some(IndexRow {
            index_name: index_name.to_string(),
            column_name: column_name.to_string(),
            index_type,
            non_unique: !unique,
        })
    }
}

#[async_trait]
impl Dialect for OracleDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Oracle
    }

    fn cache_key(&self, table_name: &str, resource_id: &str) -> CacheKey {
        let normalized = match split_qualified(table_name) {
            (Some(owner), table) => {
                format!("{}.{}", Self::normalize(owner), Self::normalize(table))
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
        let (owner, table) = split_qualified(table_name);
        let table = Self::normalize(table);
        let owner = owner.map(Self::normalize);

        let request = CatalogRequest {
            display_name: table_name,
            catalog: None,
            schema: owner.as_deref(),
            table: &table,
            index_sql: INDEX_SQL,
            index_params: vec![SqlValue::Text(table.clone()), SqlValue::from(owner.clone())],
        };
        fetch_table_meta(conn, request, Self::map_index_row, keep_column).await
    }

    fn generated_key_fallback_sql(&self) -> Option<&'static str> {
        None
    }
}
