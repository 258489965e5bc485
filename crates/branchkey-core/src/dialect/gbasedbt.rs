//! GBase 8s (gbasedbt)
//!
//! Informix lineage: unquoted identifiers are stored lower case in the system
//! catalogs, and the last SERIAL value of the session is reported by
//! `dbinfo('sqlca.sqlerrd1')`.

use super::catalog::{fetch_table_meta, required_str, CatalogRequest, IndexRow};
use super::identifiers::{normalize_part, split_qualified, CaseFold};
use super::Dialect;
use crate::driver::{DbConnection, Row};
use crate::error::SchemaFetchError;
use async_trait::async_trait;
use branchkey_commons::{CacheKey, ColumnMeta, DialectKind, IndexType, SqlValue, TableMeta};
use once_cell::sync::Lazy;

/// sysindexes stores up to 16 key parts in part1..part16
const MAX_INDEX_PARTS: usize = 16;

static INDEX_SQL: Lazy<String> = Lazy::new(|| {
    let part_match = (1..=MAX_INDEX_PARTS)
        .map(|n| format!("i.part{} = c.colno", n))
        .collect::<Vec<_>>()
        .join(" or ");
    let part_seq = (1..=MAX_INDEX_PARTS)
        .map(|n| format!("when i.part{n} then {n}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "select i.idxname, i.idxtype, c.colname, const.constrtype, \
         case c.colno {part_seq} end as part_seq \
         from sysindexes i, sysconstraints const, systables t, syscolumns c \
         where i.idxname = const.idxname and c.tabid = t.tabid and t.tabid = i.tabid \
         and t.tabname = ? and (? is null or t.owner = ?) \
         and ({part_match}) \
         order by i.idxname, part_seq"
    )
});

#[derive(Debug, Clone, Copy, Default)]
pub struct GBasedbtDialect;

impl GBasedbtDialect {
    fn normalize(ident: &str) -> String {
        normalize_part(ident, '"', CaseFold::Lower)
    }

    fn map_index_row(row: &Row) -> Option<IndexRow> {
        let index_name = required_str(row, "idxname")?;
        let column_name = required_str(row, "colname")?;
        let index_type = match row.get_str("constrtype") {
            Some("P") => IndexType::Primary,
            Some("U") => IndexType::Unique,
            _ => IndexType::Normal,
        };
        Some(IndexRow {
            index_name: index_name.to_string(),
            column_name: column_name.to_string(),
            index_type,
            non_unique: row.get_str("idxtype") != Some("U"),
        })
    }

    /// SERIAL columns are the auto-increment columns; not every driver flags them
    fn mark_serial(mut column: ColumnMeta) -> ColumnMeta {
        let type_name = column.data_type_name.to_ascii_uppercase();
        if matches!(type_name.as_str(), "SERIAL" | "SERIAL8" | "BIGSERIAL") {
            column.is_autoincrement = true;
        }
        column
    }
}

#[async_trait]
impl Dialect for GBasedbtDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::GBasedbt
    }

    /// The owner stays in the key when given: the fetch filters by it
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
        let catalog = conn.catalog().map(|c| Self::normalize(&c));

        let owner_param = SqlValue::from(owner.clone());
        let request = CatalogRequest {
            display_name: table_name,
            catalog: catalog.as_deref(),
            schema: owner.as_deref(),
            table: &table,
            index_sql: INDEX_SQL.as_str(),
            index_params: vec![SqlValue::Text(table.clone()), owner_param.clone(), owner_param],
        };
        fetch_table_meta(conn, request, Self::map_index_row, Self::mark_serial).await
    }

    fn generated_key_fallback_sql(&self) -> Option<&'static str> {
        Some("select dbinfo('sqlca.sqlerrd1') from dual")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_folds_unquoted() {
        let d = GBasedbtDialect;
        let expected = CacheKey::new("res", "orders");
        assert_eq!(d.cache_key("orders", "res"), expected);
        assert_eq!(d.cache_key("ORDERS", "res"), expected);
        assert_eq!(d.cache_key("\"orders\"", "res"), expected);
        assert_ne!(d.cache_key("\"Orders\"", "res"), expected);
    }

    #[test]
    fn test_cache_key_keeps_owner() {
        let d = GBasedbtDialect;
        assert_eq!(d.cache_key("Informix.Orders", "res"), CacheKey::new("res", "informix.orders"));
        assert_ne!(d.cache_key("alice.orders", "res"), d.cache_key("bob.orders", "res"));
        assert_ne!(d.cache_key("alice.orders", "res"), d.cache_key("orders", "res"));
    }

    #[test]
    fn test_index_sql_covers_all_parts() {
        assert!(INDEX_SQL.contains("i.part16 = c.colno"));
        assert!(INDEX_SQL.contains("when i.part1 then 1"));
        assert!(INDEX_SQL.contains("order by i.idxname, part_seq"));
    }

    #[test]
    fn test_serial_types_are_auto_increment() {
        let col = GBasedbtDialect::mark_serial(ColumnMeta::new("orders", "id", "serial", 1));
        assert!(col.is_autoincrement);
        let col = GBasedbtDialect::mark_serial(ColumnMeta::new("orders", "name", "varchar", 2));
        assert!(!col.is_autoincrement);
    }
}
