//! Shared schema-fetch routine.
//!
//! Every dialect reads columns through the driver's column catalog and index
//! participation through its own catalog query; only the SQL and the row
//! mapping differ.

use crate::driver::{DbConnection, Row};
use crate::error::SchemaFetchError;
use branchkey_commons::{ColumnMeta, IndexType, SqlValue, TableMeta, TableMetaBuilder};

/// One (index, column) participation row from an index catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub index_name: String,
    pub column_name: String,
    pub index_type: IndexType,
    pub non_unique: bool,
}

/// Where and how to look a table up
pub struct CatalogRequest<'a> {
    /// Table name as written in SQL, used in errors and logs
    pub display_name: &'a str,
    pub catalog: Option<&'a str>,
    pub schema: Option<&'a str>,
    /// Table name in catalog form (quotes stripped, case folded)
    pub table: &'a str,
    pub index_sql: &'a str,
    pub index_params: Vec<SqlValue>,
}

/// Fetch columns and indexes and build the table snapshot.
///
/// `map_index_row` returns `None` for rows to skip (e.g. expression index
/// parts without a column name). `adjust_column` lets a dialect derive flags
/// the driver does not report, such as auto-increment from a type name.
pub async fn fetch_table_meta(
    conn: &dyn DbConnection,
    request: CatalogRequest<'_>,
    map_index_row: fn(&Row) -> Option<IndexRow>,
    adjust_column: fn(ColumnMeta) -> ColumnMeta,
) -> Result<TableMeta, SchemaFetchError> {
    let mut builder = TableMetaBuilder::new(request.display_name);

    let columns = conn
        .columns(request.catalog, request.schema, request.table)
        .await
        .map_err(|e| SchemaFetchError::driver(request.display_name, e))?;
    for column in columns {
        builder.add_column(adjust_column(column));
    }

    let mut cursor = conn
        .query(request.index_sql, &request.index_params)
        .await
        .map_err(|e| SchemaFetchError::driver(request.display_name, e))?;

    let mut index_rows = 0usize;
    while let Some(row) = cursor
        .next_row()
        .await
        .map_err(|e| SchemaFetchError::driver(request.display_name, e))?
    {
        let Some(index_row) = map_index_row(&row) else {
            continue;
        };
        if !builder.has_column(&index_row.column_name) {
            log::debug!(
                "[SchemaFetch] Index {} of {} references column {} missing from the column catalog",
                index_row.index_name,
                request.display_name,
                index_row.column_name
            );
        }
        builder.add_index_column(
            &index_row.index_name,
            &index_row.column_name,
            index_row.index_type,
            index_row.non_unique,
        );
        index_rows += 1;
    }

    log::trace!(
        "[SchemaFetch] Read {} index rows for {} (catalog={:?}, schema={:?})",
        index_rows,
        request.display_name,
        request.catalog,
        request.schema
    );

    Ok(builder.build()?)
}

/// Leave the column untouched
pub fn keep_column(column: ColumnMeta) -> ColumnMeta {
    column
}

/// Text value of a required catalog column, skipping NULL / empty
pub(crate) fn required_str<'r>(row: &'r Row, name: &str) -> Option<&'r str> {
    row.get_str(name).filter(|s| !s.is_empty())
}
