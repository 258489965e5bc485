//! Database driver seam.
//!
//! The connection pool and the low-level driver wrapper live outside this
//! crate. They plug in by implementing [`DbConnection`] (catalog introspection
//! and read-only queries), [`ExecutedStatement`] (the statement that just ran
//! the INSERT) and [`RowCursor`] (a forward-only result set).

use crate::error::DriverError;
use async_trait::async_trait;
use branchkey_commons::{ColumnMeta, SqlValue};
use std::sync::Arc;

/// One row of a result set with its column labels
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    /// Value at a 0-based position
    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Value by column label (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|idx| self.values.get(idx))
    }

    /// Text value by column label; NULL and missing columns yield `None`.
    /// Catalogs pad CHAR columns, so the value is trimmed.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get_by_name(name)
            .and_then(SqlValue::as_str)
            .map(str::trim)
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }
}

/// Forward-only cursor over a result set
#[async_trait]
pub trait RowCursor: Send {
    /// Column labels reported by the result set metadata
    fn column_names(&self) -> &[String];

    fn column_count(&self) -> usize {
        self.column_names().len()
    }

    /// Advance to the next row, `None` once exhausted
    async fn next_row(&mut self) -> Result<Option<Row>, DriverError>;

    /// Move the cursor back before the first row.
    ///
    /// Forward-only drivers return a `DriverErrorKind::Unsupported` error.
    fn rewind(&mut self) -> Result<(), DriverError>;
}

/// A live connection used for catalog introspection and read-only queries
#[async_trait]
pub trait DbConnection: Send + Sync {
    /// Current catalog (database) name, if the driver reports one
    fn catalog(&self) -> Option<String>;

    /// Column catalog for a table (the driver's `getColumns` equivalent)
    async fn columns(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<ColumnMeta>, DriverError>;

    /// Run a read-only query with positional parameters
    async fn query(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Box<dyn RowCursor>, DriverError>;
}

/// The statement that just executed an INSERT
#[async_trait]
pub trait ExecutedStatement: Send {
    /// The driver's generated-keys result set
    async fn generated_keys(&mut self) -> Result<Box<dyn RowCursor>, DriverError>;

    /// Run a query on the same session as the executed statement.
    ///
    /// Used for the session-scoped "last inserted identity" fallback.
    async fn execute_query(&mut self, sql: &str) -> Result<Box<dyn RowCursor>, DriverError>;
}

/// In-memory result set.
///
/// Used by drivers that buffer results and by tests. Rewind support can be
/// switched off to mimic forward-only drivers.
#[derive(Debug, Clone)]
pub struct MemoryCursor {
    columns: Arc<[String]>,
    rows: Vec<Vec<SqlValue>>,
    position: usize,
    rewindable: bool,
}

impl MemoryCursor {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows,
            position: 0,
            rewindable: true,
        }
    }

    /// A result set with no columns and no rows
    pub fn empty() -> Self {
        Self::new(Vec::<String>::new(), Vec::new())
    }

    /// Single-column result set
    pub fn single_column(column: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self::new([column.into()], values.into_iter().map(|v| vec![v]).collect())
    }

    pub fn forward_only(mut self) -> Self {
        self.rewindable = false;
        self
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

#[async_trait]
impl RowCursor for MemoryCursor {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    async fn next_row(&mut self) -> Result<Option<Row>, DriverError> {
        let Some(values) = self.rows.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;
        Ok(Some(Row::new(Arc::clone(&self.columns), values.clone())))
    }

    fn rewind(&mut self) -> Result<(), DriverError> {
        if !self.rewindable {
            return Err(DriverError::unsupported(
                "Operation not supported for TYPE_FORWARD_ONLY result sets",
            ));
        }
        self.position = 0;
        Ok(())
    }
}

/// Drain every remaining row of a cursor
pub async fn collect_rows(cursor: &mut dyn RowCursor) -> Result<Vec<Row>, DriverError> {
    let mut rows = Vec::new();
    while let Some(row) = cursor.next_row().await? {
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_cursor_iterates_and_rewinds() {
        let mut cursor = MemoryCursor::single_column("id", vec![SqlValue::Int(1), SqlValue::Int(2)]);
        assert_eq!(cursor.column_count(), 1);

        let rows = collect_rows(&mut cursor).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get(0), Some(&SqlValue::Int(2)));
        assert!(cursor.next_row().await.unwrap().is_none());

        cursor.rewind().unwrap();
        assert_eq!(cursor.position(), 0);
    }

    #[tokio::test]
    async fn test_forward_only_cursor_rejects_rewind() {
        let mut cursor = MemoryCursor::empty().forward_only();
        assert_eq!(cursor.column_count(), 0);
        assert!(cursor.next_row().await.unwrap().is_none());
        let err = cursor.rewind().unwrap_err();
        assert_eq!(err.kind, crate::error::DriverErrorKind::Unsupported);
    }

    #[test]
    fn test_row_lookup_by_name_trims_char_padding() {
        let row = Row::new(
            Arc::from(vec!["idxname".to_string(), "constrtype".to_string()]),
            vec![SqlValue::Text("pk_orders  ".to_string()), SqlValue::Text("P".to_string())],
        );
        assert_eq!(row.get_str("IDXNAME"), Some("pk_orders"));
        assert_eq!(row.get_str("constrtype"), Some("P"));
        assert_eq!(row.get_str("missing"), None);
    }
}
