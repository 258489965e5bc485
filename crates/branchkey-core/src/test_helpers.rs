//! Test helpers shared by unit tests and the integration tests of dependent crates.
//!
//! - [`MockConnection`]: catalog answers in GBase 8s shape, call counters, optional latency
//! - [`MockExecutedStatement`]: scripted generated-keys and fallback cursors
//! - [`ParsedInsert`]: an already-parsed INSERT
//! - `ORDERS` / `LINE_ITEM` table fixtures

use crate::driver::{DbConnection, ExecutedStatement, MemoryCursor, RowCursor};
use crate::error::DriverError;
use crate::statement::{InsertStatement, InsertValue, SequenceExpr};
use async_trait::async_trait;
use branchkey_commons::{ColumnMeta, IndexType, SqlValue, TableMeta, TableMetaBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ===== Table fixtures =====

fn orders_columns() -> Vec<ColumnMeta> {
    vec![
        ColumnMeta::new("ORDERS", "ID", "SERIAL", 1).with_autoincrement(true),
        ColumnMeta::new("ORDERS", "NAME", "VARCHAR", 2).with_size(64, 0),
        ColumnMeta::new("ORDERS", "AMOUNT", "DECIMAL", 3).with_size(12, 2),
    ]
}

fn line_item_columns() -> Vec<ColumnMeta> {
    vec![
        ColumnMeta::new("LINE_ITEM", "ORDER_ID", "INTEGER", 1),
        ColumnMeta::new("LINE_ITEM", "SEQ", "SERIAL", 2).with_autoincrement(true),
        ColumnMeta::new("LINE_ITEM", "SKU", "VARCHAR", 3).with_size(32, 0),
    ]
}

/// `ORDERS(ID serial PRIMARY KEY, NAME, AMOUNT)`
pub fn orders_table() -> TableMeta {
    let mut builder = TableMetaBuilder::new("ORDERS");
    for column in orders_columns() {
        builder.add_column(column);
    }
    builder.add_index_column("PK_ORDERS", "ID", IndexType::Primary, false);
    builder.build().expect("ORDERS fixture is valid")
}

/// `LINE_ITEM(ORDER_ID, SEQ serial, SKU, PRIMARY KEY (ORDER_ID, SEQ))`
pub fn line_item_table() -> TableMeta {
    let mut builder = TableMetaBuilder::new("LINE_ITEM");
    for column in line_item_columns() {
        builder.add_column(column);
    }
    builder
        .add_index_column("PK_LINE_ITEM", "ORDER_ID", IndexType::Primary, false)
        .add_index_column("PK_LINE_ITEM", "SEQ", IndexType::Primary, false)
        .add_index_column("IDX_LINE_ITEM_SKU", "SKU", IndexType::Normal, true);
    builder.build().expect("LINE_ITEM fixture is valid")
}

// ===== Statement values =====

pub fn int(v: i64) -> InsertValue {
    InsertValue::Literal(SqlValue::Int(v))
}

pub fn text(v: &str) -> InsertValue {
    InsertValue::Literal(SqlValue::Text(v.to_string()))
}

pub fn nextval(sequence: &str) -> InsertValue {
    InsertValue::Sequence(SequenceExpr::nextval(sequence))
}

// ===== MockConnection =====

const GBASE_INDEX_COLUMNS: [&str; 5] = ["idxname", "idxtype", "colname", "constrtype", "part_seq"];

/// Connection answering catalog queries from fixed data
#[derive(Debug)]
pub struct MockConnection {
    catalog: Option<String>,
    columns: Vec<ColumnMeta>,
    index_columns: Vec<String>,
    index_rows: Vec<Vec<SqlValue>>,
    columns_error: Option<DriverError>,
    delay: Option<Duration>,
    columns_calls: AtomicUsize,
    query_calls: AtomicUsize,
    last_query: Mutex<Option<(String, Vec<SqlValue>)>>,
}

impl MockConnection {
    pub fn new(columns: Vec<ColumnMeta>) -> Self {
        Self {
            catalog: None,
            columns,
            index_columns: GBASE_INDEX_COLUMNS.iter().map(|c| c.to_string()).collect(),
            index_rows: Vec::new(),
            columns_error: None,
            delay: None,
            columns_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    /// Catalog data for `ORDERS`
    pub fn orders() -> Self {
        Self::new(orders_columns()).with_gbase_index("pk_orders", "ID", "P", "U")
    }

    /// Catalog data for `LINE_ITEM`
    pub fn line_item() -> Self {
        Self::new(line_item_columns())
            .with_gbase_index("pk_line_item", "ORDER_ID", "P", "U")
            .with_gbase_index("pk_line_item", "SEQ", "P", "U")
            .with_gbase_index("idx_line_item_sku", "SKU", "N", "D")
    }

    /// Add a GBase 8s index catalog row
    pub fn with_gbase_index(mut self, index: &str, column: &str, constrtype: &str, idxtype: &str) -> Self {
        let part_seq = self
            .index_rows
            .iter()
            .filter(|row| row.first() == Some(&SqlValue::Text(index.to_string())))
            .count() as i64
            + 1;
        self.index_rows.push(vec![
            SqlValue::from(index),
            SqlValue::from(idxtype),
            SqlValue::from(column),
            SqlValue::from(constrtype),
            SqlValue::Int(part_seq),
        ]);
        self
    }

    /// Replace the index catalog answer with arbitrary labelled rows
    pub fn with_index_rows(mut self, columns: &[&str], rows: Vec<Vec<SqlValue>>) -> Self {
        self.index_columns = columns.iter().map(|c| c.to_string()).collect();
        self.index_rows = rows;
        self
    }

    pub fn with_catalog(mut self, catalog: &str) -> Self {
        self.catalog = Some(catalog.to_string());
        self
    }

    /// Sleep before answering the column catalog
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_columns_error(mut self, error: DriverError) -> Self {
        self.columns_error = Some(error);
        self
    }

    pub fn columns_calls(&self) -> usize {
        self.columns_calls.load(Ordering::SeqCst)
    }

    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    /// SQL and parameters of the last index query
    pub fn last_query(&self) -> Option<(String, Vec<SqlValue>)> {
        self.last_query.lock().expect("last_query lock").clone()
    }
}

#[async_trait]
impl DbConnection for MockConnection {
    fn catalog(&self) -> Option<String> {
        self.catalog.clone()
    }

    async fn columns(
        &self,
        _catalog: Option<&str>,
        _schema: Option<&str>,
        _table: &str,
    ) -> Result<Vec<ColumnMeta>, DriverError> {
        self.columns_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.columns_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.columns.clone()),
        }
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Box<dyn RowCursor>, DriverError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().expect("last_query lock") = Some((sql.to_string(), params.to_vec()));
        Ok(Box::new(MemoryCursor::new(
            self.index_columns.clone(),
            self.index_rows.clone(),
        )))
    }
}

// ===== MockExecutedStatement =====

/// Executed statement with scripted key cursors
#[derive(Debug)]
pub struct MockExecutedStatement {
    generated: Result<MemoryCursor, DriverError>,
    fallback: Result<MemoryCursor, DriverError>,
    generated_calls: usize,
    fallback_calls: usize,
    last_fallback_sql: Option<String>,
}

impl MockExecutedStatement {
    fn with_generated(generated: Result<MemoryCursor, DriverError>) -> Self {
        Self {
            generated,
            fallback: Err(DriverError::new("no fallback result scripted")),
            generated_calls: 0,
            fallback_calls: 0,
            last_fallback_sql: None,
        }
    }

    /// The driver reports `values` as generated keys
    pub fn with_generated_keys(values: Vec<SqlValue>) -> Self {
        Self::with_generated(Ok(MemoryCursor::single_column("GENERATED_KEY", values)))
    }

    /// The driver fails to produce generated keys
    pub fn with_generated_keys_error(error: DriverError) -> Self {
        Self::with_generated(Err(error))
    }

    /// The driver returns a generated-keys result set with zero columns
    pub fn zero_columns() -> Self {
        Self::with_generated(Ok(MemoryCursor::empty()))
    }

    /// The fallback query returns `values`
    pub fn with_fallback_values(mut self, values: Vec<SqlValue>) -> Self {
        self.fallback = Ok(MemoryCursor::single_column("LAST_ID", values));
        self
    }

    pub fn with_fallback_error(mut self, error: DriverError) -> Self {
        self.fallback = Err(error);
        self
    }

    /// Cursors reject rewind, like TYPE_FORWARD_ONLY result sets
    pub fn forward_only(mut self) -> Self {
        self.generated = self.generated.map(MemoryCursor::forward_only);
        self.fallback = self.fallback.map(MemoryCursor::forward_only);
        self
    }

    pub fn generated_calls(&self) -> usize {
        self.generated_calls
    }

    pub fn fallback_calls(&self) -> usize {
        self.fallback_calls
    }

    pub fn last_fallback_sql(&self) -> Option<&str> {
        self.last_fallback_sql.as_deref()
    }
}

#[async_trait]
impl ExecutedStatement for MockExecutedStatement {
    async fn generated_keys(&mut self) -> Result<Box<dyn RowCursor>, DriverError> {
        self.generated_calls += 1;
        self.generated
            .clone()
            .map(|cursor| Box::new(cursor) as Box<dyn RowCursor>)
    }

    async fn execute_query(&mut self, sql: &str) -> Result<Box<dyn RowCursor>, DriverError> {
        self.fallback_calls += 1;
        self.last_fallback_sql = Some(sql.to_string());
        self.fallback
            .clone()
            .map(|cursor| Box::new(cursor) as Box<dyn RowCursor>)
    }
}

// ===== ParsedInsert =====

/// INSERT facts as a SQL recognizer would report them
#[derive(Debug, Clone, Default)]
pub struct ParsedInsert {
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<InsertValue>>,
    params: Vec<SqlValue>,
}

impl ParsedInsert {
    /// `INSERT INTO table (columns...)`; pass no columns for `INSERT INTO table VALUES`
    pub fn new(table: &str, columns: &[&str]) -> Self {
        Self {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn row(mut self, values: Vec<InsertValue>) -> Self {
        self.rows.push(values);
        self
    }

    pub fn with_params(mut self, params: Vec<SqlValue>) -> Self {
        self.params = params;
        self
    }
}

impl InsertStatement for ParsedInsert {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn insert_columns(&self) -> &[String] {
        &self.columns
    }

    fn rows(&self) -> &[Vec<InsertValue>] {
        &self.rows
    }

    fn parameter(&self, index: usize) -> Option<&SqlValue> {
        self.params.get(index)
    }
}
