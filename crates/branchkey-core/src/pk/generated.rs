//! Generated Key Retrieval
//!
//! Reads the values a database assigned to the auto-increment key column of a
//! just-executed INSERT.
//!
//! ## Flow:
//! 1. Find the auto-increment column among the primary key columns
//! 2. Ask the executed statement for the driver's generated-keys cursor
//! 3. On driver error, or a cursor reporting zero columns, run the dialect's
//!    session-scoped fallback query on the same session
//! 4. Drain column 1 of every row, in cursor order
//! 5. Try to rewind the cursor for later readers; failure is only logged

use crate::driver::{ExecutedStatement, RowCursor};
use crate::error::{DriverError, GeneratedKeyError};
use branchkey_commons::{PkValueMap, SqlValue, TableMeta};
use std::time::Duration;

/// Tuning for generated-key retrieval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedKeyOptions {
    /// Allow the dialect fallback query when the driver path is unusable
    pub fallback_enabled: bool,
    /// Upper bound on the whole retrieval (driver path plus fallback)
    pub timeout: Option<Duration>,
}

impl Default for GeneratedKeyOptions {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
            timeout: None,
        }
    }
}

/// Read generated values of the table's auto-increment primary key column.
///
/// The returned map has exactly one column: the auto-increment PK column,
/// named as in the primary key.
pub async fn fetch_auto_keys(
    fallback_sql: Option<&'static str>,
    table_meta: &TableMeta,
    executed: &mut dyn ExecutedStatement,
    options: &GeneratedKeyOptions,
) -> Result<PkValueMap, GeneratedKeyError> {
    let retrieval = retrieve(fallback_sql, table_meta, executed, options);
    match options.timeout {
        Some(after) => tokio::time::timeout(after, retrieval)
            .await
            .map_err(|_| GeneratedKeyError::Timeout {
                table: table_meta.table_name().to_string(),
                after,
            })?,
        None => retrieval.await,
    }
}

/// Primary key column name flagged auto-increment
pub fn auto_increment_column(table_meta: &TableMeta) -> Result<&str, GeneratedKeyError> {
    table_meta
        .primary_key_only_names()
        .iter()
        .find(|name| {
            table_meta
                .column_meta(name)
                .map(|c| c.is_autoincrement())
                .unwrap_or(false)
        })
        .map(String::as_str)
        .ok_or_else(|| GeneratedKeyError::NoAutoIncrementColumn(table_meta.table_name().to_string()))
}

async fn retrieve(
    fallback_sql: Option<&'static str>,
    table_meta: &TableMeta,
    executed: &mut dyn ExecutedStatement,
    options: &GeneratedKeyOptions,
) -> Result<PkValueMap, GeneratedKeyError> {
    let table = table_meta.table_name();
    let auto_column = auto_increment_column(table_meta)?;

    let mut cursor = match executed.generated_keys().await {
        Ok(cursor) if cursor.column_count() > 0 => cursor,
        Ok(_) => {
            let primary = "generated keys result set has no columns".to_string();
            open_fallback(fallback_sql, table, primary, executed, options).await?
        }
        Err(e) => open_fallback(fallback_sql, table, e.to_string(), executed, options).await?,
    };

    let values = drain_first_column(cursor.as_mut(), table).await?;

    if let Err(e) = cursor.rewind() {
        log::warn!(
            "[GeneratedKeys] Failed to rewind generated keys cursor of {}: {}",
            table,
            e
        );
    }

    log::debug!(
        "[GeneratedKeys] {} generated value(s) for {}.{}",
        values.len(),
        table,
        auto_column
    );

    let mut pk_values = PkValueMap::new();
    pk_values.insert_column(auto_column, values);
    Ok(pk_values)
}

async fn open_fallback(
    fallback_sql: Option<&'static str>,
    table: &str,
    primary: String,
    executed: &mut dyn ExecutedStatement,
    options: &GeneratedKeyOptions,
) -> Result<Box<dyn RowCursor>, GeneratedKeyError> {
    let sql = match fallback_sql {
        Some(sql) if options.fallback_enabled => sql,
        _ => {
            return Err(GeneratedKeyError::NoFallback {
                table: table.to_string(),
                primary,
            })
        }
    };

    log::debug!(
        "[GeneratedKeys] Driver path unusable for {} ({}), running fallback: {}",
        table,
        primary,
        sql
    );

    executed
        .execute_query(sql)
        .await
        .map_err(|fallback| GeneratedKeyError::Retrieval {
            table: table.to_string(),
            primary,
            fallback,
        })
}

async fn drain_first_column(
    cursor: &mut dyn RowCursor,
    table: &str,
) -> Result<Vec<SqlValue>, GeneratedKeyError> {
    let cursor_error = |source: DriverError| GeneratedKeyError::Cursor {
        table: table.to_string(),
        source,
    };

    let mut values = Vec::new();
    while let Some(row) = cursor.next_row().await.map_err(cursor_error)? {
        match row.into_values().into_iter().next() {
            Some(value) => values.push(value),
            None => {
                return Err(cursor_error(DriverError::new(
                    "generated key row has no columns",
                )))
            }
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{orders_table, MockExecutedStatement};

    #[tokio::test]
    async fn test_driver_keys_are_used_when_available() {
        let table = orders_table();
        let mut executed = MockExecutedStatement::with_generated_keys(vec![SqlValue::Int(7)]);

        let keys = fetch_auto_keys(Some("SELECT 1"), &table, &mut executed, &Default::default())
            .await
            .unwrap();

        assert_eq!(keys.get("ID"), Some(&[SqlValue::Int(7)][..]));
        assert_eq!(executed.fallback_calls(), 0);
    }

    #[tokio::test]
    async fn test_forward_only_cursor_still_returns_values() {
        let table = orders_table();
        let mut executed =
            MockExecutedStatement::with_generated_keys(vec![SqlValue::Int(1), SqlValue::Int(2)])
                .forward_only();

        let keys = fetch_auto_keys(None, &table, &mut executed, &Default::default())
            .await
            .unwrap();

        assert_eq!(keys.get("ID"), Some(&[SqlValue::Int(1), SqlValue::Int(2)][..]));
    }

    #[tokio::test]
    async fn test_driver_error_without_fallback() {
        let table = orders_table();
        let mut executed =
            MockExecutedStatement::with_generated_keys_error(DriverError::new("not supported"));

        let err = fetch_auto_keys(None, &table, &mut executed, &Default::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GeneratedKeyError::NoFallback { .. }));
    }

    #[tokio::test]
    async fn test_disabled_fallback_is_not_run() {
        let table = orders_table();
        let mut executed =
            MockExecutedStatement::zero_columns().with_fallback_values(vec![SqlValue::Int(3)]);
        let options = GeneratedKeyOptions {
            fallback_enabled: false,
            timeout: None,
        };

        let err = fetch_auto_keys(Some("SELECT 1"), &table, &mut executed, &options)
            .await
            .unwrap_err();

        assert!(matches!(err, GeneratedKeyError::NoFallback { .. }));
        assert_eq!(executed.fallback_calls(), 0);
    }

    struct StalledStatement;

    #[async_trait::async_trait]
    impl ExecutedStatement for StalledStatement {
        async fn generated_keys(&mut self) -> Result<Box<dyn RowCursor>, DriverError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Box::new(crate::driver::MemoryCursor::empty()))
        }

        async fn execute_query(&mut self, _sql: &str) -> Result<Box<dyn RowCursor>, DriverError> {
            Ok(Box::new(crate::driver::MemoryCursor::empty()))
        }
    }

    #[tokio::test]
    async fn test_stalled_driver_times_out() {
        let after = Duration::from_millis(20);
        let options = GeneratedKeyOptions {
            fallback_enabled: true,
            timeout: Some(after),
        };

        let err = fetch_auto_keys(None, &orders_table(), &mut StalledStatement, &options)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GeneratedKeyError::Timeout {
                table: "ORDERS".to_string(),
                after,
            }
        );
    }
}
