//! Primary Key Resolver
//!
//! Given a parsed INSERT, the table snapshot and the statement that executed
//! it, produce the primary key values of every inserted row.
//!
//! ## Single-column key:
//! 1. Key column listed → take its values from the statement
//! 2. Other columns listed, key absent → database-generated values
//! 3. No column list → values mapped onto table columns in ordinal order
//!
//! ## Composite key:
//! 1. Take every listed key column from the statement
//! 2. The one missing auto-increment column (if any) → database-generated values
//!
//! A listed key column whose value is a sequence call, a function call or
//! NULL is decided by the database, so its values are read back as generated
//! keys instead of being taken from the statement text.

use super::generated::GeneratedKeyOptions;
use crate::dialect::Dialect;
use crate::driver::ExecutedStatement;
use crate::error::{GeneratedKeyError, PkResolveError, ResolutionError};
use crate::statement::{InsertStatement, InsertValue};
use branchkey_commons::{PkValueMap, SqlValue, TableMeta};
use std::sync::Arc;

/// Resolves the primary key values of executed INSERT statements
#[derive(Debug, Clone)]
pub struct PkResolver {
    dialect: Arc<dyn Dialect>,
    options: GeneratedKeyOptions,
}

impl PkResolver {
    pub fn new(dialect: Arc<dyn Dialect>, options: GeneratedKeyOptions) -> Self {
        Self { dialect, options }
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn options(&self) -> &GeneratedKeyOptions {
        &self.options
    }

    /// Resolve primary key values, one per inserted row in statement row order
    pub async fn resolve(
        &self,
        statement: &dyn InsertStatement,
        table_meta: &TableMeta,
        executed: &mut dyn ExecutedStatement,
    ) -> Result<PkValueMap, PkResolveError> {
        let pk_names = table_meta.primary_key_only_names();
        if pk_names.is_empty() {
            return Err(ResolutionError::NoPrimaryKey(table_meta.table_name().to_string()).into());
        }

        let mut resolution = Resolution {
            statement,
            table_meta,
            generated: GeneratedKeys {
                dialect: self.dialect.as_ref(),
                options: &self.options,
                executed,
                fetched: None,
            },
        };

        let pk_values = if pk_names.len() == 1 {
            resolution.single(&pk_names[0]).await?
        } else {
            resolution.composite(pk_names).await?
        };

        check_row_counts(&pk_values, statement.row_count())?;

        log::debug!(
            "[PkResolver] Resolved {} key column(s) x {} row(s) for {} (generated keys read: {})",
            pk_values.len(),
            statement.row_count(),
            table_meta.table_name(),
            resolution.generated.fetched.is_some()
        );
        Ok(pk_values)
    }
}

/// Generated-key retrieval, run at most once per resolution
struct GeneratedKeys<'a> {
    dialect: &'a dyn Dialect,
    options: &'a GeneratedKeyOptions,
    executed: &'a mut dyn ExecutedStatement,
    fetched: Option<PkValueMap>,
}

impl GeneratedKeys<'_> {
    async fn get(&mut self, table_meta: &TableMeta) -> Result<&PkValueMap, GeneratedKeyError> {
        let keys = match self.fetched.take() {
            Some(keys) => keys,
            None => {
                self.dialect
                    .fetch_generated_keys(table_meta, &mut *self.executed, self.options)
                    .await?
            }
        };
        Ok(self.fetched.insert(keys))
    }
}

struct Resolution<'a> {
    statement: &'a dyn InsertStatement,
    table_meta: &'a TableMeta,
    generated: GeneratedKeys<'a>,
}

impl Resolution<'_> {
    fn table(&self) -> String {
        self.table_meta.table_name().to_string()
    }

    async fn single(&mut self, pk: &str) -> Result<PkValueMap, PkResolveError> {
        let mut pk_values = PkValueMap::new();
        if self.statement.contains_column(pk) || !self.statement.contains_columns() {
            let values = self.extract(pk).await?;
            pk_values.insert_column(pk, values);
        } else {
            log::trace!(
                "[PkResolver] {} omits key column {}, reading generated keys",
                self.table_meta.table_name(),
                pk
            );
            let values = self.generated_values(pk).await?;
            pk_values.insert_column(pk, values);
        }
        Ok(pk_values)
    }

    async fn composite(&mut self, pk_names: &[String]) -> Result<PkValueMap, PkResolveError> {
        let (supplied, missing): (Vec<&String>, Vec<&String>) = pk_names
            .iter()
            .partition(|pk| self.value_position(pk).is_some());

        let (missing_auto, missing_plain): (Vec<&String>, Vec<&String>) =
            missing.into_iter().partition(|pk| {
                self.table_meta
                    .column_meta(pk)
                    .map(|c| c.is_autoincrement())
                    .unwrap_or(false)
            });

        if missing_auto.len() > 1 {
            return Err(ResolutionError::MultipleAutoIncrementColumns {
                table: self.table(),
                columns: missing_auto.into_iter().cloned().collect(),
            }
            .into());
        }
        if let Some(column) = missing_plain.first() {
            return Err(ResolutionError::MissingPrimaryKeyValue {
                table: self.table(),
                column: column.to_string(),
            }
            .into());
        }

        let mut pk_values = PkValueMap::new();
        for pk in supplied {
            let values = self.extract(pk).await?;
            pk_values.insert_column(pk.as_str(), values);
        }

        if let Some(pk) = missing_auto.first() {
            let mut generated = PkValueMap::new();
            generated.insert_column(pk.as_str(), self.generated_values(pk).await?);
            pk_values.merge(generated);
        }
        Ok(pk_values)
    }

    /// Index of `column` within each value row
    fn value_position(&self, column: &str) -> Option<usize> {
        if self.statement.contains_columns() {
            self.statement.column_index(column)
        } else {
            self.table_meta
                .columns_in_ordinal_order()
                .iter()
                .position(|c| c.column_name.eq_ignore_ascii_case(column))
        }
    }

    /// Values of `column` taken from the statement, or read back from the
    /// database when any row leaves the value to it
    async fn extract(&mut self, column: &str) -> Result<Vec<SqlValue>, PkResolveError> {
        let position = self
            .value_position(column)
            .ok_or_else(|| ResolutionError::PrimaryKeyIndexNotFound {
                table: self.table(),
                column: column.to_string(),
            })?;

        let mut values = Vec::with_capacity(self.statement.row_count());
        let mut database_decides = false;
        for row in self.statement.rows() {
            let expr = row
                .get(position)
                .ok_or_else(|| ResolutionError::PrimaryKeyIndexNotFound {
                    table: self.table(),
                    column: column.to_string(),
                })?;
            match expr {
                InsertValue::Null | InsertValue::Sequence(_) | InsertValue::Method(_) => {
                    database_decides = true;
                }
                InsertValue::Literal(value) if value.is_null() => database_decides = true,
                InsertValue::Literal(value) => values.push(value.clone()),
                InsertValue::Placeholder(index) => {
                    let value = self
                        .statement
                        .parameter(*index)
                        .ok_or(ResolutionError::UnboundParameter { index: *index })?;
                    if value.is_null() {
                        database_decides = true;
                    } else {
                        values.push(value.clone());
                    }
                }
            }
        }

        if database_decides {
            log::trace!(
                "[PkResolver] {}.{} is assigned by the database, reading generated keys",
                self.table_meta.table_name(),
                column
            );
            return self.generated_values(column).await;
        }
        Ok(values)
    }

    /// Generated values for `column`, which must be the auto-increment column
    async fn generated_values(&mut self, column: &str) -> Result<Vec<SqlValue>, PkResolveError> {
        let table = self.table();
        let keys = self.generated.get(self.table_meta).await?;
        if let Some((_, values)) = keys.iter().find(|(name, _)| name.eq_ignore_ascii_case(column)) {
            return Ok(values.to_vec());
        }
        let generated = keys.column_names().next().unwrap_or_default().to_string();
        Err(ResolutionError::GeneratedColumnMismatch {
            table,
            column: column.to_string(),
            generated,
        }
        .into())
    }
}

fn check_row_counts(pk_values: &PkValueMap, expected: usize) -> Result<(), ResolutionError> {
    for (column, values) in pk_values.iter() {
        if values.len() != expected {
            return Err(ResolutionError::RowCountMismatch {
                column: column.to_string(),
                expected,
                actual: values.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count_check() {
        let mut values = PkValueMap::new();
        values.insert_column("ID", vec![SqlValue::Int(1), SqlValue::Int(2)]);
        assert!(check_row_counts(&values, 2).is_ok());
        assert_eq!(
            check_row_counts(&values, 3),
            Err(ResolutionError::RowCountMismatch {
                column: "ID".to_string(),
                expected: 3,
                actual: 2,
            })
        );
    }
}
