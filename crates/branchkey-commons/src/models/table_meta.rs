//! Table schema snapshot

use super::column_meta::ColumnMeta;
use super::index_meta::{IndexMeta, IndexType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Error returned when a table snapshot fails its structural invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableMetaError {
    /// The column catalog returned nothing for the table
    NoColumns { table: String },
    /// No index at all was discovered
    NoIndex { table: String },
    /// More than one index classified as PRIMARY
    MultiplePrimaryKeys { table: String, indexes: Vec<String> },
    /// The primary index references a column absent from the column catalog
    UnknownPrimaryKeyColumn { table: String, column: String },
}

impl fmt::Display for TableMetaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableMetaError::NoColumns { table } => {
                write!(f, "No columns found for table: {}", table)
            }
            TableMetaError::NoIndex { table } => {
                write!(f, "Could not find any index in the table: {}", table)
            }
            TableMetaError::MultiplePrimaryKeys { table, indexes } => write!(
                f,
                "Table {} reports more than one primary index: {}",
                table,
                indexes.join(", ")
            ),
            TableMetaError::UnknownPrimaryKeyColumn { table, column } => write!(
                f,
                "Primary key of {} references unknown column {}",
                table, column
            ),
        }
    }
}

impl std::error::Error for TableMetaError {}

/// One table's schema snapshot.
///
/// Built once by a schema fetch through [`TableMetaBuilder`] and never mutated
/// afterwards. Caches share it behind an `Arc` and replace it wholesale on
/// refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    table_name: String,
    all_columns: HashMap<String, ColumnMeta>,
    all_indexes: HashMap<String, IndexMeta>,
    /// Primary key column names in key order (empty when the table has no PRIMARY index)
    primary_key_names: Vec<String>,
}

impl TableMeta {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn all_columns(&self) -> &HashMap<String, ColumnMeta> {
        &self.all_columns
    }

    pub fn all_indexes(&self) -> &HashMap<String, IndexMeta> {
        &self.all_indexes
    }

    /// Look up a column by name, falling back to a case-insensitive match
    pub fn column_meta(&self, column_name: &str) -> Option<&ColumnMeta> {
        self.all_columns.get(column_name).or_else(|| {
            self.all_columns
                .values()
                .find(|c| c.column_name.eq_ignore_ascii_case(column_name))
        })
    }

    /// Columns sorted by ordinal position
    pub fn columns_in_ordinal_order(&self) -> Vec<&ColumnMeta> {
        let mut columns: Vec<&ColumnMeta> = self.all_columns.values().collect();
        columns.sort_by_key(|c| c.ordinal_position);
        columns
    }

    /// The PRIMARY index, if the table has one
    pub fn primary_index(&self) -> Option<&IndexMeta> {
        self.all_indexes.values().find(|idx| idx.is_primary())
    }

    /// Primary key column names in key order
    pub fn primary_key_only_names(&self) -> &[String] {
        &self.primary_key_names
    }

    /// Primary key column name → column metadata
    pub fn primary_key_map(&self) -> HashMap<&str, &ColumnMeta> {
        self.primary_key_names
            .iter()
            .filter_map(|name| self.column_meta(name).map(|c| (name.as_str(), c)))
            .collect()
    }

    /// Primary key columns flagged auto-increment, in key order
    pub fn auto_increment_pk_columns(&self) -> Vec<&ColumnMeta> {
        self.primary_key_names
            .iter()
            .filter_map(|name| self.column_meta(name))
            .filter(|c| c.is_autoincrement)
            .collect()
    }

    /// Whether `column_name` is part of the primary key (case-insensitive)
    pub fn contains_pk(&self, column_name: &str) -> bool {
        self.primary_key_names
            .iter()
            .any(|pk| pk.eq_ignore_ascii_case(column_name))
    }
}

/// Incremental builder used by schema fetchers.
///
/// Index rows arrive one (index, column) pair at a time from the catalog; the
/// builder merges them by index name, keeping column order.
#[derive(Debug, Default)]
pub struct TableMetaBuilder {
    table_name: String,
    all_columns: HashMap<String, ColumnMeta>,
    all_indexes: HashMap<String, IndexMeta>,
}

impl TableMetaBuilder {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    pub fn add_column(&mut self, column: ColumnMeta) -> &mut Self {
        self.all_columns.insert(column.column_name.clone(), column);
        self
    }

    /// Add one index participation row.
    ///
    /// The first row seen for an index fixes its classification and
    /// uniqueness; later rows only append columns.
    pub fn add_index_column(
        &mut self,
        index_name: &str,
        column_name: &str,
        index_type: IndexType,
        non_unique: bool,
    ) -> &mut Self {
        self.all_indexes
            .entry(index_name.to_string())
            .or_insert_with(|| IndexMeta::new(index_name, index_type, non_unique))
            .push_column(column_name);
        self
    }

    pub fn has_column(&self, column_name: &str) -> bool {
        self.all_columns.contains_key(column_name)
    }

    pub fn build(self) -> Result<TableMeta, TableMetaError> {
        if self.all_columns.is_empty() {
            return Err(TableMetaError::NoColumns {
                table: self.table_name,
            });
        }
        if self.all_indexes.is_empty() {
            return Err(TableMetaError::NoIndex {
                table: self.table_name,
            });
        }

        let mut primaries: Vec<&IndexMeta> =
            self.all_indexes.values().filter(|idx| idx.is_primary()).collect();
        if primaries.len() > 1 {
            let mut indexes: Vec<String> =
                primaries.iter().map(|idx| idx.index_name.clone()).collect();
            indexes.sort();
            return Err(TableMetaError::MultiplePrimaryKeys {
                table: self.table_name,
                indexes,
            });
        }

        let primary_key_names = match primaries.pop() {
            Some(primary) => {
                let mut names = Vec::with_capacity(primary.columns.len());
                for column in &primary.columns {
                    let known = self.all_columns.contains_key(column)
                        || self
                            .all_columns
                            .keys()
                            .any(|c| c.eq_ignore_ascii_case(column));
                    if !known {
                        return Err(TableMetaError::UnknownPrimaryKeyColumn {
                            table: self.table_name,
                            column: column.clone(),
                        });
                    }
                    names.push(column.clone());
                }
                names
            }
            None => Vec::new(),
        };

        Ok(TableMeta {
            table_name: self.table_name,
            all_columns: self.all_columns,
            all_indexes: self.all_indexes,
            primary_key_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_item() -> TableMeta {
        let mut builder = TableMetaBuilder::new("LINE_ITEM");
        builder
            .add_column(ColumnMeta::new("LINE_ITEM", "ORDER_ID", "INTEGER", 1))
            .add_column(ColumnMeta::new("LINE_ITEM", "SEQ", "SERIAL", 2).with_autoincrement(true))
            .add_column(ColumnMeta::new("LINE_ITEM", "SKU", "VARCHAR", 3))
            .add_index_column("PK_LINE_ITEM", "ORDER_ID", IndexType::Primary, false)
            .add_index_column("PK_LINE_ITEM", "SEQ", IndexType::Primary, false)
            .add_index_column("IDX_SKU", "SKU", IndexType::Normal, true);
        builder.build().expect("valid table")
    }

    #[test]
    fn test_primary_key_order_follows_index() {
        let meta = line_item();
        assert_eq!(meta.primary_key_only_names(), &["ORDER_ID", "SEQ"]);
        assert_eq!(meta.primary_key_map().len(), 2);
        assert_eq!(meta.all_indexes().len(), 2);
    }

    #[test]
    fn test_auto_increment_pk_columns() {
        let meta = line_item();
        let autos: Vec<&str> = meta
            .auto_increment_pk_columns()
            .iter()
            .map(|c| c.column_name.as_str())
            .collect();
        assert_eq!(autos, vec!["SEQ"]);
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let meta = line_item();
        assert!(meta.column_meta("order_id").is_some());
        assert!(meta.contains_pk("seq"));
        assert!(!meta.contains_pk("sku"));
    }

    #[test]
    fn test_columns_in_ordinal_order() {
        let meta = line_item();
        let names: Vec<&str> = meta
            .columns_in_ordinal_order()
            .iter()
            .map(|c| c.column_name.as_str())
            .collect();
        assert_eq!(names, vec!["ORDER_ID", "SEQ", "SKU"]);
    }

    #[test]
    fn test_build_without_index_fails() {
        let mut builder = TableMetaBuilder::new("T");
        builder.add_column(ColumnMeta::new("T", "A", "INTEGER", 1));
        assert_eq!(
            builder.build().unwrap_err(),
            TableMetaError::NoIndex {
                table: "T".to_string()
            }
        );
    }

    #[test]
    fn test_build_without_columns_fails() {
        let builder = TableMetaBuilder::new("T");
        assert!(matches!(builder.build(), Err(TableMetaError::NoColumns { .. })));
    }

    #[test]
    fn test_build_rejects_two_primary_indexes() {
        let mut builder = TableMetaBuilder::new("T");
        builder
            .add_column(ColumnMeta::new("T", "A", "INTEGER", 1))
            .add_index_column("PK_1", "A", IndexType::Primary, false)
            .add_index_column("PK_2", "A", IndexType::Primary, false);
        assert!(matches!(
            builder.build(),
            Err(TableMetaError::MultiplePrimaryKeys { .. })
        ));
    }

    #[test]
    fn test_unique_only_table_has_no_primary_key() {
        let mut builder = TableMetaBuilder::new("T");
        builder
            .add_column(ColumnMeta::new("T", "A", "INTEGER", 1))
            .add_index_column("UQ_A", "A", IndexType::Unique, false);
        let meta = builder.build().expect("unique index is enough to build");
        assert!(meta.primary_key_only_names().is_empty());
        assert!(meta.primary_index().is_none());
    }

    #[test]
    fn test_index_rows_merge_without_duplicates() {
        let mut builder = TableMetaBuilder::new("T");
        builder
            .add_column(ColumnMeta::new("T", "A", "INTEGER", 1))
            .add_index_column("PK_T", "A", IndexType::Primary, false)
            .add_index_column("PK_T", "A", IndexType::Primary, false);
        let meta = builder.build().unwrap();
        assert_eq!(meta.primary_index().unwrap().columns, vec!["A".to_string()]);
    }

    #[test]
    fn test_table_meta_serializes() {
        let meta = line_item();
        let json = serde_json::to_string(&meta).unwrap();
        let back: TableMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(back.primary_key_only_names(), meta.primary_key_only_names());
    }
}
