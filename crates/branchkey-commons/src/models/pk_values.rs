//! Primary key values captured for one statement

use super::sql_value::SqlValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Primary-key column name → values, one per affected row in statement row order.
///
/// This is the artifact handed to the undo-log builder; its row count and row
/// order must match the statement's affected rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PkValueMap {
    columns: BTreeMap<String, Vec<SqlValue>>,
}

impl PkValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value list for a column, replacing any previous list
    pub fn insert_column(&mut self, column: impl Into<String>, values: Vec<SqlValue>) {
        self.columns.insert(column.into(), values);
    }

    /// Merge `other` into `self`; columns present in `other` replace ours
    pub fn merge(&mut self, other: PkValueMap) {
        self.columns.extend(other.columns);
    }

    pub fn get(&self, column: &str) -> Option<&[SqlValue]> {
        self.columns.get(column).map(Vec::as_slice)
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Remove a column, returning its values
    pub fn remove(&mut self, column: &str) -> Option<Vec<SqlValue>> {
        self.columns.remove(column)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SqlValue])> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Row count shared by every column, or `None` when empty or the columns disagree
    pub fn row_count(&self) -> Option<usize> {
        let mut counts = self.columns.values().map(Vec::len);
        let first = counts.next()?;
        counts.all(|n| n == first).then_some(first)
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<SqlValue>> {
        self.columns
    }
}

impl FromIterator<(String, Vec<SqlValue>)> for PkValueMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<SqlValue>)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_incoming_values() {
        let mut extracted = PkValueMap::new();
        extracted.insert_column("ID", vec![SqlValue::Null]);
        extracted.insert_column("TENANT", vec![SqlValue::Int(7)]);

        let mut generated = PkValueMap::new();
        generated.insert_column("ID", vec![SqlValue::Int(1001)]);

        extracted.merge(generated);
        assert_eq!(extracted.get("ID"), Some(&[SqlValue::Int(1001)][..]));
        assert_eq!(extracted.get("TENANT"), Some(&[SqlValue::Int(7)][..]));
    }

    #[test]
    fn test_row_count() {
        let mut map = PkValueMap::new();
        assert_eq!(map.row_count(), None);
        map.insert_column("A", vec![SqlValue::Int(1), SqlValue::Int(2)]);
        map.insert_column("B", vec![SqlValue::Int(3), SqlValue::Int(4)]);
        assert_eq!(map.row_count(), Some(2));
        map.insert_column("C", vec![SqlValue::Int(5)]);
        assert_eq!(map.row_count(), None);
    }
}
