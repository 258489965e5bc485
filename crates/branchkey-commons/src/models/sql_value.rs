//! Driver-neutral SQL value.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single value read from, or bound to, a database driver.
///
/// Key values captured for undo logging are carried as `SqlValue` so the
/// undo-log builder can bind them back into a `WHERE pk IN (...)` lookup
/// without knowing which dialect produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Exact numeric carried as text to avoid precision loss (DECIMAL/NUMBER)
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Returns the value as an `i64` when it is an integer, or a decimal /
    /// text value that parses as one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            SqlValue::Decimal(s) | SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) | SqlValue::Decimal(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(b) => Some(*b),
            SqlValue::Int(v) => Some(*v != 0),
            SqlValue::Text(s) => match s.trim() {
                "t" | "true" | "TRUE" | "Y" | "y" | "1" => Some(true),
                "f" | "false" | "FALSE" | "N" | "n" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Decimal(s) => write!(f, "{}", s),
            SqlValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            SqlValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_i64_parses_numeric_text() {
        assert_eq!(SqlValue::Int(42).as_i64(), Some(42));
        assert_eq!(SqlValue::Decimal("17".to_string()).as_i64(), Some(17));
        assert_eq!(SqlValue::Text(" 9 ".to_string()).as_i64(), Some(9));
        assert_eq!(SqlValue::Text("abc".to_string()).as_i64(), None);
        assert_eq!(SqlValue::Null.as_i64(), None);
    }

    #[test]
    fn test_as_bool_accepts_catalog_flags() {
        assert_eq!(SqlValue::Text("t".to_string()).as_bool(), Some(true));
        assert_eq!(SqlValue::Text("N".to_string()).as_bool(), Some(false));
        assert_eq!(SqlValue::Int(0).as_bool(), Some(false));
        assert_eq!(SqlValue::Bool(true).as_bool(), Some(true));
    }

    #[test]
    fn test_display_escapes_quotes() {
        assert_eq!(SqlValue::Text("o'neil".to_string()).to_string(), "'o''neil'");
        assert_eq!(SqlValue::Null.to_string(), "NULL");
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(3i64)), SqlValue::Int(3));
    }
}
