//! Parsed INSERT statement facts.
//!
//! Parsing and rewriting happen in an external SQL recognizer; this module
//! only describes what the resolver consumes from it.

use branchkey_commons::SqlValue;
use std::fmt;

/// A sequence call in a value list, e.g. `nextval('order_seq')` or `order_seq.nextval`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceExpr {
    pub sequence: String,
    pub function: String,
}

impl SequenceExpr {
    pub fn new(sequence: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
            function: function.into(),
        }
    }

    /// `seq.nextval` form
    pub fn nextval(sequence: impl Into<String>) -> Self {
        Self::new(sequence, "nextval")
    }
}

impl fmt::Display for SequenceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.function, self.sequence)
    }
}

/// One value expression in an INSERT row
#[derive(Debug, Clone, PartialEq)]
pub enum InsertValue {
    /// A literal value written in the statement text
    Literal(SqlValue),
    /// An explicit `NULL`
    Null,
    /// A sequence call evaluated by the database
    Sequence(SequenceExpr),
    /// Any other function call evaluated by the database (e.g. `newid()`)
    Method(String),
    /// A `?` placeholder; 0-based index into the bound parameters
    Placeholder(usize),
}

impl InsertValue {
    /// Whether the database, not the statement, decides the realized value
    pub fn is_generated(&self) -> bool {
        matches!(self, InsertValue::Sequence(_) | InsertValue::Method(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, InsertValue::Null | InsertValue::Literal(SqlValue::Null))
    }
}

impl From<SqlValue> for InsertValue {
    fn from(v: SqlValue) -> Self {
        match v {
            SqlValue::Null => InsertValue::Null,
            other => InsertValue::Literal(other),
        }
    }
}

/// Facts about a parsed INSERT statement
pub trait InsertStatement: Send + Sync {
    /// Target table name as written in the SQL text (may be quoted or schema-qualified)
    fn table_name(&self) -> &str;

    /// Inserted column names in statement order; empty for `INSERT INTO t VALUES (...)`
    fn insert_columns(&self) -> &[String];

    /// Value expressions, one list per row, aligned with `insert_columns`
    fn rows(&self) -> &[Vec<InsertValue>];

    fn row_count(&self) -> usize {
        self.rows().len()
    }

    /// Bound parameter for a placeholder
    fn parameter(&self, index: usize) -> Option<&SqlValue>;

    /// Position of `column` in the column list, ignoring case and identifier quotes
    fn column_index(&self, column: &str) -> Option<usize> {
        self.insert_columns()
            .iter()
            .position(|c| unquote(c).eq_ignore_ascii_case(column))
    }

    fn contains_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Whether the statement lists its columns explicitly
    fn contains_columns(&self) -> bool {
        !self.insert_columns().is_empty()
    }
}

/// Strip one layer of identifier quoting (`"x"`, `` `x` ``, `[x]`)
pub fn unquote(ident: &str) -> &str {
    let ident = ident.trim();
    let bytes = ident.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"')
            || (first == b'`' && last == b'`')
            || (first == b'[' && last == b']')
        {
            return &ident[1..ident.len() - 1];
        }
    }
    ident
}
