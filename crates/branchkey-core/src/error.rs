// Error types module
use branchkey_commons::models::table_meta::TableMetaError;
use branchkey_commons::CacheKey;
use std::time::Duration;
use thiserror::Error;

/// Classification of a driver failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// The driver or server gave up waiting
    Timeout,
    /// The operation is not supported by this driver (e.g. cursor rewind)
    Unsupported,
    /// Any other driver or server error
    Other,
}

/// Error reported by a database driver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub sql_state: Option<String>,
    pub message: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: DriverErrorKind::Other,
            sql_state: None,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: DriverErrorKind::Timeout,
            sql_state: None,
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self {
            kind: DriverErrorKind::Unsupported,
            sql_state: None,
            message: message.into(),
        }
    }

    pub fn with_sql_state(mut self, sql_state: impl Into<String>) -> Self {
        self.sql_state = Some(sql_state.into());
        self
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == DriverErrorKind::Timeout
    }
}

/// Schema metadata could not be fetched.
///
/// `Clone` so that every waiter of a single-flight fetch receives the same error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaFetchError {
    #[error("Failed to fetch schema of {table}: {source}")]
    Driver {
        table: String,
        #[source]
        source: DriverError,
    },

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Could not find any index in the table: {0}")]
    NoIndex(String),

    #[error("Table {table} reports more than one primary index: {indexes:?}")]
    MultiplePrimaryKeys { table: String, indexes: Vec<String> },

    #[error("Primary key of {table} references unknown column {column}")]
    UnknownPrimaryKeyColumn { table: String, column: String },

    #[error("Schema fetch for {key} timed out after {after:?}")]
    Timeout { key: String, after: Duration },
}

impl SchemaFetchError {
    pub fn driver(table: impl Into<String>, source: DriverError) -> Self {
        SchemaFetchError::Driver {
            table: table.into(),
            source,
        }
    }

    pub fn timeout(key: &CacheKey, after: Duration) -> Self {
        SchemaFetchError::Timeout {
            key: key.to_string(),
            after,
        }
    }

    /// Whether the failure was a timeout (ours or the driver's)
    pub fn is_timeout(&self) -> bool {
        match self {
            SchemaFetchError::Timeout { .. } => true,
            SchemaFetchError::Driver { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

impl From<TableMetaError> for SchemaFetchError {
    fn from(err: TableMetaError) -> Self {
        match err {
            TableMetaError::NoColumns { table } => SchemaFetchError::TableNotFound(table),
            TableMetaError::NoIndex { table } => SchemaFetchError::NoIndex(table),
            TableMetaError::MultiplePrimaryKeys { table, indexes } => {
                SchemaFetchError::MultiplePrimaryKeys { table, indexes }
            }
            TableMetaError::UnknownPrimaryKeyColumn { table, column } => {
                SchemaFetchError::UnknownPrimaryKeyColumn { table, column }
            }
        }
    }
}

/// Primary-key decision logic hit a violated precondition.
///
/// These indicate a configuration the resolver cannot handle safely; the
/// statement's undo record must not be built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Table {0} needs to contain the primary key")]
    NoPrimaryKey(String),

    #[error("Table {table} has more than one unresolved auto-increment primary key column: {columns:?}")]
    MultipleAutoIncrementColumns { table: String, columns: Vec<String> },

    #[error("Primary key column {column} of {table} has no value in the statement and is not auto-increment")]
    MissingPrimaryKeyValue { table: String, column: String },

    #[error("Primary key column {column} not found in the insert of {table}")]
    PrimaryKeyIndexNotFound { table: String, column: String },

    #[error("Statement parameter {index} is not bound")]
    UnboundParameter { index: usize },

    #[error("Column {column} of {table} is generated by the database but {generated} is the auto-increment column")]
    GeneratedColumnMismatch {
        table: String,
        column: String,
        generated: String,
    },

    #[error("Column {column} resolved {actual} values for {expected} affected rows")]
    RowCountMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

/// Database-generated key values could not be read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratedKeyError {
    #[error("Table {0} has no auto-increment primary key column")]
    NoAutoIncrementColumn(String),

    #[error("Failed to read generated keys of {table}: {primary}; fallback failed: {fallback}")]
    Retrieval {
        table: String,
        primary: String,
        fallback: DriverError,
    },

    #[error("Failed to read generated keys of {table}: {primary}; no fallback query available")]
    NoFallback { table: String, primary: String },

    #[error("Failed to drain generated keys of {table}: {source}")]
    Cursor {
        table: String,
        #[source]
        source: DriverError,
    },

    #[error("Generated key retrieval for {table} timed out after {after:?}")]
    Timeout { table: String, after: Duration },
}

/// Any failure while resolving the primary keys of one insert
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PkResolveError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaFetchError),

    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Generated key error: {0}")]
    GeneratedKey(#[from] GeneratedKeyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_meta_error_mapping() {
        let err: SchemaFetchError = TableMetaError::NoIndex {
            table: "orders".to_string(),
        }
        .into();
        assert_eq!(err, SchemaFetchError::NoIndex("orders".to_string()));
        assert_eq!(err.to_string(), "Could not find any index in the table: orders");
    }

    #[test]
    fn test_timeout_detection() {
        let key = CacheKey::new("res", "orders");
        assert!(SchemaFetchError::timeout(&key, Duration::from_millis(5)).is_timeout());
        assert!(SchemaFetchError::driver("orders", DriverError::timeout("socket read")).is_timeout());
        assert!(!SchemaFetchError::driver("orders", DriverError::new("syntax")).is_timeout());
    }
}
