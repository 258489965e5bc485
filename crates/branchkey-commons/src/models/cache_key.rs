// Identity of a cached table schema: {resource_id}.{normalized_table}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dialect-normalized identity for a cached schema.
///
/// The table component must already be normalized by the dialect (quotes
/// stripped, case folded) so that every spelling of one physical table maps
/// to the same key. Construct it through a dialect's `cache_key` rather than
/// by hand outside of tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    resource_id: String,
    table: String,
}

impl CacheKey {
    pub fn new(resource_id: impl Into<String>, normalized_table: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            table: normalized_table.into(),
        }
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_id, self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let key = CacheKey::new("jdbc:gbasedbt://db1/orders_db", "orders");
        assert_eq!(key.to_string(), "jdbc:gbasedbt://db1/orders_db.orders");
    }

    #[test]
    fn test_resource_is_part_of_identity() {
        let a = CacheKey::new("res-a", "orders");
        let b = CacheKey::new("res-b", "orders");
        assert_ne!(a, b);
        assert_eq!(a, CacheKey::new("res-a", "orders"));
    }

    #[test]
    fn test_no_collision_on_dotted_names() {
        // "a.b" + "c" and "a" + "b.c" render the same text but stay distinct keys
        let left = CacheKey::new("a.b", "c");
        let right = CacheKey::new("a", "b.c");
        assert_eq!(left.to_string(), right.to_string());
        assert_ne!(left, right);
    }
}
