//! Supported database dialects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Database dialect identifier, selected once at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    /// GBase 8s (Informix lineage)
    #[serde(alias = "gbase8s")]
    GBasedbt,
    Oracle,
    #[serde(rename = "mysql")]
    MySql,
    #[serde(rename = "postgresql", alias = "postgres", alias = "pg")]
    PostgreSql,
}

impl DialectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialectKind::GBasedbt => "gbasedbt",
            DialectKind::Oracle => "oracle",
            DialectKind::MySql => "mysql",
            DialectKind::PostgreSql => "postgresql",
        }
    }

    pub fn all() -> &'static [DialectKind] {
        &[
            DialectKind::GBasedbt,
            DialectKind::Oracle,
            DialectKind::MySql,
            DialectKind::PostgreSql,
        ]
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gbasedbt" | "gbase8s" => Ok(DialectKind::GBasedbt),
            "oracle" => Ok(DialectKind::Oracle),
            "mysql" => Ok(DialectKind::MySql),
            "postgresql" | "postgres" | "pg" => Ok(DialectKind::PostgreSql),
            other => Err(format!(
                "Unknown dialect '{}'. Must be one of: gbasedbt, oracle, mysql, postgresql",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_accepts_aliases() {
        assert_eq!("GBase8s".parse::<DialectKind>().unwrap(), DialectKind::GBasedbt);
        assert_eq!("pg".parse::<DialectKind>().unwrap(), DialectKind::PostgreSql);
        assert_eq!(" MySQL ".parse::<DialectKind>().unwrap(), DialectKind::MySql);
        assert!("db2".parse::<DialectKind>().is_err());
    }

    #[test]
    fn test_round_trip_through_as_str() {
        for kind in DialectKind::all() {
            assert_eq!(kind.as_str().parse::<DialectKind>().unwrap(), *kind);
        }
    }
}
