//! Reserved-word checks for generated SQL.
//!
//! Undo statements are rebuilt from table and column names captured in
//! [`TableMeta`](branchkey_commons::TableMeta); names that collide with a
//! dialect keyword, or whose case would be folded by the database, must be
//! quoted when they are written back.

mod gbasedbt;
mod mysql;
mod oracle;
mod postgresql;

use crate::dialect::identifiers::split_qualified;
use branchkey_commons::DialectKind;
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashSet;

/// When a non-keyword identifier still needs quoting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeRule {
    /// Unquoted names fold to upper case; any lowercase letter needs quoting
    UpperCaseFolding,
    /// Unquoted names fold to lower case; any uppercase letter needs quoting
    LowerCaseFolding,
    /// Identifiers are case-insensitive; only keywords need quoting
    KeywordOnly,
}

/// Keyword set plus the case rule of one dialect
#[derive(Debug)]
pub struct KeywordChecker {
    keywords: HashSet<&'static str>,
    quote: char,
    rule: EscapeRule,
}

impl KeywordChecker {
    fn new(words: &'static [&'static str], quote: char, rule: EscapeRule) -> Self {
        Self {
            keywords: words.iter().copied().collect(),
            quote,
            rule,
        }
    }

    /// Whether `name` is a reserved word (exact match, then upper-cased match)
    pub fn check(&self, name: &str) -> bool {
        self.keywords.contains(name) || self.keywords.contains(name.to_uppercase().as_str())
    }

    /// Whether `name` must be quoted when written into SQL
    pub fn check_escape(&self, name: &str) -> bool {
        if self.check(name) {
            return true;
        }
        match self.rule {
            EscapeRule::UpperCaseFolding => name.chars().any(|c| c.is_ascii_lowercase()),
            EscapeRule::LowerCaseFolding => name.chars().any(|c| c.is_ascii_uppercase()),
            EscapeRule::KeywordOnly => false,
        }
    }

    /// Quote `name` if needed.
    ///
    /// Schema-qualified names are escaped part by part; parts that are already
    /// quoted are left alone, dots inside them included.
    pub fn escape<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match split_qualified(name) {
            (None, part) => self.escape_part(part),
            (Some(qualifier), part) => match (self.escape(qualifier), self.escape_part(part)) {
                (Cow::Borrowed(_), Cow::Borrowed(_)) => Cow::Borrowed(name),
                (qualifier, part) => Cow::Owned(format!("{}.{}", qualifier, part)),
            },
        }
    }

    fn escape_part<'a>(&self, part: &'a str) -> Cow<'a, str> {
        let already_quoted = part.len() >= 2 && part.starts_with(self.quote) && part.ends_with(self.quote);
        if already_quoted || !self.check_escape(part) {
            Cow::Borrowed(part)
        } else {
            Cow::Owned(format!("{q}{part}{q}", q = self.quote))
        }
    }

    pub fn quote_char(&self) -> char {
        self.quote
    }
}

static GBASEDBT_KEYWORDS: Lazy<KeywordChecker> =
    Lazy::new(|| KeywordChecker::new(gbasedbt::KEYWORDS, '"', EscapeRule::UpperCaseFolding));
static ORACLE_KEYWORDS: Lazy<KeywordChecker> =
    Lazy::new(|| KeywordChecker::new(oracle::KEYWORDS, '"', EscapeRule::UpperCaseFolding));
static MYSQL_KEYWORDS: Lazy<KeywordChecker> =
    Lazy::new(|| KeywordChecker::new(mysql::KEYWORDS, '`', EscapeRule::KeywordOnly));
static POSTGRESQL_KEYWORDS: Lazy<KeywordChecker> =
    Lazy::new(|| KeywordChecker::new(postgresql::KEYWORDS, '"', EscapeRule::LowerCaseFolding));

/// Keyword checker for a dialect
pub fn keyword_checker(kind: DialectKind) -> &'static KeywordChecker {
    match kind {
        DialectKind::GBasedbt => &GBASEDBT_KEYWORDS,
        DialectKind::Oracle => &ORACLE_KEYWORDS,
        DialectKind::MySql => &MYSQL_KEYWORDS,
        DialectKind::PostgreSql => &POSTGRESQL_KEYWORDS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gbasedbt_check_normalizes_case() {
        let checker = keyword_checker(DialectKind::GBasedbt);
        assert!(checker.check("LVARCHAR"));
        assert!(checker.check("rowid"));
        assert!(!checker.check("order_id"));
    }

    #[test]
    fn test_gbasedbt_escape_rules() {
        let checker = keyword_checker(DialectKind::GBasedbt);
        // keyword
        assert!(checker.check_escape("SIZE"));
        // all upper-case non-keyword stays bare
        assert!(!checker.check_escape("ORDER_ID"));
        // mixed case needs quoting
        assert!(checker.check_escape("OrderId"));
        assert_eq!(checker.escape("size"), "\"size\"");
        assert_eq!(checker.escape("ORDER_ID"), "ORDER_ID");
    }

    #[test]
    fn test_postgresql_escape_rules() {
        let checker = keyword_checker(DialectKind::PostgreSql);
        assert!(checker.check_escape("user"));
        assert!(!checker.check_escape("order_id"));
        assert!(checker.check_escape("OrderId"));
        assert_eq!(checker.escape("public.User"), "public.\"User\"");
    }

    #[test]
    fn test_mysql_only_escapes_keywords() {
        let checker = keyword_checker(DialectKind::MySql);
        assert_eq!(checker.escape("OrderId"), "OrderId");
        assert_eq!(checker.escape("key"), "`key`");
        assert_eq!(checker.escape("`key`"), "`key`");
    }

    #[test]
    fn test_oracle_has_varchar2() {
        let checker = keyword_checker(DialectKind::Oracle);
        assert!(checker.check("varchar2"));
        assert!(!keyword_checker(DialectKind::GBasedbt).check("varchar2"));
    }

    #[test]
    fn test_escape_borrows_when_unchanged() {
        let checker = keyword_checker(DialectKind::GBasedbt);
        assert!(matches!(checker.escape("OWNER.ORDERS"), Cow::Borrowed(_)));
        assert_eq!(checker.escape("OWNER.table"), "OWNER.\"table\"");
    }

    #[test]
    fn test_escape_keeps_dots_inside_quoted_parts() {
        let gbase = keyword_checker(DialectKind::GBasedbt);
        assert_eq!(gbase.escape("\"a.b\".c"), "\"a.b\".\"c\"");
        assert_eq!(gbase.escape("\"a.b\".C"), "\"a.b\".C");
        assert_eq!(gbase.escape("DB.\"x.y\".size"), "DB.\"x.y\".\"size\"");

        let mysql = keyword_checker(DialectKind::MySql);
        assert_eq!(mysql.escape("`a.b`.key"), "`a.b`.`key`");
    }
}
