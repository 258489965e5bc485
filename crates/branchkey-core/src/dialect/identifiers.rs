//! Identifier splitting and case folding.

/// How a dialect folds unquoted identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFold {
    Upper,
    Lower,
}

impl CaseFold {
    pub fn apply(&self, ident: &str) -> String {
        match self {
            CaseFold::Upper => ident.to_uppercase(),
            CaseFold::Lower => ident.to_lowercase(),
        }
    }
}

/// Split `schema.table` on the last dot that is not inside quotes.
///
/// Returns `(None, name)` for unqualified names. Catalog-qualified names
/// (`db.schema.table`) keep everything before the last dot as the qualifier.
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
    let name = name.trim();
    let mut open: Option<char> = None;
    let mut split_at = None;
    for (idx, ch) in name.char_indices() {
        match (open, ch) {
            (None, '"') | (None, '`') => open = Some(ch),
            (None, '[') => open = Some(']'),
            (Some(q), c) if c == q => open = None,
            (None, '.') => split_at = Some(idx),
            _ => {}
        }
    }
    match split_at {
        Some(idx) => (Some(&name[..idx]), &name[idx + 1..]),
        None => (None, name),
    }
}

/// Whether `part` is wrapped in `quote`
pub fn is_quoted(part: &str, quote: char) -> bool {
    part.len() >= 2 && part.starts_with(quote) && part.ends_with(quote)
}

/// Normalize one identifier part: quoted → verbatim without quotes, unquoted → folded
pub fn normalize_part(part: &str, quote: char, fold: CaseFold) -> String {
    let part = part.trim();
    if is_quoted(part, quote) {
        part[1..part.len() - 1].to_string()
    } else {
        fold.apply(part)
    }
}
