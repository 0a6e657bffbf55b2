use proc_macro2::Span;
use syn::{Error, Result};

pub(crate) fn is_valid_sql_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Accepts `name` or `schema.name`.
pub(crate) fn parse_table_ident(s: &str, span: Span) -> Result<String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::new(span, "table name must not be empty"));
    }
    if !s.split('.').all(is_valid_sql_ident) || s.split('.').count() > 2 {
        return Err(Error::new(
            span,
            "table name must be `name` or `schema.name` (expected [A-Za-z_][A-Za-z0-9_]*)",
        ));
    }
    Ok(s.to_string())
}

pub(crate) fn parse_column_ident(s: &str, span: Span) -> Result<String> {
    let s = s.trim();
    if !is_valid_sql_ident(s) {
        return Err(Error::new(
            span,
            format!("column '{s}' must be a valid SQL identifier (expected [A-Za-z_][A-Za-z0-9_]*)"),
        ));
    }
    Ok(s.to_string())
}
