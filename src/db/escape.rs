//! String escaping utilities for SQL literals.

/// Quote a string as a MySQL single-quoted literal.
///
/// Backslash is an escape character in MySQL's default `sql_mode`, so it is
/// doubled along with the quote character.
pub fn escape_mysql_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('\'');
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("''"),
            '\0' => result.push_str("\\0"),
            c => result.push(c),
        }
    }
    result.push('\'');
    result
}

/// Quote a string as a PostgreSQL single-quoted literal.
///
/// Assumes `standard_conforming_strings = on` (the default since 9.1): only the
/// quote character needs escaping.
pub fn escape_postgres_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('\'');
    for c in s.chars() {
        match c {
            '\'' => result.push_str("''"),
            c => result.push(c),
        }
    }
    result.push('\'');
    result
}

/// Escape LIKE wildcards so the value matches literally.
///
/// Both dialects use backslash as the default LIKE escape character.
pub fn escape_like(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '%' | '_' => {
                result.push('\\');
                result.push(c);
            }
            c => result.push(c),
        }
    }
    result
}
