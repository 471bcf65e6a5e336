//! Identifier quoting and value encoding for the SQLite dialect.
//!
//! Comparison operands always travel as positional `?` parameters; literal
//! SQL text is only produced for DDL backfills, where binding is not
//! available.

use rusqlite::types;
use tidewater_core::Value;

/// Wraps a table or column name in double quotes.
///
/// Embedded double quotes are escaped by doubling them. Backslash escapes
/// are mangled by the binding layer on some platforms, so doubling is a
/// hard compatibility requirement here, not a style choice.
///
/// # Examples
///
/// ```
/// use tidewater_sqlite::encode_name;
///
/// assert_eq!(encode_name("posts"), "\"posts\"");
/// assert_eq!(encode_name("we\"ird"), "\"we\"\"ird\"");
/// ```
pub fn encode_name(name: &str) -> String {
    if name.contains('"') {
        format!("\"{}\"", name.replace('"', "\"\""))
    } else {
        format!("\"{name}\"")
    }
}

/// Renders a value as SQL literal text.
///
/// Used only in DDL statement batches (default-value backfills), which
/// cannot carry bound parameters. Booleans render as `1`/`0` to match the
/// comparison semantics.
pub fn encode_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

/// Converts a condition value into a bindable SQLite value.
///
/// Booleans bind as integers `1`/`0`; nulls bind as SQL null.
pub fn to_sql_value(value: &Value) -> types::Value {
    match value {
        Value::Null => types::Value::Null,
        Value::Bool(b) => types::Value::Integer(i64::from(*b)),
        Value::Number(n) => types::Value::Real(*n),
        Value::String(s) => types::Value::Text(s.clone()),
    }
}
