//! Insert and update statement encoders.
//!
//! Pure helpers for the record layer sitting above this crate: given a
//! table and a list of `(column, value)` pairs, produce a parameterized
//! statement. Values never appear in the SQL text.

use tidewater_core::Value;

use crate::query::SqlQuery;
use crate::value::encode_name;

/// Encodes an insert of one record.
///
/// # Examples
///
/// ```
/// use tidewater_core::Value;
/// use tidewater_sqlite::encode_insert;
///
/// let query = encode_insert(
///     "posts",
///     &[
///         ("id".into(), Value::from("abc123")),
///         ("title".into(), Value::from("hello")),
///     ],
/// );
/// assert_eq!(query.sql, r#"insert into "posts" ("id", "title") values (?, ?)"#);
/// ```
pub fn encode_insert(table: &str, record: &[(String, Value)]) -> SqlQuery {
    let columns = record
        .iter()
        .map(|(name, _)| encode_name(name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; record.len()].join(", ");
    SqlQuery {
        sql: format!(
            "insert into {} ({}) values ({})",
            encode_name(table),
            columns,
            placeholders
        ),
        params: record.iter().map(|(_, value)| value.clone()).collect(),
    }
}

/// Encodes an update of one record by id.
///
/// The id is matched with `is` and appended as the last parameter, after
/// the assignment values.
pub fn encode_update(table: &str, id: impl Into<Value>, record: &[(String, Value)]) -> SqlQuery {
    let assignments = record
        .iter()
        .map(|(name, _)| format!("{} = ?", encode_name(name)))
        .collect::<Vec<_>>()
        .join(", ");
    let mut params: Vec<Value> = record.iter().map(|(_, value)| value.clone()).collect();
    params.push(id.into());
    SqlQuery {
        sql: format!(
            "update {} set {} where \"id\" is ?",
            encode_name(table),
            assignments
        ),
        params,
    }
}
