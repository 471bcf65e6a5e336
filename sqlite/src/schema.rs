//! DDL generation for schemas and migration steps.
//!
//! Produces `;`-separated statement batches that the adapter replays
//! inside one transaction. Every table gains the three implicit columns
//! (`id` primary key, `created_at`, `updated_at`) ahead of the declared
//! ones, and one `create index if not exists` per indexed column.
//!
//! # Examples
//!
//! ```
//! use tidewater_core::{app_schema, table_schema, ColumnSchema, ColumnType};
//! use tidewater_sqlite::encode_schema;
//!
//! let schema = app_schema(
//!     1,
//!     vec![table_schema(
//!         "posts",
//!         vec![ColumnSchema::new("title", ColumnType::String).indexed()],
//!     )
//!     .unwrap()],
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     encode_schema(&schema),
//!     "create table if not exists \"posts\" (\"id\" primary key, \"created_at\", \"updated_at\", \"title\");\
//!      create index if not exists posts_title on \"posts\" (\"title\");"
//! );
//! ```

use tidewater_core::{AppSchema, ColumnSchema, ColumnType, MigrationStep, Value};

use crate::value::{encode_literal, encode_name};

const STANDARD_COLUMNS: &str = r#""id" primary key, "created_at", "updated_at""#;

/// Type-derived default used to backfill a newly added column.
fn null_value_for(column: &ColumnSchema) -> Value {
    if column.is_optional {
        return Value::Null;
    }
    match column.column_type {
        ColumnType::String => Value::String(String::new()),
        ColumnType::Number => Value::Number(0.0),
        ColumnType::Boolean => Value::Bool(false),
    }
}

fn encode_create_table(name: &str, columns: &[ColumnSchema]) -> String {
    let mut columns_sql = String::from(STANDARD_COLUMNS);
    for column in columns {
        columns_sql.push_str(", ");
        columns_sql.push_str(&encode_name(&column.name));
    }
    format!(
        "create table if not exists {} ({});",
        encode_name(name),
        columns_sql
    )
}

fn encode_index(table_name: &str, column: &ColumnSchema) -> String {
    if !column.is_indexed {
        return String::new();
    }
    format!(
        "create index if not exists {}_{} on {} ({});",
        table_name,
        column.name,
        encode_name(table_name),
        encode_name(&column.name)
    )
}

fn encode_table(name: &str, columns: &[ColumnSchema]) -> String {
    let mut sql = encode_create_table(name, columns);
    for column in columns {
        sql.push_str(&encode_index(name, column));
    }
    sql
}

/// Encodes the DDL batch creating every table and index of a schema.
///
/// Uses `create table if not exists` / `create index if not exists`, so
/// the batch is safe to replay against a database that already has some
/// of the objects.
pub fn encode_schema(schema: &AppSchema) -> String {
    schema
        .tables()
        .iter()
        .map(|table| encode_table(table.name(), table.columns()))
        .collect()
}

fn encode_add_columns(table: &str, columns: &[ColumnSchema]) -> String {
    let mut sql = String::new();
    for column in columns {
        sql.push_str(&format!(
            "alter table {} add {};",
            encode_name(table),
            encode_name(&column.name)
        ));
        sql.push_str(&format!(
            "update {} set {} = {};",
            encode_name(table),
            encode_name(&column.name),
            encode_literal(&null_value_for(column))
        ));
        sql.push_str(&encode_index(table, column));
    }
    sql
}

/// Encodes the DDL batch for an ordered sequence of migration steps.
///
/// `CreateTable` steps reuse the table encoder; `AddColumns` steps emit an
/// `alter table`, a default-value backfill, and the index statement per
/// column.
pub fn encode_migration_steps(steps: &[MigrationStep]) -> String {
    steps
        .iter()
        .map(|step| match step {
            MigrationStep::CreateTable { name, columns } => encode_table(name, columns),
            MigrationStep::AddColumns { table, columns } => encode_add_columns(table, columns),
        })
        .collect()
}
