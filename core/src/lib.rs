//! Core data model for the tidewater embedded-database layer.
//!
//! This crate defines the three descriptor families consumed by the
//! dialect crates:
//!
//! - **`query`** — the condition AST and its public constructors: a
//!   declarative, composable description of row filters and join
//!   predicates, independent of any SQL text
//! - **`schema`** — versioned table/column descriptors with naming and
//!   typing invariants enforced at construction
//! - **`migrations`** — ordered, gap-checked migration sets plus the
//!   resolver that selects the steps between two schema versions
//!
//! Everything here is a pure value type: validation happens eagerly in the
//! constructors, descriptors are immutable afterwards, and no I/O is
//! performed. The SQLite dialect lives in the companion
//! `tidewater-sqlite` crate.
//!
//! # Quick start
//!
//! ```
//! use tidewater_core::*;
//!
//! // Describe the schema...
//! let schema = app_schema(
//!     2,
//!     vec![table_schema(
//!         "posts",
//!         vec![
//!             ColumnSchema::new("title", ColumnType::String).indexed(),
//!             ColumnSchema::new("subtitle", ColumnType::String).optional(),
//!         ],
//!     )?],
//! )?;
//!
//! // ...the migrations that produce it...
//! let migrations = schema_migrations(vec![Migration {
//!     to_version: 2,
//!     steps: vec![add_columns(
//!         "posts",
//!         vec![ColumnSchema::new("subtitle", ColumnType::String).optional()],
//!     )?],
//! }])?;
//!
//! // ...and the records you want back.
//! let description = QueryDescription::build(vec![
//!     where_("title", not_eq(Value::Null)),
//!     on("authors", "is_active", true),
//! ]);
//!
//! assert_eq!(schema.version(), migrations.max_version());
//! assert_eq!(description.wheres().len(), 1);
//! # Ok::<(), SchemaError>(())
//! ```

mod error;
mod migrations;
mod query;
mod schema;

pub use error::{Result, SchemaError};
pub use migrations::{
    Migration, MigrationStep, SchemaMigrations, add_columns, create_table, schema_migrations,
};
pub use query::{
    Comparison, ComparisonRight, Condition, Operator, QueryDescription, Value, and, between,
    column, eq, gt, gte, like, lt, lte, not_eq, not_in, not_like, on, on_condition, one_of, or,
    sanitize_like_string, weak_gt, where_,
};
pub use schema::{
    AppSchema, ColumnSchema, ColumnType, EXECUTED_MIGRATIONS_TABLE, TableSchema, VERSIONS_TABLE,
    app_schema, bootstrap_schema, table_schema,
};
