//! SQLite dialect for the tidewater embedded-database layer.
//!
//! This crate turns the pure descriptors of `tidewater-core` into SQL and
//! drives a live database through schema setup and migrations. It is
//! organized into five modules:
//!
//! - **`value`** — identifier quoting and literal/parameter encoding
//! - **`query`** — the condition-to-SQL compiler (parameterized fragments)
//! - **`schema`** — DDL generation for schemas and migration steps
//! - **`dml`** — insert/update statement encoders
//! - **`adapter`** — the initialization state machine over a
//!   [`rusqlite::Connection`]
//!
//! All encoding functions are pure, synchronous, and safe to call from
//! any number of threads. I/O happens only in the adapter, which owns its
//! connection exclusively.
//!
//! # Quick start — queries
//!
//! ```
//! use tidewater_core::{where_, gte, on};
//! use tidewater_sqlite::{AssociationKind, QueryPlan, encode_query};
//!
//! let plan = QueryPlan::new(
//!     "tasks",
//!     vec![
//!         where_("priority", gte(5)),
//!         on("projects", "is_archived", false),
//!     ],
//! )
//! .association(
//!     "projects",
//!     AssociationKind::BelongsTo { key: "project_id".into() },
//! );
//!
//! let query = encode_query(&plan);
//! assert!(query.sql.starts_with(r#"select "tasks".* from "tasks" join "projects""#));
//! assert_eq!(query.params.len(), 2);
//! ```
//!
//! # Quick start — initialization
//!
//! ```no_run
//! use tidewater_core::{app_schema, table_schema, ColumnSchema, ColumnType};
//! use tidewater_sqlite::SqliteAdapter;
//!
//! let schema = app_schema(
//!     1,
//!     vec![table_schema(
//!         "tasks",
//!         vec![ColumnSchema::new("title", ColumnType::String)],
//!     )
//!     .unwrap()],
//! )
//! .unwrap();
//!
//! let mut adapter = SqliteAdapter::open("app.db", schema, None).unwrap();
//! adapter.init().unwrap();
//! ```

mod adapter;
mod dml;
mod error;
mod query;
mod schema;
mod value;

pub use adapter::{InitStatus, MIN_ID, SqliteAdapter};
pub use dml::{encode_insert, encode_update};
pub use error::{Result, SqliteError};
pub use query::{AssociationKind, QueryPlan, SqlQuery, encode_count_query, encode_query};
pub use schema::{encode_migration_steps, encode_schema};
pub use value::{encode_literal, encode_name, to_sql_value};
