//! Error types for schema, migration, and condition construction.
//!
//! All invariants are enforced eagerly: a descriptor that constructs
//! successfully is valid by the time any encoder sees it. Every message
//! names the offending field, table, column, or version.

use thiserror::Error;

/// Errors raised while constructing schemas, migrations, or conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Schema version is zero.
    #[error("schema version must be greater than 0")]
    InvalidSchemaVersion,

    /// Table schema has an empty name.
    #[error("missing table name in schema")]
    MissingTableName,

    /// Two tables in the same app schema share a name.
    #[error("duplicate table in schema: {0}")]
    DuplicateTable(String),

    /// Column schema has an empty name.
    #[error("missing column name")]
    MissingColumnName,

    /// Column uses one of the implicit names added to every table.
    #[error("you must not define a column with name {0}")]
    ReservedColumnName(String),

    /// Two columns in the same table share a name.
    #[error("duplicate column {column} in table {table}")]
    DuplicateColumn {
        /// Table declaring the duplicate.
        table: String,
        /// The repeated column name.
        column: String,
    },

    /// `last_modified` declared with a type other than `number`.
    #[error("for compatibility reasons, column last_modified must be of type number")]
    InvalidLastModifiedType,

    /// A `one_of`/`not_in` value set contains null.
    #[error("null is not allowed in a value set")]
    NullInValueSet,

    /// Migration targets a version below the minimum.
    #[error("invalid migration to version {0}: minimum possible migration version is 2")]
    InvalidMigrationVersion(u32),

    /// Migration list has a gap or duplicate version.
    #[error(
        "invalid migrations: migrations cover versions up to {covered}, but the next migration \
         is to version {to_version}; migrations must be listed without gaps or duplicates"
    )]
    MigrationGap {
        /// Highest version covered so far.
        covered: u32,
        /// The out-of-sequence target version.
        to_version: u32,
    },

    /// Migrations cover versions beyond the schema version.
    #[error(
        "migrations can't be newer than schema: schema is version {schema_version} and \
         migrations cover range from {min_version} to {max_version}"
    )]
    MigrationsNewerThanSchema {
        /// The declared schema version.
        schema_version: u32,
        /// Lowest version migrations can start from.
        min_version: u32,
        /// Highest version migrations reach.
        max_version: u32,
    },

    /// Migrations stop short of the schema version.
    #[error(
        "missing migration: database schema is currently at version {schema_version}, but \
         migrations only cover range from {min_version} to {max_version}"
    )]
    MissingMigration {
        /// The declared schema version.
        schema_version: u32,
        /// Lowest version migrations can start from.
        min_version: u32,
        /// Highest version migrations reach.
        max_version: u32,
    },

    /// A join builder received something other than a `where_(..)` condition.
    #[error("on() requires a where(..) condition for the joined table")]
    InvalidJoinCondition,
}

/// Convenience alias for results with [`SchemaError`].
pub type Result<T> = std::result::Result<T, SchemaError>;
