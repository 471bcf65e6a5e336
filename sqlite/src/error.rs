//! Error types for the SQLite dialect.
//!
//! Construction failures surface as [`SchemaError`]; engine failures are
//! propagated unchanged so callers can retry a whole initialization pass.

use thiserror::Error;
use tidewater_core::SchemaError;

/// Errors that can occur while encoding for or driving a SQLite database.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// Malformed schema, migration, or condition input.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// SQLite connection or statement failure, propagated unchanged.
    /// Each initialization stage is transactional, so retrying the whole
    /// pass after one of these is safe.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The configured migrations do not cover the requested version range.
    /// Not retriable: the database cannot be migrated incrementally.
    #[error(
        "no migration path from version {from} to version {to}: \
         the migration set does not cover this range"
    )]
    MigrationRange {
        /// Version currently recorded in the database.
        from: u32,
        /// Target schema version.
        to: u32,
    },
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
