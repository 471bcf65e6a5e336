//! Database initialization state machine.
//!
//! [`SqliteAdapter`] inspects a live database and brings it from any
//! state — including a completely empty file — to the current schema
//! version:
//!
//! 1. **bootstrap missing** — create the `versions` and
//!    `executed_migrations` bookkeeping tables
//! 2. **schema missing** — create the full application schema and record
//!    the target version
//! 3. **schema outdated** — resolve and apply the pending migration
//!    steps, checkpoint every newly covered version, record the target
//!    version
//! 4. **up to date** — nothing to do
//!
//! [`init`](SqliteAdapter::init) loops re-evaluating the status after
//! each stage, so a fresh database walks all the way to "up to date" in
//! one call. Each stage runs inside its own transaction: a failure leaves
//! the database at the pre-stage state and the whole pass can be retried
//! from the top. Re-running against an up-to-date database is a no-op.
//!
//! # Examples
//!
//! ```no_run
//! use tidewater_core::{app_schema, table_schema, ColumnSchema, ColumnType};
//! use tidewater_sqlite::SqliteAdapter;
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
//! let mut adapter = SqliteAdapter::open("app.db", schema, None).unwrap();
//! adapter.init().unwrap();
//! ```

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, params};
use tidewater_core::{
    AppSchema, EXECUTED_MIGRATIONS_TABLE, SchemaError, SchemaMigrations, VERSIONS_TABLE,
    bootstrap_schema,
};
use tracing::{debug, info};

use crate::error::{Result, SqliteError};
use crate::schema::{encode_migration_steps, encode_schema};
use crate::value::encode_name;

/// Floor for bookkeeping row ids when the table is empty.
pub const MIN_ID: i64 = 1_000_000;

/// Initialization status of a database, derived at runtime from the
/// bookkeeping tables. Never persisted as such.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    /// Bookkeeping tables are absent; the database is brand new.
    DefaultSchemaNeeded,
    /// Bookkeeping tables exist but no schema version was ever recorded.
    SchemaNeeded,
    /// A schema version older than the target is recorded.
    MigrationsNeeded {
        /// The recorded version to migrate from.
        from_version: u32,
    },
    /// The recorded version matches the target.
    Ok,
}

/// Drives a SQLite database to the declared schema version.
///
/// Owns the connection; `init` takes `&mut self`, so only one
/// initialization pass per handle can run at a time.
pub struct SqliteAdapter {
    conn: Connection,
    schema: AppSchema,
    migrations: Option<SchemaMigrations>,
}

impl SqliteAdapter {
    /// Wraps an already-open connection.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] when migrations are declared but their
    /// covered range does not end exactly at the schema version — newer
    /// migrations indicate a stale schema declaration, older ones a
    /// missing migration.
    pub fn new(
        conn: Connection,
        schema: AppSchema,
        migrations: Option<SchemaMigrations>,
    ) -> Result<Self> {
        if let Some(migrations) = &migrations {
            if migrations.max_version() > schema.version() {
                return Err(SchemaError::MigrationsNewerThanSchema {
                    schema_version: schema.version(),
                    min_version: migrations.min_version(),
                    max_version: migrations.max_version(),
                }
                .into());
            }
            if migrations.max_version() != schema.version() {
                return Err(SchemaError::MissingMigration {
                    schema_version: schema.version(),
                    min_version: migrations.min_version(),
                    max_version: migrations.max_version(),
                }
                .into());
            }
        }
        Ok(Self {
            conn,
            schema,
            migrations,
        })
    }

    /// Opens (or creates) a database file and wraps it.
    pub fn open(
        path: impl AsRef<Path>,
        schema: AppSchema,
        migrations: Option<SchemaMigrations>,
    ) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::new(conn, schema, migrations)
    }

    /// Opens a shared-cache in-memory database named by the given tag.
    ///
    /// The tag is an explicit caller-supplied identifier; two adapters
    /// using the same tag see the same database for as long as at least
    /// one of them stays open.
    pub fn open_test(
        tag: &str,
        schema: AppSchema,
        migrations: Option<SchemaMigrations>,
    ) -> Result<Self> {
        let conn = Connection::open(format!("file:testdb_{tag}?mode=memory&cache=shared"))?;
        Self::new(conn, schema, migrations)
    }

    /// The target schema.
    pub fn schema(&self) -> &AppSchema {
        &self.schema
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the adapter and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Brings the database to the target schema version.
    ///
    /// Loops over [`database_status`](Self::database_status), handling one
    /// stage per iteration, until the database reports
    /// [`InitStatus::Ok`]. Safe to re-run at any time; an up-to-date
    /// database is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::MigrationRange`] when the recorded version
    /// cannot be migrated from (fatal configuration error), or a
    /// [`SqliteError::Database`] on engine failures, after which the
    /// whole pass may be retried.
    pub fn init(&mut self) -> Result<()> {
        debug!(
            version = self.schema.version(),
            "setting up database with schema version"
        );

        loop {
            match self.database_status()? {
                InitStatus::DefaultSchemaNeeded => self.apply_default_schema()?,
                InitStatus::SchemaNeeded => self.apply_schema()?,
                InitStatus::MigrationsNeeded { from_version } => {
                    self.apply_migrations(from_version)?;
                }
                InitStatus::Ok => break,
            }
        }

        debug!("database schema up to date");
        Ok(())
    }

    /// Derives the initialization status from the bookkeeping tables.
    pub fn database_status(&self) -> Result<InitStatus> {
        if !self.has_bookkeeping_tables()? {
            return Ok(InitStatus::DefaultSchemaNeeded);
        }

        let version = self.database_version()?;
        Ok(if version == 0 {
            InitStatus::SchemaNeeded
        } else if version < self.schema.version() {
            InitStatus::MigrationsNeeded {
                from_version: version,
            }
        } else {
            InitStatus::Ok
        })
    }

    /// The schema version currently recorded in the database, 0 when none
    /// was ever recorded.
    pub fn database_version(&self) -> Result<u32> {
        let version: Option<i64> = self.conn.query_row(
            &format!(
                "select max({}) from {}",
                encode_name("version"),
                encode_name(VERSIONS_TABLE)
            ),
            [],
            |row| row.get(0),
        )?;
        Ok(version.unwrap_or(0) as u32)
    }

    /// The newest migration checkpoint, 0 when no migration ever ran.
    pub fn last_executed_migration(&self) -> Result<u32> {
        let migration: Option<i64> = self.conn.query_row(
            &format!(
                "select max({}) from {}",
                encode_name("migration"),
                encode_name(EXECUTED_MIGRATIONS_TABLE)
            ),
            [],
            |row| row.get(0),
        )?;
        Ok(migration.unwrap_or(0) as u32)
    }

    fn has_bookkeeping_tables(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "select count(*) from sqlite_master where type = 'table' and name = ?1",
            [VERSIONS_TABLE],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn apply_default_schema(&mut self) -> Result<()> {
        debug!("bookkeeping tables missing, applying bootstrap schema");
        let ddl = encode_schema(&bootstrap_schema());
        let tx = self.conn.transaction()?;
        tx.execute_batch(&ddl)?;
        tx.commit()?;
        Ok(())
    }

    fn apply_schema(&mut self) -> Result<()> {
        info!(version = self.schema.version(), "creating database schema");
        let ddl = encode_schema(&self.schema);
        let version = self.schema.version();
        let tx = self.conn.transaction()?;
        tx.execute_batch(&ddl)?;
        record_schema_version(&tx, version)?;
        tx.commit()?;
        Ok(())
    }

    fn apply_migrations(&mut self, from_version: u32) -> Result<()> {
        let to_version = self.schema.version();
        let steps = self
            .migrations
            .as_ref()
            .and_then(|migrations| migrations.steps_for_migration(from_version, to_version))
            .ok_or(SqliteError::MigrationRange {
                from: from_version,
                to: to_version,
            })?;

        info!(
            from = from_version,
            to = to_version,
            steps = steps.len(),
            "migrating database"
        );

        let ddl = encode_migration_steps(&steps);
        let tx = self.conn.transaction()?;
        tx.execute_batch(&ddl)?;
        // One checkpoint per newly covered version, so partial coverage is
        // visible if a later migration set shrinks the range.
        for version in (from_version + 1)..=to_version {
            record_executed_migration(&tx, version)?;
        }
        record_schema_version(&tx, to_version)?;
        tx.commit()?;

        info!("migration successful");
        Ok(())
    }
}

/// Allocates the next bookkeeping row id: `max(id) + 1`, or [`MIN_ID`]
/// when the table is empty.
fn next_id(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    let id: Option<i64> = conn.query_row(
        &format!("select max(\"id\") + 1 from {}", encode_name(table)),
        [],
        |row| row.get(0),
    )?;
    Ok(id.unwrap_or(MIN_ID))
}

fn record_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    let id = next_id(conn, VERSIONS_TABLE)?;
    let now = Utc::now().timestamp_millis();
    conn.execute(
        &format!(
            "insert into {} (\"id\", \"version\", \"created_at\", \"updated_at\") values (?1, ?2, ?3, ?4)",
            encode_name(VERSIONS_TABLE)
        ),
        params![id, i64::from(version), now, now],
    )?;
    Ok(())
}

fn record_executed_migration(conn: &Connection, migration: u32) -> rusqlite::Result<()> {
    let id = next_id(conn, EXECUTED_MIGRATIONS_TABLE)?;
    let now = Utc::now().timestamp_millis();
    conn.execute(
        &format!(
            "insert into {} (\"id\", \"migration\", \"created_at\", \"updated_at\") values (?1, ?2, ?3, ?4)",
            encode_name(EXECUTED_MIGRATIONS_TABLE)
        ),
        params![id, i64::from(migration), now, now],
    )?;
    Ok(())
}
