//! Migration model and range resolver.
//!
//! Every schema version bump ships a [`Migration`] describing how to bring
//! an older database up to that version. [`schema_migrations`] validates
//! the whole set eagerly — version range, contiguity, and the column
//! invariants of every step — and the resulting [`SchemaMigrations`] value
//! is the proof of that validation: it cannot be constructed any other way.
//!
//! # Examples
//!
//! ```
//! use tidewater_core::{
//!     add_columns, create_table, schema_migrations, ColumnSchema, ColumnType, Migration,
//! };
//!
//! let migrations = schema_migrations(vec![
//!     Migration {
//!         to_version: 2,
//!         steps: vec![add_columns(
//!             "posts",
//!             vec![ColumnSchema::new("subtitle", ColumnType::String).optional()],
//!         )
//!         .unwrap()],
//!     },
//!     Migration {
//!         to_version: 3,
//!         steps: vec![create_table(
//!             "comments",
//!             vec![ColumnSchema::new("body", ColumnType::String)],
//!         )
//!         .unwrap()],
//!     },
//! ])
//! .unwrap();
//!
//! assert_eq!(migrations.min_version(), 1);
//! assert_eq!(migrations.max_version(), 3);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::schema::{ColumnSchema, validate_column_schema};

/// One schema-altering operation, tagged to the migration that carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MigrationStep {
    /// Creates a new table (implicit columns included).
    CreateTable {
        /// Name of the new table.
        name: String,
        /// User-declared columns.
        columns: Vec<ColumnSchema>,
    },
    /// Adds columns to an existing table, with a type-derived backfill.
    AddColumns {
        /// Table to alter.
        table: String,
        /// Columns to add.
        columns: Vec<ColumnSchema>,
    },
}

fn validate_step_columns(table: &str, columns: &[ColumnSchema]) -> Result<()> {
    if table.is_empty() {
        return Err(SchemaError::MissingTableName);
    }
    for (index, column) in columns.iter().enumerate() {
        validate_column_schema(column)?;
        if columns[..index].iter().any(|c| c.name == column.name) {
            return Err(SchemaError::DuplicateColumn {
                table: table.to_string(),
                column: column.name.clone(),
            });
        }
    }
    Ok(())
}

fn validate_step(step: &MigrationStep) -> Result<()> {
    match step {
        MigrationStep::CreateTable { name, columns } => validate_step_columns(name, columns),
        MigrationStep::AddColumns { table, columns } => validate_step_columns(table, columns),
    }
}

/// Builds a validated create-table migration step.
///
/// # Errors
///
/// Returns a [`SchemaError`] when the name is empty or a column fails the
/// same invariants as [`table_schema`](crate::table_schema) columns.
pub fn create_table(name: impl Into<String>, columns: Vec<ColumnSchema>) -> Result<MigrationStep> {
    let step = MigrationStep::CreateTable {
        name: name.into(),
        columns,
    };
    validate_step(&step)?;
    Ok(step)
}

/// Builds a validated add-columns migration step.
///
/// # Errors
///
/// Returns a [`SchemaError`] when the table name is empty or a column
/// fails the naming/typing invariants.
pub fn add_columns(table: impl Into<String>, columns: Vec<ColumnSchema>) -> Result<MigrationStep> {
    let step = MigrationStep::AddColumns {
        table: table.into(),
        columns,
    };
    validate_step(&step)?;
    Ok(step)
}

/// The steps needed to migrate a database to `to_version` from the version
/// directly below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Migration {
    /// Schema version this migration produces. Minimum 2.
    pub to_version: u32,
    /// Steps to apply, in order.
    pub steps: Vec<MigrationStep>,
}

#[derive(Deserialize)]
struct SchemaMigrationsDecl {
    migrations: Vec<Migration>,
}

/// A validated, ordered set of migrations.
///
/// Only [`schema_migrations`] can construct this type; holding a value is
/// proof that the set is sorted, contiguous, and step-valid — the
/// precondition the initialization state machine relies on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "SchemaMigrationsDecl")]
pub struct SchemaMigrations {
    sorted_migrations: Vec<Migration>,
    min_version: u32,
    max_version: u32,
}

impl SchemaMigrations {
    /// Migrations sorted ascending by target version.
    pub fn migrations(&self) -> &[Migration] {
        &self.sorted_migrations
    }

    /// Lowest database version this set can migrate from.
    pub fn min_version(&self) -> u32 {
        self.min_version
    }

    /// Highest schema version this set can migrate to.
    pub fn max_version(&self) -> u32 {
        self.max_version
    }

    /// Resolves the steps needed to move a database between two versions.
    ///
    /// Returns `None` when the requested range is not covered — the caller
    /// cannot migrate incrementally and must recreate the schema from
    /// scratch. Otherwise the steps of every migration whose target lies
    /// in `(from_version, to_version]` are flattened in ascending version
    /// order, preserving per-migration step order. Applying steps out of
    /// version order can violate the assumptions of later steps.
    pub fn steps_for_migration(
        &self,
        from_version: u32,
        to_version: u32,
    ) -> Option<Vec<MigrationStep>> {
        if from_version < self.min_version || to_version > self.max_version {
            return None;
        }

        Some(
            self.sorted_migrations
                .iter()
                .filter(|m| m.to_version > from_version && m.to_version <= to_version)
                .flat_map(|m| m.steps.iter().cloned())
                .collect(),
        )
    }
}

impl TryFrom<SchemaMigrationsDecl> for SchemaMigrations {
    type Error = SchemaError;

    fn try_from(decl: SchemaMigrationsDecl) -> Result<Self> {
        schema_migrations(decl.migrations)
    }
}

/// Builds a validated migration set.
///
/// Sorts the migrations by target version and derives the covered range:
/// `min_version` is one below the oldest target (1 when empty) and
/// `max_version` is the newest target (1 when empty).
///
/// # Errors
///
/// Returns a [`SchemaError`] when a migration targets a version below 2,
/// the sorted versions have a gap or duplicate, or any step fails the
/// column invariants.
pub fn schema_migrations(migrations: Vec<Migration>) -> Result<SchemaMigrations> {
    for migration in &migrations {
        if migration.to_version < 2 {
            return Err(SchemaError::InvalidMigrationVersion(migration.to_version));
        }
        for step in &migration.steps {
            validate_step(step)?;
        }
    }

    let mut sorted_migrations = migrations;
    sorted_migrations.sort_by_key(|m| m.to_version);

    for pair in sorted_migrations.windows(2) {
        if pair[1].to_version != pair[0].to_version + 1 {
            return Err(SchemaError::MigrationGap {
                covered: pair[0].to_version,
                to_version: pair[1].to_version,
            });
        }
    }

    let min_version = sorted_migrations.first().map_or(1, |m| m.to_version - 1);
    let max_version = sorted_migrations.last().map_or(1, |m| m.to_version);

    Ok(SchemaMigrations {
        sorted_migrations,
        min_version,
        max_version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    fn subtitle_step() -> MigrationStep {
        add_columns(
            "posts",
            vec![ColumnSchema::new("subtitle", ColumnType::String).optional()],
        )
        .unwrap()
    }

    fn comments_step() -> MigrationStep {
        create_table(
            "comments",
            vec![ColumnSchema::new("body", ColumnType::String)],
        )
        .unwrap()
    }

    fn migration(to_version: u32, steps: Vec<MigrationStep>) -> Migration {
        Migration { to_version, steps }
    }

    #[test]
    fn test_empty_set_covers_version_one() {
        let set = schema_migrations(vec![]).unwrap();
        assert_eq!(set.min_version(), 1);
        assert_eq!(set.max_version(), 1);
    }

    #[test]
    fn test_set_is_sorted_and_ranged() {
        let set = schema_migrations(vec![
            migration(3, vec![comments_step()]),
            migration(2, vec![subtitle_step()]),
        ])
        .unwrap();

        assert_eq!(set.min_version(), 1);
        assert_eq!(set.max_version(), 3);
        assert_eq!(set.migrations()[0].to_version, 2);
        assert_eq!(set.migrations()[1].to_version, 3);
    }

    #[test]
    fn test_gap_rejected() {
        let result = schema_migrations(vec![
            migration(2, vec![]),
            migration(3, vec![]),
            migration(5, vec![]),
        ]);
        assert_eq!(
            result,
            Err(SchemaError::MigrationGap {
                covered: 3,
                to_version: 5,
            })
        );
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = schema_migrations(vec![migration(2, vec![]), migration(2, vec![])]);
        assert_eq!(
            result,
            Err(SchemaError::MigrationGap {
                covered: 2,
                to_version: 2,
            })
        );
    }

    #[test]
    fn test_version_below_two_rejected() {
        let result = schema_migrations(vec![migration(1, vec![])]);
        assert_eq!(result, Err(SchemaError::InvalidMigrationVersion(1)));
    }

    #[test]
    fn test_step_columns_validated() {
        let bad_step = MigrationStep::AddColumns {
            table: "posts".into(),
            columns: vec![ColumnSchema::new("id", ColumnType::String)],
        };
        let result = schema_migrations(vec![migration(2, vec![bad_step])]);
        assert_eq!(result, Err(SchemaError::ReservedColumnName("id".into())));
    }

    #[test]
    fn test_steps_for_migration_flattens_in_order() {
        let set = schema_migrations(vec![
            migration(2, vec![subtitle_step()]),
            migration(3, vec![comments_step()]),
        ])
        .unwrap();

        let steps = set.steps_for_migration(1, 3).unwrap();
        assert_eq!(steps, vec![subtitle_step(), comments_step()]);

        let partial = set.steps_for_migration(2, 3).unwrap();
        assert_eq!(partial, vec![comments_step()]);
    }

    #[test]
    fn test_steps_for_migration_out_of_range() {
        let set = schema_migrations(vec![
            migration(3, vec![comments_step()]),
            migration(4, vec![]),
        ])
        .unwrap();
        assert_eq!(set.min_version(), 2);

        // below the covered range
        assert!(set.steps_for_migration(1, 4).is_none());
        // beyond the covered range
        assert!(set.steps_for_migration(2, 5).is_none());
        // inside the covered range
        assert!(set.steps_for_migration(2, 4).is_some());
    }

    #[test]
    fn test_constructor_rejects_reserved_columns() {
        assert!(
            create_table("posts", vec![ColumnSchema::new("id", ColumnType::String)]).is_err()
        );
        assert!(
            add_columns(
                "posts",
                vec![ColumnSchema::new("created_at", ColumnType::Number)]
            )
            .is_err()
        );
    }

    #[test]
    fn test_migration_step_serde_tags() {
        let step = subtitle_step();
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["type"], "add_columns");
        assert_eq!(json["table"], "posts");

        let back: MigrationStep = serde_json::from_value(json).unwrap();
        assert_eq!(back, step);

        let unknown: std::result::Result<MigrationStep, _> =
            serde_json::from_str(r#"{"type": "rename_table", "table": "posts"}"#);
        assert!(unknown.is_err());
    }
}
