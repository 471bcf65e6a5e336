//! Versioned schema model: tables, columns, and the app schema.
//!
//! Descriptors validate eagerly at construction and are immutable
//! afterwards, so every encoder can assume well-formed input. Declaration
//! order of tables and columns is preserved — generated DDL text must be
//! stable across runs.
//!
//! Every table implicitly gains `id`, `created_at`, and `updated_at`
//! columns when encoded, which is why those names are reserved here.
//!
//! # Examples
//!
//! ```
//! use tidewater_core::{app_schema, table_schema, ColumnSchema, ColumnType};
//!
//! let schema = app_schema(
//!     1,
//!     vec![table_schema(
//!         "posts",
//!         vec![
//!             ColumnSchema::new("title", ColumnType::String).indexed(),
//!             ColumnSchema::new("word_count", ColumnType::Number),
//!         ],
//!     )
//!     .unwrap()],
//! )
//! .unwrap();
//!
//! assert_eq!(schema.version(), 1);
//! assert!(schema.table("posts").is_some());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

/// Name of the bookkeeping table recording applied schema versions.
pub const VERSIONS_TABLE: &str = "versions";

/// Name of the bookkeeping table recording migration checkpoints.
pub const EXECUTED_MIGRATIONS_TABLE: &str = "executed_migrations";

const RESERVED_COLUMN_NAMES: [&str; 3] = ["id", "created_at", "updated_at"];

/// Type of a user-declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Text column.
    String,
    /// Numeric column (also used for timestamps).
    Number,
    /// Boolean column, stored as `1`/`0`.
    Boolean,
}

/// A single user-declared column.
///
/// # Examples
///
/// ```
/// use tidewater_core::{ColumnSchema, ColumnType};
///
/// let column = ColumnSchema::new("author_id", ColumnType::String).indexed();
/// assert!(column.is_indexed);
/// assert!(!column.is_optional);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether an index is created for this column.
    #[serde(default)]
    pub is_indexed: bool,
    /// Whether the column may hold null.
    #[serde(default)]
    pub is_optional: bool,
}

impl ColumnSchema {
    /// Creates a required, unindexed column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            is_indexed: false,
            is_optional: false,
        }
    }

    /// Marks the column as indexed.
    pub fn indexed(mut self) -> Self {
        self.is_indexed = true;
        self
    }

    /// Marks the column as nullable.
    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }
}

/// Checks the naming and typing invariants of a single column.
pub(crate) fn validate_column_schema(column: &ColumnSchema) -> Result<()> {
    if column.name.is_empty() {
        return Err(SchemaError::MissingColumnName);
    }
    if RESERVED_COLUMN_NAMES.contains(&column.name.as_str()) {
        return Err(SchemaError::ReservedColumnName(column.name.clone()));
    }
    if column.name == "last_modified" && column.column_type != ColumnType::Number {
        return Err(SchemaError::InvalidLastModifiedType);
    }
    Ok(())
}

#[derive(Deserialize)]
struct TableSchemaDecl {
    name: String,
    columns: Vec<ColumnSchema>,
}

/// An immutable, validated table description.
///
/// Built with [`table_schema`]; deserializing runs the same validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableSchemaDecl")]
pub struct TableSchema {
    name: String,
    columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared columns, in declaration order.
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl TryFrom<TableSchemaDecl> for TableSchema {
    type Error = SchemaError;

    fn try_from(decl: TableSchemaDecl) -> Result<Self> {
        table_schema(decl.name, decl.columns)
    }
}

/// Builds a validated table description.
///
/// # Errors
///
/// Returns a [`SchemaError`] when the name is empty, a column fails the
/// naming/typing invariants, or two columns share a name.
pub fn table_schema(name: impl Into<String>, columns: Vec<ColumnSchema>) -> Result<TableSchema> {
    let name = name.into();
    if name.is_empty() {
        return Err(SchemaError::MissingTableName);
    }
    for (index, column) in columns.iter().enumerate() {
        validate_column_schema(column)?;
        if columns[..index].iter().any(|c| c.name == column.name) {
            return Err(SchemaError::DuplicateColumn {
                table: name.clone(),
                column: column.name.clone(),
            });
        }
    }
    Ok(TableSchema { name, columns })
}

#[derive(Deserialize)]
struct AppSchemaDecl {
    version: u32,
    tables: Vec<TableSchema>,
}

/// The complete, versioned application schema.
///
/// Immutable once constructed; a schema change requires a new version plus
/// a matching migration entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AppSchemaDecl")]
pub struct AppSchema {
    version: u32,
    tables: Vec<TableSchema>,
}

impl AppSchema {
    /// The declared schema version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Declared tables, in declaration order.
    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }
}

impl TryFrom<AppSchemaDecl> for AppSchema {
    type Error = SchemaError;

    fn try_from(decl: AppSchemaDecl) -> Result<Self> {
        app_schema(decl.version, decl.tables)
    }
}

/// Builds a validated app schema.
///
/// # Errors
///
/// Returns a [`SchemaError`] when the version is zero or two tables share
/// a name.
pub fn app_schema(version: u32, tables: Vec<TableSchema>) -> Result<AppSchema> {
    if version == 0 {
        return Err(SchemaError::InvalidSchemaVersion);
    }
    for (index, table) in tables.iter().enumerate() {
        if tables[..index].iter().any(|t| t.name == table.name) {
            return Err(SchemaError::DuplicateTable(table.name.clone()));
        }
    }
    Ok(AppSchema { version, tables })
}

/// The fixed bootstrap schema creating the two bookkeeping tables.
///
/// Applied to a fresh database before anything else, so that schema
/// versions and migration checkpoints can be recorded.
pub fn bootstrap_schema() -> AppSchema {
    AppSchema {
        version: 1,
        tables: vec![
            TableSchema {
                name: VERSIONS_TABLE.to_string(),
                columns: vec![ColumnSchema::new("version", ColumnType::Number).indexed()],
            },
            TableSchema {
                name: EXECUTED_MIGRATIONS_TABLE.to_string(),
                columns: vec![ColumnSchema::new("migration", ColumnType::Number).indexed()],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title_column() -> ColumnSchema {
        ColumnSchema::new("title", ColumnType::String)
    }

    #[test]
    fn test_table_schema_valid() {
        let table = table_schema("posts", vec![title_column()]).unwrap();
        assert_eq!(table.name(), "posts");
        assert_eq!(table.columns().len(), 1);
        assert!(table.column("title").is_some());
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn test_table_schema_rejects_empty_name() {
        assert_eq!(
            table_schema("", vec![title_column()]),
            Err(SchemaError::MissingTableName)
        );
    }

    #[test]
    fn test_reserved_column_names_rejected() {
        for reserved in ["id", "created_at", "updated_at"] {
            let result = table_schema(
                "posts",
                vec![ColumnSchema::new(reserved, ColumnType::Number)],
            );
            assert_eq!(
                result,
                Err(SchemaError::ReservedColumnName(reserved.to_string()))
            );
        }
    }

    #[test]
    fn test_last_modified_must_be_number() {
        let bad = table_schema(
            "posts",
            vec![ColumnSchema::new("last_modified", ColumnType::String)],
        );
        assert_eq!(bad, Err(SchemaError::InvalidLastModifiedType));

        let good = table_schema(
            "posts",
            vec![ColumnSchema::new("last_modified", ColumnType::Number)],
        );
        assert!(good.is_ok());
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let result = table_schema("posts", vec![title_column(), title_column()]);
        assert_eq!(
            result,
            Err(SchemaError::DuplicateColumn {
                table: "posts".into(),
                column: "title".into(),
            })
        );
    }

    #[test]
    fn test_app_schema_rejects_version_zero() {
        assert_eq!(app_schema(0, vec![]), Err(SchemaError::InvalidSchemaVersion));
    }

    #[test]
    fn test_app_schema_rejects_duplicate_tables() {
        let table = table_schema("posts", vec![title_column()]).unwrap();
        let result = app_schema(1, vec![table.clone(), table]);
        assert_eq!(result, Err(SchemaError::DuplicateTable("posts".into())));
    }

    #[test]
    fn test_bootstrap_schema_shape() {
        let schema = bootstrap_schema();
        assert_eq!(schema.version(), 1);
        assert!(schema.table(VERSIONS_TABLE).is_some());
        assert!(schema.table(EXECUTED_MIGRATIONS_TABLE).is_some());

        let versions = schema.table(VERSIONS_TABLE).unwrap();
        let version_column = versions.column("version").unwrap();
        assert_eq!(version_column.column_type, ColumnType::Number);
        assert!(version_column.is_indexed);
    }

    #[test]
    fn test_table_schema_deserialization_validates() {
        let good: std::result::Result<TableSchema, _> = serde_json::from_str(
            r#"{"name": "posts", "columns": [{"name": "title", "type": "string", "isIndexed": true}]}"#,
        );
        let table = good.unwrap();
        assert!(table.column("title").unwrap().is_indexed);

        // Reserved column name fails at deserialization, not later.
        let bad: std::result::Result<TableSchema, _> = serde_json::from_str(
            r#"{"name": "posts", "columns": [{"name": "id", "type": "string"}]}"#,
        );
        assert!(bad.is_err());

        // Unknown column type fails at deserialization.
        let unknown: std::result::Result<TableSchema, _> = serde_json::from_str(
            r#"{"name": "posts", "columns": [{"name": "title", "type": "blob"}]}"#,
        );
        assert!(unknown.is_err());
    }
}
