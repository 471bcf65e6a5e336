//! Condition AST and query constructors.
//!
//! Conditions describe row filters and join predicates independently of SQL
//! text. A dialect crate compiles them into parameterized statements.
//!
//! The operators are designed to match SQLite comparison semantics exactly,
//! so that compiled queries and any in-memory evaluation yield the same
//! results:
//!
//! - `true` and `false` are equal to `1` and `0`
//! - `null`, `undefined`, and missing fields are equal
//! - columns can only be compared to values/other columns of the same type
//! - numeric comparisons (`<`, `<=`, `>`, `>=`, `between`) with null on
//!   either side always return false, e.g. `null < 2 == false`
//! - `null` on the right-hand side of `in`/`not in` is not allowed
//! - `null` on the left-hand side of `in`/`not in` always returns false
//!
//! # Examples
//!
//! ```
//! use tidewater_core::{QueryDescription, where_, on, gte, and, or};
//!
//! let description = QueryDescription::build(vec![
//!     where_("is_done", true),
//!     or(vec![
//!         where_("priority", gte(5)),
//!         where_("label", "urgent"),
//!     ]),
//!     on("projects", "is_archived", false),
//! ]);
//!
//! assert_eq!(description.wheres().len(), 2);
//! assert_eq!(description.joins().len(), 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

/// A literal scalar in a condition or record column.
///
/// `Null` stands for SQL null and for fields that are simply missing from a
/// record; the two are indistinguishable by design. Booleans compare as
/// `1`/`0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean, stored and compared as `1`/`0`.
    Bool(bool),
    /// Numeric value (integers and floats share one representation).
    Number(f64),
    /// Text value.
    String(String),
    /// SQL null / missing field.
    Null,
}

impl Value {
    /// Whether this is the null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(f64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Comparison operator of a condition leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equal (null-safe, `1 == true`, `0 == false`).
    Eq,
    /// Not equal (null-safe).
    NotEq,
    /// Greater than (SQLite semantics: `5 > null == false`).
    Gt,
    /// Greater than or equal (SQLite semantics).
    Gte,
    /// Greater than with nulls treated as smallest (`5 > null == true`).
    WeakGt,
    /// Less than (SQLite semantics).
    Lt,
    /// Less than or equal (SQLite semantics).
    Lte,
    /// Value is a member of a set.
    OneOf,
    /// Value is not a member of a set (`null not in (..) == false`).
    NotIn,
    /// Value lies between two bounds, inclusive.
    Between,
    /// SQL `like` pattern match.
    Like,
    /// SQL `not like` pattern match.
    NotLike,
}

/// Right-hand side of a comparison: a literal, another column, or a value
/// set for `one_of`/`not_in`/`between`.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonRight {
    /// A literal scalar.
    Value(Value),
    /// A column of the same table.
    Column(String),
    /// An ordered set of literals.
    Values(Vec<Value>),
}

impl From<Value> for ComparisonRight {
    fn from(v: Value) -> Self {
        ComparisonRight::Value(v)
    }
}

impl From<bool> for ComparisonRight {
    fn from(v: bool) -> Self {
        ComparisonRight::Value(v.into())
    }
}

impl From<f64> for ComparisonRight {
    fn from(v: f64) -> Self {
        ComparisonRight::Value(v.into())
    }
}

impl From<i64> for ComparisonRight {
    fn from(v: i64) -> Self {
        ComparisonRight::Value(v.into())
    }
}

impl From<i32> for ComparisonRight {
    fn from(v: i32) -> Self {
        ComparisonRight::Value(v.into())
    }
}

impl From<&str> for ComparisonRight {
    fn from(v: &str) -> Self {
        ComparisonRight::Value(v.into())
    }
}

impl From<String> for ComparisonRight {
    fn from(v: String) -> Self {
        ComparisonRight::Value(v.into())
    }
}

/// A single operator/right-hand-side pair, attached to a column by
/// [`where_`] or [`on`].
///
/// Constructed only through the operator functions in this module, so a
/// `Comparison` is well-formed by construction: `between` always carries
/// exactly two bounds, and `one_of`/`not_in` sets never contain null.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    operator: Operator,
    right: ComparisonRight,
}

impl Comparison {
    /// The comparison operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The right-hand side.
    pub fn right(&self) -> &ComparisonRight {
        &self.right
    }
}

impl From<Value> for Comparison {
    fn from(v: Value) -> Self {
        eq(v)
    }
}

impl From<bool> for Comparison {
    fn from(v: bool) -> Self {
        eq(v)
    }
}

impl From<f64> for Comparison {
    fn from(v: f64) -> Self {
        eq(v)
    }
}

impl From<i64> for Comparison {
    fn from(v: i64) -> Self {
        eq(v)
    }
}

impl From<i32> for Comparison {
    fn from(v: i32) -> Self {
        eq(v)
    }
}

impl From<&str> for Comparison {
    fn from(v: &str) -> Self {
        eq(v)
    }
}

impl From<String> for Comparison {
    fn from(v: String) -> Self {
        eq(v)
    }
}

/// Marks a comparison right-hand side as a column reference rather than a
/// literal.
///
/// # Examples
///
/// ```
/// use tidewater_core::{where_, gt, column};
///
/// // rows where `spent` exceeds the `budget` column of the same table
/// let condition = where_("spent", gt(column("budget")));
/// # let _ = condition;
/// ```
pub fn column(name: impl Into<String>) -> ComparisonRight {
    ComparisonRight::Column(name.into())
}

/// Equal (null-safe weak equality: `null == missing`, `1 == true`).
pub fn eq(right: impl Into<ComparisonRight>) -> Comparison {
    Comparison {
        operator: Operator::Eq,
        right: right.into(),
    }
}

/// Not equal (null-safe).
pub fn not_eq(right: impl Into<ComparisonRight>) -> Comparison {
    Comparison {
        operator: Operator::NotEq,
        right: right.into(),
    }
}

/// Greater than, SQLite semantics: `5 > null == false`.
pub fn gt(right: impl Into<ComparisonRight>) -> Comparison {
    Comparison {
        operator: Operator::Gt,
        right: right.into(),
    }
}

/// Greater than or equal, SQLite semantics.
pub fn gte(right: impl Into<ComparisonRight>) -> Comparison {
    Comparison {
        operator: Operator::Gte,
        right: right.into(),
    }
}

/// Greater than with nulls treated as smallest: `5 > null == true`.
///
/// Against a column right-hand side, the compiler rewrites this into an
/// `or` of a plain comparison and a null check, since the engine's `>`
/// returns unknown whenever either side is null.
pub fn weak_gt(right: impl Into<ComparisonRight>) -> Comparison {
    Comparison {
        operator: Operator::WeakGt,
        right: right.into(),
    }
}

/// Less than, SQLite semantics: `null < 5 == false`.
pub fn lt(right: impl Into<ComparisonRight>) -> Comparison {
    Comparison {
        operator: Operator::Lt,
        right: right.into(),
    }
}

/// Less than or equal, SQLite semantics.
pub fn lte(right: impl Into<ComparisonRight>) -> Comparison {
    Comparison {
        operator: Operator::Lte,
        right: right.into(),
    }
}

/// Membership in a value set (SQL `in`).
///
/// # Errors
///
/// Returns [`SchemaError::NullInValueSet`] if any element is null —
/// `null in (..)` would never match and indicates a bug in the caller.
///
/// # Examples
///
/// ```
/// use tidewater_core::{one_of, Value};
///
/// assert!(one_of(["todo", "doing"]).is_ok());
/// assert!(one_of([Value::from("todo"), Value::Null]).is_err());
/// ```
pub fn one_of<I, V>(values: I) -> Result<Comparison>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    if values.iter().any(Value::is_null) {
        return Err(SchemaError::NullInValueSet);
    }
    Ok(Comparison {
        operator: Operator::OneOf,
        right: ComparisonRight::Values(values),
    })
}

/// Non-membership in a value set (SQL `not in`).
///
/// # Errors
///
/// Returns [`SchemaError::NullInValueSet`] if any element is null.
pub fn not_in<I, V>(values: I) -> Result<Comparison>
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    if values.iter().any(Value::is_null) {
        return Err(SchemaError::NullInValueSet);
    }
    Ok(Comparison {
        operator: Operator::NotIn,
        right: ComparisonRight::Values(values),
    })
}

/// Value lies between `lower` and `upper`, inclusive on both ends.
pub fn between(lower: impl Into<Value>, upper: impl Into<Value>) -> Comparison {
    Comparison {
        operator: Operator::Between,
        right: ComparisonRight::Values(vec![lower.into(), upper.into()]),
    }
}

/// SQL `like` pattern match.
pub fn like(value: impl Into<Value>) -> Comparison {
    Comparison {
        operator: Operator::Like,
        right: ComparisonRight::Value(value.into()),
    }
}

/// SQL `not like` pattern match.
pub fn not_like(value: impl Into<Value>) -> Comparison {
    Comparison {
        operator: Operator::NotLike,
        right: ComparisonRight::Value(value.into()),
    }
}

/// Replaces every non-alphanumeric character with `_`, making a user-typed
/// string safe to embed in a `like` pattern.
///
/// # Examples
///
/// ```
/// use tidewater_core::sanitize_like_string;
///
/// assert_eq!(sanitize_like_string("jas%on"), "jas_on");
/// ```
pub fn sanitize_like_string(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// A declarative row filter or join predicate.
///
/// Child order inside [`And`](Condition::And)/[`Or`](Condition::Or) is
/// irrelevant for evaluation but preserved verbatim so that the compiled
/// SQL text is stable across runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A single column/comparison leaf.
    Where {
        /// Column the comparison applies to.
        left: String,
        /// Operator and right-hand side.
        comparison: Comparison,
    },
    /// All children must hold.
    And(Vec<Condition>),
    /// At least one child must hold.
    Or(Vec<Condition>),
    /// Predicate on a joined table.
    On {
        /// The joined table.
        table: String,
        /// Column of the joined table.
        left: String,
        /// Operator and right-hand side.
        comparison: Comparison,
    },
}

/// Builds a condition leaf for a column of the primary table.
///
/// A bare scalar second argument normalizes to [`eq`], so
/// `where_("is_done", true)` and `where_("is_done", eq(true))` are the same
/// condition — there is exactly one representation.
///
/// # Examples
///
/// ```
/// use tidewater_core::{where_, eq};
///
/// assert_eq!(where_("is_done", true), where_("is_done", eq(true)));
/// ```
pub fn where_(left: impl Into<String>, comparison: impl Into<Comparison>) -> Condition {
    Condition::Where {
        left: left.into(),
        comparison: comparison.into(),
    }
}

/// All conditions must hold.
pub fn and(conditions: Vec<Condition>) -> Condition {
    Condition::And(conditions)
}

/// At least one condition must hold.
pub fn or(conditions: Vec<Condition>) -> Condition {
    Condition::Or(conditions)
}

/// Builds a join predicate tying a joined table to the query.
///
/// Accepts a plain `(column, value)` pair or a comparison, like [`where_`].
/// To reuse an existing `where_(..)` result, see [`on_condition`].
pub fn on(
    table: impl Into<String>,
    left: impl Into<String>,
    comparison: impl Into<Comparison>,
) -> Condition {
    Condition::On {
        table: table.into(),
        left: left.into(),
        comparison: comparison.into(),
    }
}

/// Builds a join predicate from a nested `where_(..)` condition.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidJoinCondition`] if the condition is not a
/// [`Condition::Where`] leaf.
///
/// # Examples
///
/// ```
/// use tidewater_core::{on_condition, where_, and};
///
/// assert!(on_condition("projects", where_("is_archived", false)).is_ok());
/// assert!(on_condition("projects", and(vec![])).is_err());
/// ```
pub fn on_condition(table: impl Into<String>, condition: Condition) -> Result<Condition> {
    match condition {
        Condition::Where { left, comparison } => Ok(Condition::On {
            table: table.into(),
            left,
            comparison,
        }),
        _ => Err(SchemaError::InvalidJoinCondition),
    }
}

/// The conditions of one query, split into join predicates and row filters.
///
/// Built with [`QueryDescription::build`], which partitions
/// [`Condition::On`] predicates from the rest while preserving relative
/// order within each group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryDescription {
    joins: Vec<Condition>,
    wheres: Vec<Condition>,
}

impl QueryDescription {
    /// Partitions a condition list into join predicates and row filters.
    pub fn build(conditions: Vec<Condition>) -> Self {
        let (joins, wheres) = conditions
            .into_iter()
            .partition(|c| matches!(c, Condition::On { .. }));
        Self { joins, wheres }
    }

    /// Join predicates, in the order given.
    pub fn joins(&self) -> &[Condition] {
        &self.joins
    }

    /// Row filters, in the order given.
    pub fn wheres(&self) -> &[Condition] {
        &self.wheres
    }

    /// Whether the description carries no conditions at all.
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty() && self.wheres.is_empty()
    }
}
