//! Condition-to-SQL compiler.
//!
//! Compiles a [`QueryDescription`] into a single SQL fragment plus an
//! ordered parameter list. The compiler is a pure function and is total
//! over well-formed input — every failure mode is caught at construction
//! time in `tidewater-core`.
//!
//! Equality compiles to `is` / `is not` rather than `=` / `<>`: SQLite's
//! `is` treats null as equal to null, which the condition semantics
//! require. Plain `>` / `<` return unknown against null, which already
//! matches the declared "numeric comparison with null is false" rule, so
//! those compile directly.
//!
//! # Examples
//!
//! ```
//! use tidewater_core::{Value, where_};
//! use tidewater_sqlite::{QueryPlan, encode_query};
//!
//! let plan = QueryPlan::new("tasks", vec![where_("is_done", true)]);
//! let query = encode_query(&plan);
//!
//! assert_eq!(
//!     query.sql,
//!     r#"select "tasks".* from "tasks" where "tasks"."is_done" is ?"#
//! );
//! assert_eq!(query.params, vec![Value::Bool(true)]);
//! ```

use tidewater_core::{
    Comparison, ComparisonRight, Condition, Operator, QueryDescription, Value, and, column, gt,
    not_eq, or, where_,
};

use crate::value::encode_name;

/// How a joined table relates to the primary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssociationKind {
    /// Each primary row points at one joined row (`joined.id = main.key`).
    BelongsTo {
        /// Foreign-key column on the primary table.
        key: String,
    },
    /// Many joined rows can point at one primary row
    /// (`joined.foreign_key = main.id`). Forces `distinct` on the outer
    /// select, since the join can multiply result rows.
    HasMany {
        /// Foreign-key column on the joined table.
        foreign_key: String,
    },
}

/// A query ready for compilation: primary table, conditions, and the
/// association kind of every joined table.
///
/// Associations come from whatever record layer sits above this crate;
/// the compiler only inspects them to emit join equations and decide
/// whether `distinct` is required.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Primary table of the query.
    pub table: String,
    /// Join predicates and row filters.
    pub description: QueryDescription,
    /// Association kind per joined table.
    pub associations: Vec<(String, AssociationKind)>,
}

impl QueryPlan {
    /// Builds a plan from a raw condition list, partitioning join
    /// predicates from row filters.
    pub fn new(table: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self {
            table: table.into(),
            description: QueryDescription::build(conditions),
            associations: Vec::new(),
        }
    }

    /// Declares the association kind of a joined table.
    pub fn association(mut self, table: impl Into<String>, kind: AssociationKind) -> Self {
        self.associations.push((table.into(), kind));
        self
    }
}

/// A compiled statement: SQL text with positional `?` placeholders and the
/// matching parameters, left to right.
///
/// Serializable, so compiled statements can be cached keyed by their text.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SqlQuery {
    /// Statement text.
    pub sql: String,
    /// Bound parameters in placeholder order.
    pub params: Vec<Value>,
}

#[derive(Debug, Default)]
struct Fragment {
    sql: String,
    params: Vec<Value>,
}

fn operator_token(operator: Operator) -> &'static str {
    match operator {
        Operator::Eq => "is",
        Operator::NotEq => "is not",
        // WeakGt reaches here only with a literal right-hand side, where
        // plain `>` already gives the declared semantics.
        Operator::Gt | Operator::WeakGt => ">",
        Operator::Gte => ">=",
        Operator::Lt => "<",
        Operator::Lte => "<=",
        Operator::OneOf => "in",
        Operator::NotIn => "not in",
        Operator::Between => "between",
        Operator::Like => "like",
        Operator::NotLike => "not like",
    }
}

fn encode_comparison_right(table: &str, right: &ComparisonRight, fragment: &mut Fragment) {
    match right {
        ComparisonRight::Value(value) => {
            fragment.sql.push('?');
            fragment.params.push(value.clone());
        }
        ComparisonRight::Column(name) => {
            fragment.sql.push_str(&encode_name(table));
            fragment.sql.push('.');
            fragment.sql.push_str(&encode_name(name));
        }
        ComparisonRight::Values(values) => {
            fragment.sql.push('(');
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    fragment.sql.push_str(", ");
                }
                fragment.sql.push('?');
                fragment.params.push(value.clone());
            }
            fragment.sql.push(')');
        }
    }
}

fn encode_comparison(table: &str, comparison: &Comparison, fragment: &mut Fragment) {
    if comparison.operator() == Operator::Between {
        if let ComparisonRight::Values(bounds) = comparison.right() {
            fragment.sql.push_str("between ? and ?");
            fragment.params.extend(bounds.iter().cloned());
        }
        return;
    }

    fragment.sql.push_str(operator_token(comparison.operator()));
    fragment.sql.push(' ');
    encode_comparison_right(table, comparison.right(), fragment);
}

fn encode_where_condition(table: &str, left: &str, comparison: &Comparison) -> Fragment {
    // `weakGt` against a column cannot compile to plain `>`: that returns
    // unknown whenever either side is null, but the declared semantics
    // treat null as smaller than everything. Rewrite recursively.
    if comparison.operator() == Operator::WeakGt {
        if let ComparisonRight::Column(right_column) = comparison.right() {
            let rewritten = or(vec![
                where_(left, gt(column(right_column.clone()))),
                and(vec![
                    where_(left, not_eq(Value::Null)),
                    where_(right_column.clone(), Value::Null),
                ]),
            ]);
            return encode_condition(table, &rewritten);
        }
    }

    let mut fragment = Fragment::default();
    fragment.sql.push_str(&encode_name(table));
    fragment.sql.push('.');
    fragment.sql.push_str(&encode_name(left));
    fragment.sql.push(' ');
    encode_comparison(table, comparison, &mut fragment);
    fragment
}

fn encode_combinator(table: &str, children: &[Condition], joiner: &str) -> Fragment {
    let fragments: Vec<Fragment> = children
        .iter()
        .map(|child| encode_condition(table, child))
        .filter(|fragment| !fragment.sql.is_empty())
        .collect();

    // An empty combinator contributes no constraint; the caller omits it.
    if fragments.is_empty() {
        return Fragment::default();
    }

    let mut out = Fragment::default();
    out.sql.push('(');
    for (index, fragment) in fragments.into_iter().enumerate() {
        if index > 0 {
            out.sql.push_str(joiner);
        }
        out.sql.push_str(&fragment.sql);
        out.params.extend(fragment.params);
    }
    out.sql.push(')');
    out
}

fn encode_condition(table: &str, condition: &Condition) -> Fragment {
    match condition {
        Condition::Where { left, comparison } => encode_where_condition(table, left, comparison),
        Condition::And(children) => encode_combinator(table, children, " and "),
        Condition::Or(children) => encode_combinator(table, children, " or "),
        Condition::On {
            table: joined,
            left,
            comparison,
        } => encode_where_condition(joined, left, comparison),
    }
}

fn join_fragments(fragments: impl Iterator<Item = Fragment>, joiner: &str) -> Fragment {
    let mut out = Fragment::default();
    for fragment in fragments.filter(|fragment| !fragment.sql.is_empty()) {
        if !out.sql.is_empty() {
            out.sql.push_str(joiner);
        }
        out.sql.push_str(&fragment.sql);
        out.params.extend(fragment.params);
    }
    out
}

fn encode_conditions(table: &str, description: &QueryDescription) -> Fragment {
    let joins = join_fragments(
        description
            .joins()
            .iter()
            .map(|condition| encode_condition(table, condition)),
        " and ",
    );
    let wheres = join_fragments(
        description
            .wheres()
            .iter()
            .map(|condition| encode_condition(table, condition)),
        " and ",
    );

    if joins.sql.is_empty() && wheres.sql.is_empty() {
        return Fragment::default();
    }

    let mut out = Fragment::default();
    out.sql.push_str(" where ");
    out.sql.push_str(&joins.sql);
    if !joins.sql.is_empty() && !wheres.sql.is_empty() {
        out.sql.push_str(" and ");
    }
    out.sql.push_str(&wheres.sql);
    out.params.extend(joins.params);
    out.params.extend(wheres.params);
    out
}

fn encode_method(table: &str, count_mode: bool, needs_distinct: bool) -> String {
    let name = encode_name(table);
    if count_mode {
        if needs_distinct {
            format!(r#"select count(distinct {name}."id") as "count" from {name}"#)
        } else {
            format!(r#"select count(*) as "count" from {name}"#)
        }
    } else if needs_distinct {
        format!("select distinct {name}.* from {name}")
    } else {
        format!("select {name}.* from {name}")
    }
}

fn encode_association(main_table: &str, joined_table: &str, kind: &AssociationKind) -> String {
    let main = encode_name(main_table);
    let joined = encode_name(joined_table);
    match kind {
        AssociationKind::BelongsTo { key } => {
            format!(r#" join {joined} on {joined}."id" = {main}.{}"#, encode_name(key))
        }
        AssociationKind::HasMany { foreign_key } => {
            format!(
                r#" join {joined} on {joined}.{} = {main}."id""#,
                encode_name(foreign_key)
            )
        }
    }
}

fn encode(plan: &QueryPlan, count_mode: bool) -> SqlQuery {
    let has_joins = !plan.description.joins().is_empty();
    let associations: &[(String, AssociationKind)] = if has_joins {
        &plan.associations
    } else {
        &[]
    };

    // Any one-to-many join can multiply result rows, so the whole select
    // must deduplicate.
    let needs_distinct = associations
        .iter()
        .any(|(_, kind)| matches!(kind, AssociationKind::HasMany { .. }));

    let mut sql = encode_method(&plan.table, count_mode, needs_distinct);
    for (joined_table, kind) in associations {
        sql.push_str(&encode_association(&plan.table, joined_table, kind));
    }

    let conditions = encode_conditions(&plan.table, &plan.description);
    sql.push_str(&conditions.sql);

    SqlQuery {
        sql,
        params: conditions.params,
    }
}

/// Compiles a plan into a `select <table>.*` statement.
pub fn encode_query(plan: &QueryPlan) -> SqlQuery {
    encode(plan, false)
}

/// Compiles a plan into a `select count(*)` statement (or
/// `count(distinct <table>."id")` when deduplication is required).
pub fn encode_count_query(plan: &QueryPlan) -> SqlQuery {
    encode(plan, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidewater_core::{between, gte, like, lte, not_in, one_of, weak_gt};

    fn plan(conditions: Vec<Condition>) -> QueryPlan {
        QueryPlan::new("tasks", conditions)
    }

    #[test]
    fn test_no_conditions() {
        let query = encode_query(&plan(vec![]));
        assert_eq!(query.sql, r#"select "tasks".* from "tasks""#);
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_equals_compiles_to_is() {
        let query = encode_query(&plan(vec![where_("is_done", true)]));
        assert_eq!(
            query.sql,
            r#"select "tasks".* from "tasks" where "tasks"."is_done" is ?"#
        );
        assert_eq!(query.params, vec![Value::Bool(true)]);
    }

    #[test]
    fn test_not_equals_compiles_to_is_not() {
        let query = encode_query(&plan(vec![where_("label", not_eq("draft"))]));
        assert_eq!(
            query.sql,
            r#"select "tasks".* from "tasks" where "tasks"."label" is not ?"#
        );
        assert_eq!(query.params, vec![Value::String("draft".into())]);
    }

    #[test]
    fn test_null_comparison_uses_is() {
        let query = encode_query(&plan(vec![where_("deleted_at", Value::Null)]));
        assert_eq!(
            query.sql,
            r#"select "tasks".* from "tasks" where "tasks"."deleted_at" is ?"#
        );
        assert_eq!(query.params, vec![Value::Null]);
    }

    #[test]
    fn test_ordered_comparisons() {
        let query = encode_query(&plan(vec![
            where_("priority", gte(5)),
            where_("age", lte(60)),
        ]));
        assert_eq!(
            query.sql,
            r#"select "tasks".* from "tasks" where "tasks"."priority" >= ? and "tasks"."age" <= ?"#
        );
        assert_eq!(query.params, vec![Value::Number(5.0), Value::Number(60.0)]);
    }

    #[test]
    fn test_column_comparison() {
        let query = encode_query(&plan(vec![where_("spent", gt(column("budget")))]));
        assert_eq!(
            query.sql,
            r#"select "tasks".* from "tasks" where "tasks"."spent" > "tasks"."budget""#
        );
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_weak_gt_against_literal_compiles_directly() {
        let query = encode_query(&plan(vec![where_("priority", weak_gt(3))]));
        assert_eq!(
            query.sql,
            r#"select "tasks".* from "tasks" where "tasks"."priority" > ?"#
        );
        assert_eq!(query.params, vec![Value::Number(3.0)]);
    }

    #[test]
    fn test_weak_gt_against_column_is_rewritten() {
        let query = encode_query(&plan(vec![where_("num1", weak_gt(column("num2")))]));
        assert_eq!(
            query.sql,
            r#"select "tasks".* from "tasks" where ("tasks"."num1" > "tasks"."num2" or ("tasks"."num1" is not ? and "tasks"."num2" is ?))"#
        );
        assert_eq!(query.params, vec![Value::Null, Value::Null]);
    }

    #[test]
    fn test_between() {
        let query = encode_query(&plan(vec![where_("priority", between(2, 8))]));
        assert_eq!(
            query.sql,
            r#"select "tasks".* from "tasks" where "tasks"."priority" between ? and ?"#
        );
        assert_eq!(query.params, vec![Value::Number(2.0), Value::Number(8.0)]);
    }

    #[test]
    fn test_one_of_and_not_in() {
        let query = encode_query(&plan(vec![
            where_("status", one_of(["todo", "doing"]).unwrap()),
            where_("label", not_in(["spam"]).unwrap()),
        ]));
        assert_eq!(
            query.sql,
            r#"select "tasks".* from "tasks" where "tasks"."status" in (?, ?) and "tasks"."label" not in (?)"#
        );
        assert_eq!(
            query.params,
            vec![
                Value::String("todo".into()),
                Value::String("doing".into()),
                Value::String("spam".into()),
            ]
        );
    }

    #[test]
    fn test_empty_value_sets() {
        let query = encode_query(&plan(vec![
            where_("status", one_of(Vec::<Value>::new()).unwrap()),
        ]));
        assert_eq!(
            query.sql,
            r#"select "tasks".* from "tasks" where "tasks"."status" in ()"#
        );
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_like_and_not_like() {
        let query = encode_query(&plan(vec![
            where_("title", like("%urgent%")),
            where_("title", tidewater_core::not_like("%draft%")),
        ]));
        assert_eq!(
            query.sql,
            r#"select "tasks".* from "tasks" where "tasks"."title" like ? and "tasks"."title" not like ?"#
        );
    }

    #[test]
    fn test_and_or_preserve_order_and_parenthesize() {
        let query = encode_query(&plan(vec![or(vec![
            where_("is_done", true),
            and(vec![where_("priority", gt(5)), where_("label", "urgent")]),
        ])]));
        assert_eq!(
            query.sql,
            r#"select "tasks".* from "tasks" where ("tasks"."is_done" is ? or ("tasks"."priority" > ? and "tasks"."label" is ?))"#
        );
        assert_eq!(
            query.params,
            vec![
                Value::Bool(true),
                Value::Number(5.0),
                Value::String("urgent".into()),
            ]
        );
    }

    #[test]
    fn test_empty_combinators_contribute_nothing() {
        let query = encode_query(&plan(vec![and(vec![]), or(vec![])]));
        assert_eq!(query.sql, r#"select "tasks".* from "tasks""#);

        let nested = encode_query(&plan(vec![and(vec![or(vec![])]), where_("is_done", true)]));
        assert_eq!(
            nested.sql,
            r#"select "tasks".* from "tasks" where "tasks"."is_done" is ?"#
        );
    }

    #[test]
    fn test_belongs_to_join() {
        let query = encode_query(
            &plan(vec![
                tidewater_core::on("projects", "is_archived", false),
                where_("is_done", false),
            ])
            .association(
                "projects",
                AssociationKind::BelongsTo {
                    key: "project_id".into(),
                },
            ),
        );
        assert_eq!(
            query.sql,
            r#"select "tasks".* from "tasks" join "projects" on "projects"."id" = "tasks"."project_id" where "projects"."is_archived" is ? and "tasks"."is_done" is ?"#
        );
        assert_eq!(query.params, vec![Value::Bool(false), Value::Bool(false)]);
    }

    #[test]
    fn test_has_many_join_forces_distinct() {
        let query = encode_query(
            &plan(vec![tidewater_core::on("tag_assignments", "tag", "urgent")]).association(
                "tag_assignments",
                AssociationKind::HasMany {
                    foreign_key: "task_id".into(),
                },
            ),
        );
        assert_eq!(
            query.sql,
            r#"select distinct "tasks".* from "tasks" join "tag_assignments" on "tag_assignments"."task_id" = "tasks"."id" where "tag_assignments"."tag" is ?"#
        );
    }

    #[test]
    fn test_belongs_to_only_does_not_force_distinct() {
        let query = encode_query(
            &plan(vec![tidewater_core::on("projects", "is_archived", false)]).association(
                "projects",
                AssociationKind::BelongsTo {
                    key: "project_id".into(),
                },
            ),
        );
        assert!(query.sql.starts_with(r#"select "tasks".* from "tasks""#));
    }

    #[test]
    fn test_associations_ignored_without_join_conditions() {
        // No on() predicates: the association list does not produce joins
        // and must not force distinct either.
        let query = encode_query(&plan(vec![where_("is_done", true)]).association(
            "tag_assignments",
            AssociationKind::HasMany {
                foreign_key: "task_id".into(),
            },
        ));
        assert_eq!(
            query.sql,
            r#"select "tasks".* from "tasks" where "tasks"."is_done" is ?"#
        );
    }

    #[test]
    fn test_count_query() {
        let query = encode_count_query(&plan(vec![where_("is_done", true)]));
        assert_eq!(
            query.sql,
            r#"select count(*) as "count" from "tasks" where "tasks"."is_done" is ?"#
        );
    }

    #[test]
    fn test_count_query_with_distinct() {
        let query = encode_count_query(
            &plan(vec![tidewater_core::on("tag_assignments", "tag", "urgent")]).association(
                "tag_assignments",
                AssociationKind::HasMany {
                    foreign_key: "task_id".into(),
                },
            ),
        );
        assert_eq!(
            query.sql,
            r#"select count(distinct "tasks"."id") as "count" from "tasks" join "tag_assignments" on "tag_assignments"."task_id" = "tasks"."id" where "tag_assignments"."tag" is ?"#
        );
    }

    #[test]
    fn test_sql_query_serde_round_trip() {
        let query = encode_query(&plan(vec![where_("status", one_of(["todo"]).unwrap())]));
        let json = serde_json::to_string(&query).unwrap();
        let back: SqlQuery = serde_json::from_str(&json).unwrap();
        assert_eq!(back, query);
    }

    #[test]
    fn test_params_follow_placeholder_order() {
        let query = encode_query(
            &plan(vec![
                tidewater_core::on("projects", "team", "core"),
                where_("priority", between(1, 3)),
                where_("status", one_of(["todo"]).unwrap()),
            ])
            .association(
                "projects",
                AssociationKind::BelongsTo {
                    key: "project_id".into(),
                },
            ),
        );
        assert_eq!(
            query.params,
            vec![
                Value::String("core".into()),
                Value::Number(1.0),
                Value::Number(3.0),
                Value::String("todo".into()),
            ]
        );
    }
}
