//! Pure translation of condition maps into SQL fragments.
//!
//! One emitter per clause kind. Every emitter is deterministic and side-effect free; the
//! [`statement`] module composes them into complete statements.
//!
//! Input that cannot produce valid SQL (misaligned insert rows, operator/value combinations
//! that have no rendering) is rejected with [`RepoError`] before any text is produced.

mod fragment;
pub mod statement;


pub use fragment::{Fragment, Statement};

use crate::condition::{ConditionMap, ConditionMapSet, Pagination};
use crate::error::{RepoError, RepoResult};
use crate::op::{Direction, Op};
use crate::value::{Literal, Merge, Param, Value};

/// How literal values in a map are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Literals become `$n` placeholders.
    Placeholders,
    /// Nothing is bound; raw values are rendered in place as `key cmp value`.
    /// Used for JOIN ... ON, which compares columns.
    Inline,
}

/// Render one map with placeholders.
pub fn map_to_query(map: &ConditionMap) -> RepoResult<Fragment> {
    render_map(map, Binding::Placeholders)
}

/// Render one map without placeholders.
pub fn map_to_inline_query(map: &ConditionMap) -> RepoResult<Fragment> {
    render_map(map, Binding::Inline)
}

/// Render one map in the given binding mode. Entries are joined by the map's connective.
pub fn render_map(map: &ConditionMap, binding: Binding) -> RepoResult<Fragment> {
    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in &map.entries {
        entries.push(render_entry(key, value, map.cmp, binding)?);
    }
    Ok(Fragment::join(entries, map.join.separator()))
}

fn render_entry(key: &str, value: &Value, cmp: Op, binding: Binding) -> RepoResult<Fragment> {
    let mut f = Fragment::empty();
    match value {
        Value::Raw(text) => match binding {
            Binding::Placeholders => {
                f.push(text);
            }
            Binding::Inline => {
                f.push(&format!("{key} {cmp} {text}"));
            }
        },
        Value::Operator(op, text) => {
            f.push(&format!("{key} {op} {text}"));
        }
        Value::Merge(merge) => {
            let base = unqualified(key);
            f.push(&format!("{key} {cmp} "));
            match merge {
                Merge::Column(column) => {
                    f.push(column);
                }
                Merge::ColumnOp(op, column) => {
                    f.push(&format!("{base} {op} {column}"));
                }
                Merge::Chain(op, values) => {
                    if values.is_empty() {
                        return Err(RepoError::validation(format!(
                            "merge chain on column '{key}' has no values"
                        )));
                    }
                    if binding == Binding::Inline {
                        return Err(inline_bind_error(key));
                    }
                    f.push(base);
                    for v in values {
                        f.push(&format!(" {op} "));
                        f.push_bind(v.clone());
                    }
                }
            }
        }
        Value::Literal(literal) => {
            if binding == Binding::Inline {
                return Err(inline_bind_error(key));
            }
            render_literal(&mut f, key, cmp, literal)?;
        }
    }
    Ok(f)
}

fn render_literal(f: &mut Fragment, key: &str, cmp: Op, literal: &Literal) -> RepoResult<()> {
    if cmp.is_unary() {
        f.push(&format!("{key} {cmp}"));
        return Ok(());
    }

    match literal {
        Literal::List(values) if cmp.is_membership() => {
            if values.is_empty() {
                // `IN ()` is not valid SQL.
                f.push(if cmp == Op::In { "1=0" } else { "1=1" });
                return Ok(());
            }
            f.push(&format!("{key} {cmp} ("));
            push_bind_list(f, values);
            f.push(")");
        }
        Literal::List(values) if cmp.is_range() => {
            let [from, to] = values.as_slice() else {
                return Err(RepoError::validation(format!(
                    "{cmp} on column '{key}' requires exactly 2 values, got {}",
                    values.len()
                )));
            };
            f.push(&format!("{key} {cmp} "));
            f.push_bind(from.clone());
            f.push(" AND ");
            f.push_bind(to.clone());
        }
        Literal::List(_) => {
            return Err(RepoError::validation(format!(
                "{cmp} on column '{key}' does not accept a list value"
            )));
        }
        Literal::Scalar(_) if cmp.is_membership() || cmp.is_range() => {
            return Err(RepoError::validation(format!(
                "{cmp} on column '{key}' requires a list value"
            )));
        }
        Literal::Scalar(v) => {
            f.push(&format!("{key} {cmp} "));
            f.push_bind(v.clone());
        }
    }
    Ok(())
}

fn push_bind_list(f: &mut Fragment, values: &[Param]) {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.push(", ");
        }
        f.push_bind(v.clone());
    }
}

fn inline_bind_error(key: &str) -> RepoError {
    RepoError::validation(format!(
        "column '{key}' binds a value in a map rendered without placeholders"
    ))
}

/// `t.col` -> `col`
fn unqualified(key: &str) -> &str {
    key.rsplit_once('.').map_or(key, |(_, column)| column)
}

/// Render the WHERE groups of a set: each non-empty map parenthesized, groups joined by
/// the set's where connective. Empty when no group has entries.
pub fn where_query(set: &ConditionMapSet) -> RepoResult<Fragment> {
    compose_groups(&set.wheres, set.where_join.separator(), Binding::Placeholders)
}

/// Render the JOIN ... ON groups of a set without placeholders.
pub fn join_query(set: &ConditionMapSet) -> RepoResult<Fragment> {
    compose_groups(&set.joins, set.join_join.separator(), Binding::Inline)
}

fn compose_groups(maps: &[ConditionMap], sep: &str, binding: Binding) -> RepoResult<Fragment> {
    let mut groups = Vec::with_capacity(maps.len());
    for map in maps.iter().filter(|m| !m.is_empty()) {
        let mut group = Fragment::new("(");
        group.push_fragment(render_map(map, binding)?);
        group.push(")");
        groups.push(group);
    }
    Ok(Fragment::join(groups, sep))
}

/// `SET <assignments> [WHERE <where>] [RETURNING <columns>]`.
///
/// Arguments are the SET arguments followed by the WHERE arguments.
pub fn update_query(set: &ConditionMapSet) -> RepoResult<Fragment> {
    let assignments = match &set.set {
        Some(map) if !map.is_empty() => map_to_query(map)?,
        _ => {
            return Err(RepoError::validation(
                "UPDATE requires at least one SET assignment",
            ));
        }
    };

    let mut f = Fragment::new("SET ");
    f.push_fragment(assignments);

    let filter = where_query(set)?;
    if !filter.is_empty() {
        f.push(" WHERE ");
        f.push_fragment(filter);
    }

    if let Some(returning) = returning_clause(set)? {
        f.push(" ");
        f.push(&returning);
    }
    Ok(f)
}

/// A comma separated list of the map's columns.
///
/// Entries carrying an operator render `col op expr` (e.g. `balance AS new_balance`); a
/// non-empty raw value renders `col cmp expr`; an empty raw value renders the bare column.
/// Bound literals and merges have no rendering here and are rejected.
pub fn returning_query(map: &ConditionMap) -> RepoResult<String> {
    let mut items = Vec::with_capacity(map.len());
    for (key, value) in &map.entries {
        let item = match value {
            Value::Operator(op, expr) => format!("{key} {op} {expr}"),
            Value::Raw(expr) if expr.is_empty() => key.clone(),
            Value::Raw(expr) => format!("{key} {} {expr}", map.cmp),
            Value::Literal(_) | Value::Merge(_) => {
                return Err(RepoError::validation(format!(
                    "RETURNING column '{key}' must be a bare column, raw or operator fragment"
                )));
            }
        };
        items.push(item);
    }
    Ok(items.join(", "))
}

/// `SUM(col), SUM(col2), ...` over the map's columns.
pub fn sum_query(map: &ConditionMap) -> String {
    map.keys()
        .map(|k| format!("SUM({k})"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn returning_clause(set: &ConditionMapSet) -> RepoResult<Option<String>> {
    match set.returning.as_ref().filter(|m| !m.is_empty()) {
        Some(map) => Ok(Some(format!("RETURNING {}", returning_query(map)?))),
        None => Ok(None),
    }
}

/// `(<cols>) VALUES (<row>), (<row>) [ON CONFLICT ...]`.
///
/// The column list (the alignment) comes from the first row; every other row must carry the
/// same columns in the same order. Arguments are flattened row-major, followed by any
/// DO UPDATE arguments.
pub fn insert_query(set: &ConditionMapSet) -> RepoResult<Fragment> {
    let Some(first) = set.inserts.first() else {
        return Err(RepoError::validation("INSERT requires at least one row"));
    };
    if first.is_empty() {
        return Err(RepoError::validation("insert row 0 has no columns"));
    }

    let alignment: Vec<&str> = first.keys().collect();
    for (row, map) in set.inserts.iter().enumerate().skip(1) {
        if !map.keys().eq(alignment.iter().copied()) {
            return Err(RepoError::SchemaMismatch {
                row,
                expected: alignment.iter().map(|k| k.to_string()).collect(),
                found: map.keys().map(str::to_string).collect(),
            });
        }
    }

    let mut tuples = Vec::with_capacity(set.inserts.len());
    for (row, map) in set.inserts.iter().enumerate() {
        let mut tuple = Fragment::new("(");
        for (i, (key, value)) in map.entries.iter().enumerate() {
            if i > 0 {
                tuple.push(", ");
            }
            match value {
                Value::Literal(Literal::Scalar(v)) => {
                    tuple.push_bind(v.clone());
                }
                Value::Raw(text) => {
                    tuple.push(text);
                }
                _ => {
                    return Err(RepoError::validation(format!(
                        "insert row {row} column '{key}' must be a scalar literal or raw fragment"
                    )));
                }
            }
        }
        tuple.push(")");
        tuples.push(tuple);
    }

    let mut f = Fragment::new(format!("({}) VALUES ", alignment.join(", ")));
    f.push_fragment(Fragment::join(tuples, ", "));
    f.push_fragment(conflict_query(set)?);
    Ok(f)
}

fn conflict_query(set: &ConditionMapSet) -> RepoResult<Fragment> {
    let assignments = set.set.as_ref().filter(|m| !m.is_empty());

    if set.conflict.is_empty() {
        if assignments.is_some() {
            return Err(RepoError::validation(
                "DO UPDATE assignments require ON CONFLICT columns",
            ));
        }
        return Ok(Fragment::empty());
    }

    let mut f = Fragment::new(format!(" ON CONFLICT ({})", set.conflict.join(", ")));
    match assignments {
        None => {
            f.push(" DO NOTHING");
        }
        Some(map) => {
            f.push(" DO UPDATE SET ");
            f.push_fragment(map_to_query(map)?);
            if let Some(returning) = returning_clause(set)? {
                f.push(" ");
                f.push(&returning);
            }
        }
    }
    Ok(f)
}

/// `ORDER BY col dir, ...`, or an empty string.
pub fn order_query(order: &[(String, Direction)]) -> String {
    if order.is_empty() {
        return String::new();
    }
    let items: Vec<String> = order
        .iter()
        .map(|(column, dir)| format!("{column} {}", dir.as_sql()))
        .collect();
    format!("ORDER BY {}", items.join(", "))
}

/// `LIMIT n OFFSET m`; LIMIT is skipped when zero, OFFSET whenever unset.
pub fn pagination_query(pagination: Option<&Pagination>) -> String {
    let Some(p) = pagination else {
        return String::new();
    };
    let mut parts = Vec::with_capacity(2);
    if let Some(limit) = p.limit.filter(|&l| l > 0) {
        parts.push(format!("LIMIT {limit}"));
    }
    if let Some(offset) = p.offset {
        parts.push(format!("OFFSET {offset}"));
    }
    parts.join(" ")
}
