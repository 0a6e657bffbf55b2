//! Complete statements built from the clause emitters.

use super::{
    Fragment, Statement, insert_query, join_query, order_query, pagination_query, update_query,
    where_query,
};
use crate::condition::ConditionMapSet;
use crate::error::{RepoError, RepoResult};
use crate::value::Param;

/// Whether a SELECT takes row locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowLock {
    #[default]
    None,
    /// `FOR UPDATE`
    ForUpdate,
}

/// `SELECT EXISTS(SELECT 1 FROM <table> WHERE <key> = $1)`
pub fn exists(table: &str, key: &str, value: Param) -> Statement {
    let mut f = Fragment::new(format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE {key} = "));
    f.push_bind(value);
    f.push(")");
    f.build()
}

/// `INSERT INTO <table> (<cols>) VALUES ... [ON CONFLICT ...]`
pub fn insert(table: &str, set: &ConditionMapSet) -> RepoResult<Statement> {
    let mut f = Fragment::new(format!("INSERT INTO {table} "));
    f.push_fragment(insert_query(set)?);
    Ok(f.build())
}

/// `SELECT <columns> FROM <table> WHERE <key> = $1 [FOR UPDATE]`
pub fn select_by_key(
    table: &str,
    columns: &str,
    key: &str,
    value: Param,
    lock: RowLock,
) -> Statement {
    let mut f = Fragment::new(format!("SELECT {columns} FROM {table} WHERE {key} = "));
    f.push_bind(value);
    if lock == RowLock::ForUpdate {
        f.push(" FOR UPDATE");
    }
    f.build()
}

/// `SELECT <columns> FROM <table> [JOIN ...] [WHERE ...] [ORDER BY ...] [LIMIT/OFFSET] [FOR UPDATE]`
pub fn select(
    table: &str,
    columns: &str,
    set: &ConditionMapSet,
    lock: RowLock,
) -> RepoResult<Statement> {
    let mut f = Fragment::new(format!("SELECT {columns} FROM {table}"));

    let on = join_query(set)?;
    match (&set.join, on.is_empty()) {
        (Some(target), false) => {
            f.push(&format!(" {} {} ON ", target.kind.as_sql(), target.table));
            f.push_fragment(on);
        }
        (Some(target), true) => {
            return Err(RepoError::validation(format!(
                "join of table '{}' has no ON conditions",
                target.table
            )));
        }
        (None, false) => {
            return Err(RepoError::validation(
                "ON conditions given without a join table",
            ));
        }
        (None, true) => {}
    }

    push_where(&mut f, set)?;

    for tail in [order_query(&set.order), pagination_query(set.pagination.as_ref())] {
        if !tail.is_empty() {
            f.push(" ");
            f.push(&tail);
        }
    }

    if lock == RowLock::ForUpdate {
        f.push(" FOR UPDATE");
    }
    Ok(f.build())
}

/// `SELECT COUNT(*) FROM <table> [WHERE ...]`
pub fn count(table: &str, set: &ConditionMapSet) -> RepoResult<Statement> {
    let mut f = Fragment::new(format!("SELECT COUNT(*) FROM {table}"));
    push_where(&mut f, set)?;
    Ok(f.build())
}

/// `UPDATE <table> SET ... [WHERE ...] [RETURNING ...]`
pub fn update(table: &str, set: &ConditionMapSet) -> RepoResult<Statement> {
    let mut f = Fragment::new(format!("UPDATE {table} "));
    f.push_fragment(update_query(set)?);
    Ok(f.build())
}

/// `DELETE FROM <table> WHERE ...`
///
/// A set without WHERE conditions is rejected rather than deleting every row.
pub fn delete(table: &str, set: &ConditionMapSet) -> RepoResult<Statement> {
    let filter = where_query(set)?;
    if filter.is_empty() {
        return Err(RepoError::validation(format!(
            "DELETE FROM {table} requires at least one WHERE condition"
        )));
    }
    let mut f = Fragment::new(format!("DELETE FROM {table} WHERE "));
    f.push_fragment(filter);
    Ok(f.build())
}

fn push_where(f: &mut Fragment, set: &ConditionMapSet) -> RepoResult<()> {
    let filter = where_query(set)?;
    if !filter.is_empty() {
        f.push(" WHERE ");
        f.push_fragment(filter);
    }
    Ok(())
}
