//! Condition maps: ordered key/value descriptors for every clause of a statement.
//!
//! A [`ConditionMap`] is an ordered list of `(column, value)` pairs plus the connective that
//! glues them and the comparison operator applied to each entry. Order is significant: it
//! decides placeholder numbering.
//!
//! A [`ConditionMapSet`] bundles the maps for one statement.
//!
//! # Example
//! ```ignore
//! use pgrepo::{ConditionMap, ConditionMapSet, Op};
//!
//! let set = ConditionMapSet::new()
//!     .filter(ConditionMap::and().bind("email", "a@b.com"))
//!     .filter(ConditionMap::or().with_cmp(Op::In).list("status", ["active", "pending"]));
//! ```

use crate::op::{Connective, Direction, JoinKind, Op};
use crate::value::Value;
use tokio_postgres::types::ToSql;

/// An ordered list of `(column, value)` entries with a connective and a comparison operator.
#[derive(Debug, Clone)]
pub struct ConditionMap {
    pub entries: Vec<(String, Value)>,
    pub join: Connective,
    pub cmp: Op,
}

impl ConditionMap {
    pub fn new(join: Connective, cmp: Op) -> Self {
        Self {
            entries: Vec::new(),
            join,
            cmp,
        }
    }

    /// Entries joined by `AND`, compared with `=`.
    pub fn and() -> Self {
        Self::new(Connective::And, Op::Eq)
    }

    /// Entries joined by `OR`, compared with `=`.
    pub fn or() -> Self {
        Self::new(Connective::Or, Op::Eq)
    }

    /// Entries joined by `,`, compared with `=` (SET assignments, insert rows, column lists).
    pub fn comma() -> Self {
        Self::new(Connective::Comma, Op::Eq)
    }

    /// A comma map of bare column names.
    pub fn columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        columns
            .into_iter()
            .fold(Self::comma(), |map, column| map.column(column))
    }

    /// Replace the comparison operator.
    pub fn with_cmp(mut self, cmp: Op) -> Self {
        self.cmp = cmp;
        self
    }

    /// Append an entry.
    pub fn push(mut self, key: impl Into<String>, value: Value) -> Self {
        self.entries.push((key.into(), value));
        self
    }

    /// Append a scalar literal entry.
    pub fn bind<T>(self, key: impl Into<String>, value: T) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        self.push(key, Value::bind(value))
    }

    /// Append a list literal entry.
    pub fn list<T, I>(self, key: impl Into<String>, values: I) -> Self
    where
        T: ToSql + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        self.push(key, Value::list(values))
    }

    /// Append a bare column entry (RETURNING / SUM lists).
    pub fn column(self, key: impl Into<String>) -> Self {
        self.push(key, Value::Raw(String::new()))
    }

    /// Append a column-to-column equality, e.g. `users.id = orders.user_id`.
    pub fn on(self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.push(left, Value::operator(Op::Eq, right))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Column names in entry order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

/// LIMIT / OFFSET settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Emitted only when non-zero.
    pub limit: Option<u64>,
    /// Emitted whenever set, including zero.
    pub offset: Option<u64>,
}

/// The table joined into a SELECT, with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTarget {
    pub kind: JoinKind,
    pub table: String,
}

/// The full descriptor for one statement.
///
/// Built fresh for every call; nothing here is retained by the repository.
#[derive(Debug, Clone, Default)]
pub struct ConditionMapSet {
    /// One map per inserted row; every row must share the first row's ordered keys.
    pub inserts: Vec<ConditionMap>,
    /// ON CONFLICT target columns.
    pub conflict: Vec<String>,
    pub wheres: Vec<ConditionMap>,
    pub where_join: Connective,
    /// UPDATE assignments, or DO UPDATE assignments for an upsert.
    pub set: Option<ConditionMap>,
    pub returning: Option<ConditionMap>,
    pub join: Option<JoinTarget>,
    /// ON conditions for [`ConditionMapSet::join`]; rendered without placeholders.
    pub joins: Vec<ConditionMap>,
    pub join_join: Connective,
    pub order: Vec<(String, Direction)>,
    pub pagination: Option<Pagination>,
}

impl ConditionMapSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an insert row.
    pub fn insert(mut self, row: ConditionMap) -> Self {
        self.inserts.push(row);
        self
    }

    /// Add several insert rows.
    pub fn insert_many(mut self, rows: impl IntoIterator<Item = ConditionMap>) -> Self {
        self.inserts.extend(rows);
        self
    }

    /// Set the ON CONFLICT target columns.
    pub fn on_conflict<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflict = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add a WHERE group.
    pub fn filter(mut self, map: ConditionMap) -> Self {
        self.wheres.push(map);
        self
    }

    /// Connective between WHERE groups (default `AND`).
    pub fn where_join(mut self, join: Connective) -> Self {
        self.where_join = join;
        self
    }

    pub fn set(mut self, map: ConditionMap) -> Self {
        self.set = Some(map);
        self
    }

    pub fn returning(mut self, map: ConditionMap) -> Self {
        self.returning = Some(map);
        self
    }

    /// Join `table` into SELECTs built from this set.
    pub fn join(mut self, kind: JoinKind, table: impl Into<String>) -> Self {
        self.join = Some(JoinTarget {
            kind,
            table: table.into(),
        });
        self
    }

    /// Add an ON group for the join target.
    pub fn join_on(mut self, map: ConditionMap) -> Self {
        self.joins.push(map);
        self
    }

    /// Connective between ON groups (default `AND`).
    pub fn join_join(mut self, join: Connective) -> Self {
        self.join_join = join;
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.pagination.get_or_insert_with(Pagination::default).limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.pagination.get_or_insert_with(Pagination::default).offset = Some(offset);
        self
    }

    /// Whether at least one WHERE group has entries.
    pub fn has_where(&self) -> bool {
        self.wheres.iter().any(|m| !m.is_empty())
    }

    /// Whether a non-empty RETURNING list is present.
    pub fn has_returning(&self) -> bool {
        self.returning.as_ref().is_some_and(|m| !m.is_empty())
    }
}
