//! The closed set of values a condition map entry can carry.

use crate::op::Op;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A bound statement parameter.
pub type Param = Arc<dyn ToSql + Send + Sync>;

/// Wrap a value as a [`Param`].
pub fn param<T>(value: T) -> Param
where
    T: ToSql + Send + Sync + 'static,
{
    Arc::new(value)
}

/// A value that is bound through placeholders.
#[derive(Debug, Clone)]
pub enum Literal {
    /// One placeholder.
    Scalar(Param),
    /// One placeholder per element; required by `IN`, `NOT IN`, `BETWEEN` and `NOT BETWEEN`.
    List(Vec<Param>),
}

/// A value combined with the entry's own column.
#[derive(Debug, Clone)]
pub enum Merge {
    /// `key cmp column`
    Column(String),
    /// `key cmp base op column`
    ColumnOp(Op, String),
    /// `key cmp base op $n op $n+1 ...`
    Chain(Op, Vec<Param>),
}

/// A condition map entry's right-hand side.
///
/// Adding a new kind of fragment means adding a variant here; every renderer matches
/// exhaustively.
#[derive(Debug, Clone)]
pub enum Value {
    /// Bound as placeholder argument(s).
    Literal(Literal),
    /// Emitted verbatim and never bound. In bound maps the key is not emitted.
    Raw(String),
    /// Emits `key op text` verbatim, e.g. column-to-column comparisons.
    Operator(Op, String),
    /// Combines the column with another column or with a chain of bound values.
    Merge(Merge),
}

impl Value {
    /// A scalar literal.
    pub fn bind<T>(value: T) -> Self
    where
        T: ToSql + Send + Sync + 'static,
    {
        Value::Literal(Literal::Scalar(param(value)))
    }

    /// A list literal, one placeholder per element.
    pub fn list<T, I>(values: I) -> Self
    where
        T: ToSql + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        Value::Literal(Literal::List(values.into_iter().map(param).collect()))
    }

    /// Raw SQL text, never bound.
    ///
    /// # Safety
    /// Be careful with SQL injection when using raw fragments.
    pub fn raw(sql: impl Into<String>) -> Self {
        Value::Raw(sql.into())
    }

    /// `key op text`, with `text` emitted verbatim.
    pub fn operator(op: Op, text: impl Into<String>) -> Self {
        Value::Operator(op, text.into())
    }

    /// `key cmp column`
    pub fn merge_column(column: impl Into<String>) -> Self {
        Value::Merge(Merge::Column(column.into()))
    }

    /// `key cmp base op column`, e.g. `balance = balance + bonus`.
    pub fn merge_with(op: Op, column: impl Into<String>) -> Self {
        Value::Merge(Merge::ColumnOp(op, column.into()))
    }

    /// `key cmp base op $1 op $2 ...`, e.g. `balance = balance + $1 + $2`.
    pub fn merge_chain<T, I>(op: Op, values: I) -> Self
    where
        T: ToSql + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        Value::Merge(Merge::Chain(op, values.into_iter().map(param).collect()))
    }
}
