//! SQL operator tokens used by condition maps.

use std::fmt;

/// An operator placed between a column and its value.
///
/// Comparison operators drive how a [`ConditionMap`](crate::ConditionMap) entry is rendered;
/// arithmetic operators are used by [`Merge`](crate::Merge) fragments; `As` renders aliases in
/// RETURNING lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `ILIKE`
    Ilike,
    /// `NOT ILIKE`
    NotIlike,
    /// `IN` (value must be a list literal)
    In,
    /// `NOT IN` (value must be a list literal)
    NotIn,
    /// `IS NULL` (binds nothing)
    IsNull,
    /// `IS NOT NULL` (binds nothing)
    IsNotNull,
    /// `BETWEEN` (value must be a two-element list literal)
    Between,
    /// `NOT BETWEEN` (value must be a two-element list literal)
    NotBetween,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `||`
    Concat,
    /// `AS`
    As,
}

impl Op {
    /// The SQL token for this operator.
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
            Op::Ilike => "ILIKE",
            Op::NotIlike => "NOT ILIKE",
            Op::In => "IN",
            Op::NotIn => "NOT IN",
            Op::IsNull => "IS NULL",
            Op::IsNotNull => "IS NOT NULL",
            Op::Between => "BETWEEN",
            Op::NotBetween => "NOT BETWEEN",
            Op::Plus => "+",
            Op::Minus => "-",
            Op::Multiply => "*",
            Op::Divide => "/",
            Op::Concat => "||",
            Op::As => "AS",
        }
    }

    /// `IN` / `NOT IN`.
    pub fn is_membership(self) -> bool {
        matches!(self, Op::In | Op::NotIn)
    }

    /// `BETWEEN` / `NOT BETWEEN`.
    pub fn is_range(self) -> bool {
        matches!(self, Op::Between | Op::NotBetween)
    }

    /// `IS NULL` / `IS NOT NULL`.
    pub fn is_unary(self) -> bool {
        matches!(self, Op::IsNull | Op::IsNotNull)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// The token used to glue the entries of one map (or the groups of a map set) together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Connective {
    #[default]
    And,
    Or,
    Comma,
}

impl Connective {
    /// The separator text, including surrounding whitespace.
    pub fn separator(self) -> &'static str {
        match self {
            Connective::And => " AND ",
            Connective::Or => " OR ",
            Connective::Comma => ", ",
        }
    }
}

/// Sort direction for ORDER BY entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// The kind of JOIN emitted for a map set's join target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}
