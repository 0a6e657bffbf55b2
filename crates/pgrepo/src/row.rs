//! Row mapping traits and table metadata.

use crate::error::{RepoError, RepoResult};
use tokio_postgres::Row;

/// Trait for converting a database row into a Rust struct.
///
/// This trait should typically be derived using `#[derive(FromRow)]`.
///
/// # Example
///
/// ```ignore
/// use pgrepo::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     id: i64,
///     email: String,
///     #[repo(column = "created_at")]
///     created: chrono::DateTime<chrono::Utc>,
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> RepoResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning RepoError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> RepoResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>;

    /// Like [`RowExt::try_get_column`], but `T::default()` when the row has no such column,
    /// e.g. a field left out of a narrow projection. A present column still decodes strictly.
    fn try_get_column_or_default<T>(&self, column: &str) -> RepoResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a> + Default;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> RepoResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| RepoError::decode(column, e.to_string()))
    }

    fn try_get_column_or_default<T>(&self, column: &str) -> RepoResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a> + Default,
    {
        if self.columns().iter().any(|c| c.name() == column) {
            self.try_get_column(column)
        } else {
            Ok(T::default())
        }
    }
}

/// Table binding for a record type, consumed by [`Repository::new`](crate::Repository::new).
///
/// Derive it with `#[derive(Table)]`. When a struct marks summary fields, its derived
/// `FromRow` fills every other field with `Default::default()` on rows that lack the column,
/// so non-preload reads decode into the same type:
///
/// ```ignore
/// #[derive(FromRow, Table)]
/// #[repo(table = "users")]
/// struct User {
///     #[repo(summary)]
///     id: uuid::Uuid,
///     #[repo(summary)]
///     email: String,
///     password: String,
/// }
/// ```
pub trait Table {
    /// Table name.
    const TABLE: &'static str;

    /// Columns selected by non-preload reads. Empty means every column.
    fn summary_columns() -> &'static [&'static str] {
        &[]
    }
}
