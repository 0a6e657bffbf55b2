//! Generic table-bound repository.
//!
//! A [`Repository`] combines statement generation with a [`ConnectionPool`]. Every verb comes
//! in two forms: the plain form runs on the shared pool, the `_tx` form runs on a caller-owned
//! [`Transaction`]. Locking reads (`FOR UPDATE`) only exist in transactional form, since a
//! row lock taken outside a transaction is released as soon as the statement finishes.
//!
//! # Example
//!
//! ```ignore
//! use pgrepo::{ConditionMap, ConditionMapSet, Repository};
//!
//! let users: Repository<User, _> = Repository::new(pool)?;
//!
//! users
//!     .create(&ConditionMapSet::new().insert(
//!         ConditionMap::comma().bind("email", email).bind("password", hash),
//!     ))
//!     .await?;
//!
//! let user = users.find_by_key_val("email", email, false).await?;
//! ```

use crate::client::{ConnectionPool, GenericClient};
use crate::condition::ConditionMapSet;
use crate::error::{RepoError, RepoResult};
use crate::generator::Statement;
use crate::generator::statement::{self, RowLock};
use crate::row::{FromRow, RowExt, Table};
use crate::transaction::Transaction;
use crate::value::param;
use std::marker::PhantomData;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Columns selected by non-preload reads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    /// `*`
    #[default]
    All,
    /// A fixed, non-empty column list.
    Columns(Vec<String>),
}

impl Projection {
    /// A narrow projection. An empty list is rejected, since it would select no columns.
    pub fn columns<I, S>(columns: I) -> RepoResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(RepoError::validation(
                "projection must name at least one column",
            ));
        }
        Ok(Projection::Columns(columns))
    }

    fn to_sql(&self) -> String {
        match self {
            Projection::All => "*".to_string(),
            Projection::Columns(columns) => columns.join(", "),
        }
    }
}

/// Result of [`Repository::execute`]: exactly one row decodes to `One`, any other count
/// (including zero) to `Many`.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Fetched<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Fetched::One(record) => vec![record],
            Fetched::Many(records) => records,
        }
    }
}

/// Data access for one table, decoding rows into `T`.
pub struct Repository<T, P> {
    pool: P,
    table: String,
    projection: Projection,
    _record: PhantomData<fn() -> T>,
}

impl<T, P> Repository<T, P>
where
    T: FromRow + Table,
    P: ConnectionPool,
{
    /// Bind to `T::TABLE`, using `T::summary_columns()` for non-preload reads (every column
    /// when none are declared).
    pub fn new(pool: P) -> RepoResult<Self> {
        let summary = T::summary_columns();
        let projection = if summary.is_empty() {
            Projection::All
        } else {
            Projection::columns(summary.iter().copied())?
        };
        Ok(Self::with_table(pool, T::TABLE)?.with_projection(projection))
    }
}

impl<T, P> Repository<T, P>
where
    T: FromRow,
    P: ConnectionPool,
{
    /// Bind to an explicit table name; non-preload reads select every column until
    /// [`Repository::with_projection`] narrows them.
    pub fn with_table(pool: P, table: impl Into<String>) -> RepoResult<Self> {
        let table = table.into();
        if table.trim().is_empty() {
            return Err(RepoError::validation("table name must not be empty"));
        }
        Ok(Self {
            pool,
            table,
            projection: Projection::All,
            _record: PhantomData,
        })
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Check out a dedicated session and start a transaction on it.
    pub async fn begin(&self) -> RepoResult<Transaction<P::Session>> {
        let session = self.pool.connect().await?;
        Transaction::begin(session).await
    }

    /// Whether any row has `key = value`.
    pub async fn exists<V>(&self, key: &str, value: V) -> RepoResult<bool>
    where
        V: ToSql + Send + Sync + 'static,
    {
        let stmt = statement::exists(&self.table, key, param(value));
        let row = self.run(&self.pool, "exists", &stmt).await?.into_iter().next();
        match row {
            Some(row) => row.try_get_column("exists"),
            None => Ok(false),
        }
    }

    /// Insert the set's rows, with an optional upsert fallback.
    pub async fn create(&self, set: &ConditionMapSet) -> RepoResult<()> {
        self.create_on(&self.pool, set).await
    }

    pub async fn create_tx(
        &self,
        tx: &Transaction<P::Session>,
        set: &ConditionMapSet,
    ) -> RepoResult<()> {
        self.create_on(tx, set).await
    }

    async fn create_on(&self, conn: &impl GenericClient, set: &ConditionMapSet) -> RepoResult<()> {
        let stmt = statement::insert(&self.table, set)?;
        self.run_execute(conn, "create", &stmt).await?;
        Ok(())
    }

    /// First row with `key = value`.
    pub async fn find_by_key_val<V>(&self, key: &str, value: V, preload: bool) -> RepoResult<Option<T>>
    where
        V: ToSql + Send + Sync + 'static,
    {
        let stmt = self.select_by_key(key, value, preload, RowLock::None);
        Ok(first(self.fetch(&self.pool, "find_by_key_val", &stmt).await?))
    }

    pub async fn find_by_key_val_tx<V>(
        &self,
        tx: &Transaction<P::Session>,
        key: &str,
        value: V,
        preload: bool,
    ) -> RepoResult<Option<T>>
    where
        V: ToSql + Send + Sync + 'static,
    {
        let stmt = self.select_by_key(key, value, preload, RowLock::None);
        Ok(first(self.fetch(tx, "find_by_key_val", &stmt).await?))
    }

    /// Every row with `key = value`.
    pub async fn find_all_by_key_val<V>(&self, key: &str, value: V, preload: bool) -> RepoResult<Vec<T>>
    where
        V: ToSql + Send + Sync + 'static,
    {
        let stmt = self.select_by_key(key, value, preload, RowLock::None);
        self.fetch(&self.pool, "find_all_by_key_val", &stmt).await
    }

    pub async fn find_all_by_key_val_tx<V>(
        &self,
        tx: &Transaction<P::Session>,
        key: &str,
        value: V,
        preload: bool,
    ) -> RepoResult<Vec<T>>
    where
        V: ToSql + Send + Sync + 'static,
    {
        let stmt = self.select_by_key(key, value, preload, RowLock::None);
        self.fetch(tx, "find_all_by_key_val", &stmt).await
    }

    /// First row with `key = value`, locked `FOR UPDATE` until `tx` ends.
    pub async fn find_and_lock_by_key_val<V>(
        &self,
        tx: &Transaction<P::Session>,
        key: &str,
        value: V,
        preload: bool,
    ) -> RepoResult<Option<T>>
    where
        V: ToSql + Send + Sync + 'static,
    {
        let stmt = self.select_by_key(key, value, preload, RowLock::ForUpdate);
        Ok(first(self.fetch(tx, "find_and_lock_by_key_val", &stmt).await?))
    }

    /// Every row with `key = value`, locked `FOR UPDATE` until `tx` ends.
    pub async fn find_all_and_lock_by_key_val<V>(
        &self,
        tx: &Transaction<P::Session>,
        key: &str,
        value: V,
        preload: bool,
    ) -> RepoResult<Vec<T>>
    where
        V: ToSql + Send + Sync + 'static,
    {
        let stmt = self.select_by_key(key, value, preload, RowLock::ForUpdate);
        self.fetch(tx, "find_all_and_lock_by_key_val", &stmt).await
    }

    /// First row matching the set's WHERE groups, honouring order and pagination.
    pub async fn find_by_map(&self, set: &ConditionMapSet, preload: bool) -> RepoResult<Option<T>> {
        let stmt = self.select(set, preload, RowLock::None)?;
        Ok(first(self.fetch(&self.pool, "find_by_map", &stmt).await?))
    }

    pub async fn find_by_map_tx(
        &self,
        tx: &Transaction<P::Session>,
        set: &ConditionMapSet,
        preload: bool,
    ) -> RepoResult<Option<T>> {
        let stmt = self.select(set, preload, RowLock::None)?;
        Ok(first(self.fetch(tx, "find_by_map", &stmt).await?))
    }

    /// Every row matching the set's WHERE groups, honouring order and pagination.
    pub async fn find_all_by_map(&self, set: &ConditionMapSet, preload: bool) -> RepoResult<Vec<T>> {
        let stmt = self.select(set, preload, RowLock::None)?;
        self.fetch(&self.pool, "find_all_by_map", &stmt).await
    }

    pub async fn find_all_by_map_tx(
        &self,
        tx: &Transaction<P::Session>,
        set: &ConditionMapSet,
        preload: bool,
    ) -> RepoResult<Vec<T>> {
        let stmt = self.select(set, preload, RowLock::None)?;
        self.fetch(tx, "find_all_by_map", &stmt).await
    }

    /// Locking form of [`Repository::find_by_map`].
    pub async fn find_and_lock_by_map(
        &self,
        tx: &Transaction<P::Session>,
        set: &ConditionMapSet,
        preload: bool,
    ) -> RepoResult<Option<T>> {
        let stmt = self.select(set, preload, RowLock::ForUpdate)?;
        Ok(first(self.fetch(tx, "find_and_lock_by_map", &stmt).await?))
    }

    /// Locking form of [`Repository::find_all_by_map`].
    pub async fn find_all_and_lock_by_map(
        &self,
        tx: &Transaction<P::Session>,
        set: &ConditionMapSet,
        preload: bool,
    ) -> RepoResult<Vec<T>> {
        let stmt = self.select(set, preload, RowLock::ForUpdate)?;
        self.fetch(tx, "find_all_and_lock_by_map", &stmt).await
    }

    /// Apply the set's assignments.
    ///
    /// Returns `Some(rows)` (possibly empty) when the set has a non-empty RETURNING list,
    /// `None` otherwise.
    pub async fn update_by_map(&self, set: &ConditionMapSet) -> RepoResult<Option<Vec<T>>> {
        self.update_on(&self.pool, set).await
    }

    pub async fn update_by_map_tx(
        &self,
        tx: &Transaction<P::Session>,
        set: &ConditionMapSet,
    ) -> RepoResult<Option<Vec<T>>> {
        self.update_on(tx, set).await
    }

    async fn update_on(
        &self,
        conn: &impl GenericClient,
        set: &ConditionMapSet,
    ) -> RepoResult<Option<Vec<T>>> {
        let stmt = statement::update(&self.table, set)?;
        if set.has_returning() {
            Ok(Some(self.fetch(conn, "update_by_map", &stmt).await?))
        } else {
            self.run_execute(conn, "update_by_map", &stmt).await?;
            Ok(None)
        }
    }

    /// Number of rows matching the set's WHERE groups; the whole table when there are none.
    pub async fn count_by_map(&self, set: &ConditionMapSet) -> RepoResult<i64> {
        self.count_on(&self.pool, set).await
    }

    pub async fn count_by_map_tx(
        &self,
        tx: &Transaction<P::Session>,
        set: &ConditionMapSet,
    ) -> RepoResult<i64> {
        self.count_on(tx, set).await
    }

    async fn count_on(&self, conn: &impl GenericClient, set: &ConditionMapSet) -> RepoResult<i64> {
        let stmt = statement::count(&self.table, set)?;
        let row = self
            .run(conn, "count_by_map", &stmt)
            .await?
            .into_iter()
            .next();
        match row {
            Some(row) => row.try_get_column("count"),
            None => Ok(0),
        }
    }

    /// Delete the rows matching the set's WHERE groups. A set without conditions is rejected.
    pub async fn delete_by_map(&self, set: &ConditionMapSet) -> RepoResult<()> {
        self.delete_on(&self.pool, set).await
    }

    pub async fn delete_by_map_tx(
        &self,
        tx: &Transaction<P::Session>,
        set: &ConditionMapSet,
    ) -> RepoResult<()> {
        self.delete_on(tx, set).await
    }

    async fn delete_on(&self, conn: &impl GenericClient, set: &ConditionMapSet) -> RepoResult<()> {
        let stmt = statement::delete(&self.table, set)?;
        self.run_execute(conn, "delete_by_map", &stmt).await?;
        Ok(())
    }

    /// Run hand-written SQL and decode the result.
    pub async fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> RepoResult<Fetched<T>> {
        fetched(self.execute_raw(sql, params).await?)
    }

    pub async fn execute_tx(
        &self,
        tx: &Transaction<P::Session>,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> RepoResult<Fetched<T>> {
        fetched(self.execute_raw_tx(tx, sql, params).await?)
    }

    /// Run hand-written SQL and return the rows undecoded.
    pub async fn execute_raw(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> RepoResult<Vec<Row>> {
        log_sql(&self.table, "execute", sql, params.len());
        self.pool.query(sql, params).await
    }

    pub async fn execute_raw_tx(
        &self,
        tx: &Transaction<P::Session>,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> RepoResult<Vec<Row>> {
        log_sql(&self.table, "execute", sql, params.len());
        tx.query(sql, params).await
    }

    fn columns(&self, preload: bool) -> String {
        if preload {
            Projection::All.to_sql()
        } else {
            self.projection.to_sql()
        }
    }

    fn select_by_key<V>(&self, key: &str, value: V, preload: bool, lock: RowLock) -> Statement
    where
        V: ToSql + Send + Sync + 'static,
    {
        statement::select_by_key(&self.table, &self.columns(preload), key, param(value), lock)
    }

    fn select(&self, set: &ConditionMapSet, preload: bool, lock: RowLock) -> RepoResult<Statement> {
        statement::select(&self.table, &self.columns(preload), set, lock)
    }

    async fn run(
        &self,
        conn: &impl GenericClient,
        verb: &'static str,
        stmt: &Statement,
    ) -> RepoResult<Vec<Row>> {
        log_sql(&self.table, verb, &stmt.sql, stmt.params.len());
        conn.query(&stmt.sql, &stmt.params_ref()).await
    }

    async fn run_execute(
        &self,
        conn: &impl GenericClient,
        verb: &'static str,
        stmt: &Statement,
    ) -> RepoResult<u64> {
        log_sql(&self.table, verb, &stmt.sql, stmt.params.len());
        conn.execute(&stmt.sql, &stmt.params_ref()).await
    }

    async fn fetch(
        &self,
        conn: &impl GenericClient,
        verb: &'static str,
        stmt: &Statement,
    ) -> RepoResult<Vec<T>> {
        let rows = self.run(conn, verb, stmt).await?;
        rows.iter().map(T::from_row).collect()
    }
}

fn log_sql(table: &str, verb: &str, sql: &str, params: usize) {
    tracing::debug!(target: "pgrepo.sql", verb, table, params, "{sql}");
}

fn first<T>(records: Vec<T>) -> Option<T> {
    records.into_iter().next()
}

fn fetched<T: FromRow>(rows: Vec<Row>) -> RepoResult<Fetched<T>> {
    if rows.len() == 1 {
        return T::from_row(&rows[0]).map(Fetched::One);
    }
    rows.iter()
        .map(T::from_row)
        .collect::<RepoResult<Vec<T>>>()
        .map(Fetched::Many)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_projection_is_rejected() {
        let err = Projection::columns(Vec::<String>::new()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn projection_sql() {
        assert_eq!(Projection::All.to_sql(), "*");
        assert_eq!(
            Projection::columns(["id", "email"]).unwrap().to_sql(),
            "id, email"
        );
    }

    #[test]
    fn fetched_into_vec() {
        assert_eq!(Fetched::One(1).into_vec(), vec![1]);
        assert_eq!(Fetched::Many(vec![1, 2]).into_vec(), vec![1, 2]);
        assert!(Fetched::<i32>::Many(Vec::new()).into_vec().is_empty());
    }
}
