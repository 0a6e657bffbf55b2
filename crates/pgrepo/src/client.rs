//! Capability traits the repository runs statements through.
//!
//! [`GenericClient`] is anything that can run a statement: a bare connection, a pooled
//! connection, the pool itself or an open [`Transaction`](crate::Transaction).
//! [`ConnectionPool`] adds the ability to check out a dedicated session.

use crate::error::{RepoError, RepoResult};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A trait that unifies database clients, pools and transactions.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = RepoResult<Vec<Row>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = RepoResult<u64>> + Send;

    /// Execute a query and return the first row, if any.
    ///
    /// Semantics:
    /// - 0 rows: returns `Ok(None)`
    /// - 1 row: returns `Ok(Some(row))`
    /// - multiple rows: returns `Ok(Some(first_row))` (does **not** error)
    fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = RepoResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Execute a query and return the first row, failing with [`RepoError::NotFound`] when
    /// nothing comes back.
    fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = RepoResult<Row>> + Send {
        async move {
            self.query_opt(sql, params)
                .await?
                .ok_or_else(|| RepoError::not_found("Expected one row, got none"))
        }
    }
}

/// A shared set of connections.
///
/// Pool-level [`GenericClient::query`] may be served by any free connection, so two calls
/// carry no ordering guarantee. [`ConnectionPool::connect`] hands out a session that keeps
/// one connection until it is dropped.
pub trait ConnectionPool: GenericClient {
    type Session: Session;

    /// Check out a dedicated session.
    fn connect(&self) -> impl std::future::Future<Output = RepoResult<Self::Session>> + Send;
}

/// A connection owned by one caller, such as the session behind a [`Transaction`].
///
/// [`Session::discard`] is called instead of a plain drop when the session may still be
/// inside an open transaction. It must make sure the connection is never reused; closing it
/// makes the server roll the transaction back.
///
/// [`Transaction`]: crate::Transaction
pub trait Session: GenericClient + Send + 'static {
    /// Close the connection instead of returning it for reuse.
    fn discard(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}

/// Dropping the client closes its connection.
impl Session for tokio_postgres::Client {}

/// Detach the object from its pool so the open connection is closed, not recycled.
#[cfg(feature = "pool")]
impl Session for deadpool_postgres::Client {
    fn discard(self) {
        drop(deadpool_postgres::Client::take(self));
        tracing::debug!(target: "pgrepo.pool", "session detached from pool and closed");
    }
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> RepoResult<Vec<Row>> {
        tokio_postgres::Client::query(self, sql, params)
            .await
            .map_err(RepoError::from_db_error)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> RepoResult<u64> {
        tokio_postgres::Client::execute(self, sql, params)
            .await
            .map_err(RepoError::from_db_error)
    }
}

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> RepoResult<Vec<Row>> {
        // Delegate to the deref target (ClientWrapper -> tokio_postgres::Client).
        GenericClient::query(&***self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> RepoResult<u64> {
        GenericClient::execute(&***self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Pool {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> RepoResult<Vec<Row>> {
        let client = self.get().await?;
        GenericClient::query(&client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> RepoResult<u64> {
        let client = self.get().await?;
        GenericClient::execute(&client, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl ConnectionPool for deadpool_postgres::Pool {
    type Session = deadpool_postgres::Client;

    async fn connect(&self) -> RepoResult<Self::Session> {
        Ok(self.get().await?)
    }
}

impl<C: GenericClient> GenericClient for &C {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> RepoResult<Vec<Row>> {
        (*self).query(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> RepoResult<u64> {
        (*self).execute(sql, params).await
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> RepoResult<Option<Row>> {
        (*self).query_opt(sql, params).await
    }
}
