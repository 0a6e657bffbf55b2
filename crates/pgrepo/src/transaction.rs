//! Explicit transaction handles.
//!
//! A [`Transaction`] owns one checked-out session from [`Transaction::begin`] until
//! [`Transaction::commit`] or [`Transaction::rollback`] returns. Both consume the handle, so
//! a finished transaction cannot be used again. The session goes back to its pool only after
//! the terminating statement completes.
//!
//! Dropping a handle without terminating it logs a warning and discards the session (see
//! [`Session::discard`]): the connection is closed, the server rolls the transaction back,
//! and the pool never hands out a connection stuck inside it. The same happens when the
//! terminating statement itself fails.
//!
//! # Example
//!
//! ```ignore
//! let tx = users.begin().await?;
//! let user = users.find_and_lock_by_key_val(&tx, "id", id, true).await?;
//! users.update_by_map_tx(&tx, &set).await?;
//! tx.commit().await?;
//! ```

use crate::client::{GenericClient, Session};
use crate::error::{RepoError, RepoResult};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// An open transaction on a dedicated session.
pub struct Transaction<S: Session> {
    session: Option<S>,
}

impl<S: Session> Transaction<S> {
    /// Issue `BEGIN` on `session` and take ownership of it.
    pub async fn begin(session: S) -> RepoResult<Self> {
        session.execute("BEGIN", &[]).await?;
        tracing::debug!(target: "pgrepo.tx", "BEGIN");
        Ok(Self {
            session: Some(session),
        })
    }

    /// Issue `COMMIT` and release the session.
    pub async fn commit(mut self) -> RepoResult<()> {
        self.finish("COMMIT").await
    }

    /// Issue `ROLLBACK` and release the session.
    pub async fn rollback(mut self) -> RepoResult<()> {
        self.finish("ROLLBACK").await
    }

    async fn finish(&mut self, sql: &'static str) -> RepoResult<()> {
        let session = self.session.take().ok_or_else(consumed)?;
        match session.execute(sql, &[]).await {
            Ok(_) => {
                tracing::debug!(target: "pgrepo.tx", "{sql}");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(target: "pgrepo.tx", error = %err, "{sql} failed, discarding session");
                session.discard();
                Err(err)
            }
        }
    }

    fn session(&self) -> RepoResult<&S> {
        self.session.as_ref().ok_or_else(consumed)
    }
}

fn consumed() -> RepoError {
    RepoError::Other("transaction already finished".to_string())
}

impl<S: Session> Drop for Transaction<S> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::warn!(
                target: "pgrepo.tx",
                "transaction dropped without explicit commit or rollback, discarding session"
            );
            session.discard();
        }
    }
}

impl<S: Session> GenericClient for Transaction<S> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> RepoResult<Vec<Row>> {
        self.session()?.query(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> RepoResult<u64> {
        self.session()?.execute(sql, params).await
    }
}
