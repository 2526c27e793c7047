//! Independent transaction handles (relaxed mode).

use std::fmt::{self, Display};

use bb8::ManageConnection;

use crate::error::StoreMiddlewareError;
use crate::pool::PooledConnection;
use crate::results::{ExecOutcome, ResultSet};
use crate::session::{SqlSession, run_query};
use crate::store::SqlConnection;
use crate::types::RowValues;

/// One explicit transaction, bound to one pooled connection for its whole life.
///
/// `commit` and `rollback` consume the handle, so nothing can be issued after
/// either. A handle dropped without them closes its connection rather than
/// returning a connection with an open transaction to the pool.
pub struct Transaction<M: ManageConnection> {
    conn: PooledConnection<M>,
    finished: bool,
}

impl<M: ManageConnection> fmt::Debug for Transaction<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<M> Transaction<M>
where
    M: ManageConnection,
    M::Connection: SqlConnection,
    M::Error: Display,
{
    /// Open a transaction on an already checked-out connection.
    ///
    /// # Errors
    /// Returns the store's error if the transaction cannot be started; the connection
    /// is closed in that case.
    pub async fn begin(mut conn: PooledConnection<M>) -> Result<Self, StoreMiddlewareError> {
        if let Err(e) = conn.begin().await {
            conn.discard();
            return Err(e);
        }
        tracing::debug!("transaction opened");
        Ok(Self {
            conn,
            finished: false,
        })
    }

    /// Commit and hand the connection back to the pool.
    ///
    /// # Errors
    /// Returns the store's error; the connection is then closed, not reused.
    pub async fn commit(mut self) -> Result<(), StoreMiddlewareError> {
        let outcome = self.conn.commit().await;
        self.finish(outcome, "committed")
    }

    /// Roll back and hand the connection back to the pool.
    ///
    /// # Errors
    /// Returns the store's error; the connection is then closed, not reused.
    pub async fn rollback(mut self) -> Result<(), StoreMiddlewareError> {
        let outcome = self.conn.rollback().await;
        self.finish(outcome, "rolled back")
    }

    fn finish(
        &mut self,
        outcome: Result<(), StoreMiddlewareError>,
        action: &str,
    ) -> Result<(), StoreMiddlewareError> {
        self.finished = true;
        match outcome {
            Ok(()) => tracing::debug!("transaction {action}"),
            Err(_) => self.conn.discard(),
        }
        outcome
    }
}

impl<M> SqlSession for Transaction<M>
where
    M: ManageConnection,
    M::Connection: SqlConnection,
    M::Error: Display,
{
    async fn query(
        &mut self,
        statement: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, StoreMiddlewareError> {
        run_query(&mut *self.conn, statement, params).await
    }

    async fn exec(
        &mut self,
        statement: &str,
        params: &[RowValues],
    ) -> Result<ExecOutcome, StoreMiddlewareError> {
        self.conn.exec(statement, params).await
    }
}

impl<M: ManageConnection> Drop for Transaction<M> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("transaction dropped without commit or rollback; closing its connection");
            self.conn.discard();
        }
    }
}
