//! Pool-direct sessions and the pool-level transaction lifecycle.

use std::fmt::Display;
use std::sync::Arc;

use bb8::ManageConnection;
use tokio::sync::Mutex;

use crate::error::{InvalidOperation, StoreMiddlewareError};
use crate::pool::{Pool, PoolConfig, PooledConnection};
use crate::results::{DecodedRow, ExecOutcome, ResultSet};
use crate::session::{SqlSession, run_query};
use crate::store::SqlConnection;
use crate::transaction::Transaction;
use crate::types::{RowValues, TransactionMode};

/// Handle to a relational store pool. Create one per process and clone it into
/// every consumer; clones share connections and transaction state.
///
/// Statements run in autocommit on a freshly probed pooled connection, except in
/// [`TransactionMode::Strict`] while a pool-level transaction is open: then every
/// statement issued through the handle runs inside that transaction.
///
/// ```rust,no_run
/// use store_middleware::prelude::*;
///
/// # async fn demo(pool: MysqlPool) -> Result<(), StoreMiddlewareError> {
/// pool.transaction().await?;
/// pool.update("UPDATE t SET name = ? WHERE id = ?", &["bob".into(), 5_i64.into()]).await?;
/// assert!(pool.transaction().await.is_err()); // only one per pool
/// pool.commit().await?;
/// # Ok(()) }
/// ```
pub struct SqlPool<M: ManageConnection> {
    pool: Pool<M>,
    mode: TransactionMode,
    active: Arc<Mutex<Option<PooledConnection<M>>>>,
}

impl<M: ManageConnection> Clone for SqlPool<M> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            mode: self.mode,
            active: Arc::clone(&self.active),
        }
    }
}

impl<M: ManageConnection> std::fmt::Debug for SqlPool<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlPool")
            .field("pool", &self.pool)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl<M> SqlPool<M>
where
    M: ManageConnection,
    M::Connection: SqlConnection,
    M::Error: Display,
{
    /// Wrap a connection manager in a bounded pool.
    ///
    /// # Errors
    /// Returns `StoreMiddlewareError::ConfigError` if the pool ceilings are invalid.
    pub fn new(
        manager: M,
        config: PoolConfig,
        mode: TransactionMode,
    ) -> Result<Self, StoreMiddlewareError> {
        Ok(Self::from_pool(Pool::new(manager, config)?, mode))
    }

    #[must_use]
    pub fn from_pool(pool: Pool<M>, mode: TransactionMode) -> Self {
        Self {
            pool,
            mode,
            active: Arc::new(Mutex::new(None)),
        }
    }

    #[must_use]
    pub fn pool(&self) -> &Pool<M> {
        &self.pool
    }

    #[must_use]
    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    fn require_mode(&self, mode: TransactionMode) -> Result<(), StoreMiddlewareError> {
        if self.mode == mode {
            Ok(())
        } else {
            Err(InvalidOperation::WrongTransactionMode(self.mode.as_str()).into())
        }
    }

    /// Run a read statement and decode every row.
    ///
    /// # Errors
    /// `ConnectivityError` if the held transaction connection fails its ping or no
    /// reachable connection can be checked out (the statement is not attempted),
    /// otherwise the store's statement or cursor error.
    pub async fn query(
        &self,
        statement: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, StoreMiddlewareError> {
        if self.mode == TransactionMode::Strict {
            let mut active = self.active.lock().await;
            if let Some(conn) = active.as_mut() {
                self.probe(conn).await?;
                return run_query(&mut **conn, statement, params).await;
            }
        }
        let mut conn = self.pool.get().await?;
        run_query(&mut *conn, statement, params).await
    }

    /// Run a mutating statement.
    ///
    /// # Errors
    /// Same as [`Self::query`].
    pub async fn exec(
        &self,
        statement: &str,
        params: &[RowValues],
    ) -> Result<ExecOutcome, StoreMiddlewareError> {
        if self.mode == TransactionMode::Strict {
            let mut active = self.active.lock().await;
            if let Some(conn) = active.as_mut() {
                self.probe(conn).await?;
                return conn.exec(statement, params).await;
            }
        }
        let mut conn = self.pool.get().await?;
        conn.exec(statement, params).await
    }

    /// Run a read statement that must match exactly one row.
    ///
    /// # Errors
    /// `NotFound` / `TooManyRows` on the wrong cardinality, else as [`Self::query`].
    pub async fn get_one(
        &self,
        statement: &str,
        params: &[RowValues],
    ) -> Result<DecodedRow, StoreMiddlewareError> {
        self.query(statement, params).await?.into_single_row()
    }

    /// # Errors
    /// Same as [`Self::exec`].
    pub async fn update(
        &self,
        statement: &str,
        params: &[RowValues],
    ) -> Result<u64, StoreMiddlewareError> {
        Ok(self.exec(statement, params).await?.rows_affected)
    }

    /// # Errors
    /// Same as [`Self::exec`].
    pub async fn insert(
        &self,
        statement: &str,
        params: &[RowValues],
    ) -> Result<u64, StoreMiddlewareError> {
        Ok(self.exec(statement, params).await?.last_insert_id)
    }

    /// # Errors
    /// Same as [`Self::exec`].
    pub async fn delete(
        &self,
        statement: &str,
        params: &[RowValues],
    ) -> Result<u64, StoreMiddlewareError> {
        Ok(self.exec(statement, params).await?.rows_affected)
    }

    /// Start an independent transaction on its own connection (relaxed mode).
    ///
    /// # Errors
    /// `InvalidOperation` on a strict pool, `ConnectivityError` if no reachable
    /// connection is available, or the store's error starting the transaction.
    pub async fn begin(&self) -> Result<Transaction<M>, StoreMiddlewareError> {
        self.require_mode(TransactionMode::Relaxed)?;
        let conn = self.pool.get().await?;
        Transaction::begin(conn).await
    }

    /// Open the pool-level transaction (strict mode).
    ///
    /// # Errors
    /// `InvalidOperation::TransactionAlreadyOpen` if one is already open (it stays
    /// open), `InvalidOperation::WrongTransactionMode` on a relaxed pool,
    /// `ConnectivityError` if no reachable connection is available, or the store's
    /// error starting the transaction.
    pub async fn transaction(&self) -> Result<(), StoreMiddlewareError> {
        self.require_mode(TransactionMode::Strict)?;
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(InvalidOperation::TransactionAlreadyOpen.into());
        }
        let mut conn = self.pool.get().await?;
        if let Err(e) = conn.begin().await {
            conn.discard();
            return Err(e);
        }
        tracing::debug!("pool-level transaction opened");
        *active = Some(conn);
        Ok(())
    }

    /// Whether the pool-level transaction is open.
    pub async fn in_transaction(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Commit the pool-level transaction and release its connection.
    ///
    /// # Errors
    /// `InvalidOperation::CommitWithoutTransaction` when none is open. A liveness or
    /// store failure leaves the transaction open so the caller can roll back.
    pub async fn commit(&self) -> Result<(), StoreMiddlewareError> {
        self.require_mode(TransactionMode::Strict)?;
        let mut active = self.active.lock().await;
        let Some(conn) = active.as_mut() else {
            return Err(InvalidOperation::CommitWithoutTransaction.into());
        };
        self.probe(conn).await?;
        conn.commit().await?;
        *active = None;
        tracing::debug!("pool-level transaction committed");
        Ok(())
    }

    /// Roll back the pool-level transaction and release its connection.
    ///
    /// # Errors
    /// `InvalidOperation::RollbackWithoutTransaction` when none is open. A liveness or
    /// store failure leaves the transaction open.
    pub async fn rollback(&self) -> Result<(), StoreMiddlewareError> {
        self.require_mode(TransactionMode::Strict)?;
        let mut active = self.active.lock().await;
        let Some(conn) = active.as_mut() else {
            return Err(InvalidOperation::RollbackWithoutTransaction.into());
        };
        self.probe(conn).await?;
        conn.rollback().await?;
        *active = None;
        tracing::debug!("pool-level transaction rolled back");
        Ok(())
    }

    async fn probe(&self, conn: &mut PooledConnection<M>) -> Result<(), StoreMiddlewareError> {
        self.pool
            .manager()
            .is_valid(&mut **conn)
            .await
            .map_err(|e| StoreMiddlewareError::ConnectivityError(format!("liveness check failed: {e}")))
    }

    /// Close the pool.
    ///
    /// An open pool-level transaction is committed first; callers who want it
    /// rolled back must call [`Self::rollback`] before closing. The pool is closed
    /// even when that commit fails.
    ///
    /// # Errors
    /// Returns the implicit commit's error, after the pool has been closed.
    pub async fn close(&self) -> Result<(), StoreMiddlewareError> {
        let pending = self.active.lock().await.take();
        let mut outcome = Ok(());
        if let Some(mut conn) = pending {
            tracing::warn!("closing pool with an open transaction; committing it");
            if let Err(e) = conn.commit().await {
                conn.discard();
                outcome = Err(e);
            }
        }
        self.pool.close();
        outcome
    }
}

impl<M> SqlSession for SqlPool<M>
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
        SqlPool::query(self, statement, params).await
    }

    async fn exec(
        &mut self,
        statement: &str,
        params: &[RowValues],
    ) -> Result<ExecOutcome, StoreMiddlewareError> {
        SqlPool::exec(self, statement, params).await
    }
}
