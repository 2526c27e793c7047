//! Bounded connection pool over a `bb8::ManageConnection`.
//!
//! `max_open_conns` is enforced by a semaphore: checkout waits for a permit and never
//! queues past it. Released connections go onto a LIFO idle stack capped at
//! `max_idle_conns`. Only the idle stack is behind a lock; statements run on the
//! checked-out connection without touching shared state.

pub mod config;
mod connection;

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use bb8::ManageConnection;
use tokio::sync::Semaphore;

use crate::error::StoreMiddlewareError;

pub use config::PoolConfig;
pub use connection::PooledConnection;

pub(crate) struct IdleConnection<C> {
    pub(crate) conn: C,
    pub(crate) idle_since: Instant,
}

pub(crate) struct Shared<M: ManageConnection> {
    pub(crate) manager: M,
    pub(crate) config: PoolConfig,
    permits: Arc<Semaphore>,
    idle: Mutex<Vec<IdleConnection<M::Connection>>>,
    closed: AtomicBool,
}

impl<M: ManageConnection> Shared<M> {
    pub(crate) fn lock_idle(&self) -> MutexGuard<'_, Vec<IdleConnection<M::Connection>>> {
        match self.idle.lock() {
            Ok(guard) => guard,
            // The stack holds plain connections; a panic elsewhere cannot leave it torn.
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Snapshot of pool accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    /// Connections currently checked out (or being dialed)
    pub in_use: usize,
    /// Connections parked for reuse
    pub idle: usize,
}

/// Shared handle to a bounded set of store connections. Cloning is cheap; every clone
/// refers to the same connections.
pub struct Pool<M: ManageConnection> {
    shared: Arc<Shared<M>>,
}

impl<M: ManageConnection> Clone for Pool<M> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<M: ManageConnection> std::fmt::Debug for Pool<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.shared.config)
            .field("state", &self.state())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<M> Pool<M>
where
    M: ManageConnection,
    M::Error: Display,
{
    /// Build a pool. No connection is opened until the first checkout.
    ///
    /// # Errors
    /// Returns `StoreMiddlewareError::ConfigError` if the ceilings are invalid.
    pub fn new(manager: M, config: PoolConfig) -> Result<Self, StoreMiddlewareError> {
        let config = config.validated()?;
        Ok(Self {
            shared: Arc::new(Shared {
                manager,
                permits: Arc::new(Semaphore::new(config.max_open_conns as usize)),
                idle: Mutex::new(Vec::with_capacity(config.max_idle_conns as usize)),
                closed: AtomicBool::new(false),
                config,
            }),
        })
    }

    /// Check out a connection, waiting while `max_open_conns` are in use.
    ///
    /// Reuses the most recently released idle connection when there is one, dials a
    /// new one otherwise, then probes it with the manager's liveness check. A failed
    /// probe closes the connection and is returned as-is; it is not retried.
    ///
    /// # Errors
    /// `ConnectivityError` when the pool is closed, dialing fails, or the liveness
    /// check fails.
    pub async fn get(&self) -> Result<PooledConnection<M>, StoreMiddlewareError> {
        if self.is_closed() {
            return Err(pool_closed());
        }
        let permit = Arc::clone(&self.shared.permits)
            .acquire_owned()
            .await
            .map_err(|_| pool_closed())?;

        let mut conn = match self.take_idle() {
            Some(conn) => conn,
            None => {
                tracing::debug!("opening new store connection");
                self.shared.manager.connect().await.map_err(|e| {
                    StoreMiddlewareError::ConnectivityError(format!("connect failed: {e}"))
                })?
            }
        };

        if let Err(e) = self.shared.manager.is_valid(&mut conn).await {
            tracing::warn!("dropping unreachable connection: {e}");
            return Err(StoreMiddlewareError::ConnectivityError(format!(
                "liveness check failed: {e}"
            )));
        }

        Ok(PooledConnection::new(conn, Arc::clone(&self.shared), permit))
    }

    /// Verify the store is reachable by checking out (and returning) one connection.
    ///
    /// # Errors
    /// Same as [`Self::get`].
    pub async fn ping(&self) -> Result<(), StoreMiddlewareError> {
        self.get().await.map(drop)
    }

    fn take_idle(&self) -> Option<M::Connection> {
        let idle_timeout = self.shared.config.idle_timeout();
        let mut stale = Vec::new();
        let found = {
            let mut idle = self.shared.lock_idle();
            let mut found = None;
            while let Some(mut entry) = idle.pop() {
                let expired = idle_timeout.is_some_and(|t| entry.idle_since.elapsed() >= t);
                if expired || self.shared.manager.has_broken(&mut entry.conn) {
                    stale.push(entry);
                    continue;
                }
                found = Some(entry.conn);
                break;
            }
            found
        };
        if !stale.is_empty() {
            tracing::debug!(count = stale.len(), "closing stale idle connections");
        }
        found
    }
}

impl<M: ManageConnection> Pool<M> {
    #[must_use]
    pub fn state(&self) -> PoolState {
        let max_open = self.shared.config.max_open_conns as usize;
        PoolState {
            in_use: max_open.saturating_sub(self.shared.permits.available_permits()),
            idle: self.shared.lock_idle().len(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }

    #[must_use]
    pub fn manager(&self) -> &M {
        &self.shared.manager
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Stop handing out connections and close the idle ones. Checked-out connections
    /// are closed as they are released. Idempotent.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.permits.close();
        let drained: Vec<_> = self.shared.lock_idle().drain(..).collect();
        tracing::debug!(idle = drained.len(), "pool closed");
    }
}

fn pool_closed() -> StoreMiddlewareError {
    StoreMiddlewareError::ConnectivityError("pool is closed".to_string())
}
