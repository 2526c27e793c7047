use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;

use bb8::ManageConnection;
use tokio::sync::OwnedSemaphorePermit;

use super::{IdleConnection, Shared};

/// A connection checked out of a [`super::Pool`].
///
/// Dropping it gives the connection back: it is kept for reuse while the idle stack
/// is under `max_idle_conns`, closed otherwise. The open-connection permit is freed
/// either way.
pub struct PooledConnection<M: ManageConnection> {
    conn: Option<M::Connection>,
    shared: Arc<Shared<M>>,
    discard: bool,
    _permit: OwnedSemaphorePermit,
}

impl<M: ManageConnection> PooledConnection<M> {
    pub(super) fn new(
        conn: M::Connection,
        shared: Arc<Shared<M>>,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        Self {
            conn: Some(conn),
            shared,
            discard: false,
            _permit: permit,
        }
    }

    /// Close the connection on release instead of returning it to the idle stack.
    pub fn discard(&mut self) {
        self.discard = true;
    }
}

impl<M: ManageConnection> Deref for PooledConnection<M> {
    type Target = M::Connection;

    fn deref(&self) -> &Self::Target {
        // `conn` is only taken in `drop`.
        self.conn.as_ref().expect("pooled connection present until drop")
    }
}

impl<M: ManageConnection> DerefMut for PooledConnection<M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().expect("pooled connection present until drop")
    }
}

impl<M: ManageConnection> Drop for PooledConnection<M> {
    fn drop(&mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };
        if self.discard || self.shared.is_closed() || self.shared.manager.has_broken(&mut conn) {
            tracing::debug!("closing released connection");
            return;
        }
        let overflow = {
            let mut idle = self.shared.lock_idle();
            if idle.len() < self.shared.config.max_idle_conns as usize {
                idle.push(IdleConnection {
                    conn,
                    idle_since: Instant::now(),
                });
                None
            } else {
                Some(conn)
            }
        };
        drop(overflow);
    }
}
