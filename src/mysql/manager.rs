use std::future::Future;

use bb8::ManageConnection;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts};

/// One MySQL session, as handed out by the pool.
pub struct MysqlConnection {
    pub(crate) conn: Conn,
}

impl MysqlConnection {
    /// Underlying driver connection, for statements the session layer does not cover.
    pub fn driver(&mut self) -> &mut Conn {
        &mut self.conn
    }
}

/// bb8 manager that dials MySQL and probes liveness with `COM_PING`.
#[derive(Clone)]
pub struct MysqlManager {
    opts: Opts,
}

impl MysqlManager {
    #[must_use]
    pub fn new(opts: Opts) -> Self {
        Self { opts }
    }

    #[must_use]
    pub fn opts(&self) -> &Opts {
        &self.opts
    }
}

impl ManageConnection for MysqlManager {
    type Connection = MysqlConnection;
    type Error = mysql_async::Error;

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let opts = self.opts.clone();
        async move { Conn::new(opts).await.map(|conn| MysqlConnection { conn }) }
    }

    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move { conn.conn.ping().await }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}
