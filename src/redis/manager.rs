use std::future::Future;

use bb8::ManageConnection;
use redis::aio::MultiplexedConnection;
use redis::{Client, RedisError};

use super::config::RedisConfig;

/// bb8 manager that dials Redis, authenticates, selects the logical database and
/// tests connections with `PING`.
#[derive(Clone)]
pub struct RedisManager {
    client: Client,
    password: String,
    database: i64,
}

impl RedisManager {
    /// # Errors
    /// Returns the client's error if the address cannot be turned into connection info.
    pub fn new(config: &RedisConfig) -> Result<Self, RedisError> {
        let client = Client::open((config.host.as_str(), config.port))?;
        Ok(Self {
            client,
            password: config.password.clone(),
            database: config.database,
        })
    }
}

impl ManageConnection for RedisManager {
    type Connection = MultiplexedConnection;
    type Error = RedisError;

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let client = self.client.clone();
        let password = self.password.clone();
        let database = self.database;
        async move {
            let mut conn = client.get_multiplexed_async_connection().await?;
            if !password.is_empty() {
                let _: () = redis::cmd("AUTH")
                    .arg(&password)
                    .query_async(&mut conn)
                    .await?;
            }
            let _: () = redis::cmd("SELECT")
                .arg(database)
                .query_async(&mut conn)
                .await?;
            Ok(conn)
        }
    }

    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move {
            let _: String = redis::cmd("PING").query_async(conn).await?;
            Ok(())
        }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}
