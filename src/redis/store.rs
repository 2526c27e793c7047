use std::collections::HashMap;
use std::time::Duration;

use redis::{Cmd, FromRedisValue, ToRedisArgs, Value};

use super::config::RedisConfig;
use super::manager::RedisManager;
use crate::error::StoreMiddlewareError;
use crate::pool::{Pool, PoolState};

/// Pooled Redis client. Every call checks out one connection (tested with `PING`
/// first), runs one command and returns the connection.
///
/// Reads of missing keys come back as `None` rather than an error:
/// ```rust,no_run
/// use store_middleware::prelude::*;
///
/// # async fn demo() -> Result<(), StoreMiddlewareError> {
/// let store = RedisStore::new(RedisConfig::new("127.0.0.1", 6379)).await?;
/// store.set_string("greeting", "hello").await?;
/// assert_eq!(store.get_string("greeting").await?.as_deref(), Some("hello"));
/// assert_eq!(store.get_string("missing").await?, None);
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct RedisStore {
    pool: Pool<RedisManager>,
}

impl RedisStore {
    /// Build the pool and verify the server answers `PING`.
    ///
    /// # Errors
    /// `ConfigError` for invalid settings, `ConnectivityError` if the first
    /// connection cannot be dialed, authenticated, or pinged.
    pub async fn new(config: RedisConfig) -> Result<Self, StoreMiddlewareError> {
        let pool_config = config.pool_config()?;
        let manager = RedisManager::new(&config).map_err(|e| {
            StoreMiddlewareError::ConfigError(format!("invalid redis address: {e}"))
        })?;
        let store = Self {
            pool: Pool::new(manager, pool_config)?,
        };
        store.pool.ping().await?;
        tracing::debug!(host = %config.host, port = config.port, db = config.database, "redis pool ready");
        Ok(store)
    }

    #[must_use]
    pub fn state(&self) -> PoolState {
        self.pool.state()
    }

    async fn run<T: FromRedisValue>(&self, cmd: Cmd) -> Result<T, StoreMiddlewareError> {
        let mut conn = self.pool.get().await?;
        cmd.query_async(&mut *conn)
            .await
            .map_err(|e| StoreMiddlewareError::KvError(format!("Redis command failed: {e}")))
    }

    /// Run an arbitrary command and return the raw reply.
    ///
    /// # Errors
    /// `ConnectivityError` if no reachable connection is available, `KvError` if the
    /// server rejects the command.
    pub async fn do_command<A: ToRedisArgs>(
        &self,
        command: &str,
        args: A,
    ) -> Result<Value, StoreMiddlewareError> {
        let mut cmd = redis::cmd(command);
        cmd.arg(args);
        self.run(cmd).await
    }

    /// `SET key value`.
    ///
    /// # Errors
    /// Same as [`Self::do_command`].
    pub async fn set_string<V: ToRedisArgs>(
        &self,
        key: &str,
        value: V,
    ) -> Result<(), StoreMiddlewareError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        self.run(cmd).await
    }

    /// `SET key value EX seconds`.
    ///
    /// # Errors
    /// Same as [`Self::do_command`].
    pub async fn set_string_with_ttl<V: ToRedisArgs>(
        &self,
        key: &str,
        value: V,
        ttl: Duration,
    ) -> Result<(), StoreMiddlewareError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("EX").arg(ttl.as_secs().max(1));
        self.run(cmd).await
    }

    /// # Errors
    /// Same as [`Self::do_command`], plus `KvError` if the value is not text.
    pub async fn get_string(&self, key: &str) -> Result<Option<String>, StoreMiddlewareError> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.run(cmd).await
    }

    /// # Errors
    /// Same as [`Self::do_command`].
    pub async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StoreMiddlewareError> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.run(cmd).await
    }

    /// # Errors
    /// Same as [`Self::do_command`], plus `KvError` if the value is not an integer.
    pub async fn get_i64(&self, key: &str) -> Result<Option<i64>, StoreMiddlewareError> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.run(cmd).await
    }

    /// Delete a key, returning how many keys were removed.
    ///
    /// # Errors
    /// Same as [`Self::do_command`].
    pub async fn del_key(&self, key: &str) -> Result<u64, StoreMiddlewareError> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        self.run(cmd).await
    }

    /// Set a key's time to live; `false` when the key does not exist.
    ///
    /// # Errors
    /// Same as [`Self::do_command`].
    pub async fn expire_key(&self, key: &str, seconds: i64) -> Result<bool, StoreMiddlewareError> {
        let mut cmd = redis::cmd("EXPIRE");
        cmd.arg(key).arg(seconds);
        self.run(cmd).await
    }

    /// `KEYS pattern`. Scans the whole keyspace on the server.
    ///
    /// # Errors
    /// Same as [`Self::do_command`].
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreMiddlewareError> {
        let mut cmd = redis::cmd("KEYS");
        cmd.arg(pattern);
        self.run(cmd).await
    }

    /// `KEYS pattern` without UTF-8 decoding of the key names.
    ///
    /// # Errors
    /// Same as [`Self::do_command`].
    pub async fn keys_bytes(&self, pattern: &str) -> Result<Vec<Vec<u8>>, StoreMiddlewareError> {
        let mut cmd = redis::cmd("KEYS");
        cmd.arg(pattern);
        self.run(cmd).await
    }

    /// Write every field of `fields` into the hash at `key`. An empty map is a no-op.
    ///
    /// # Errors
    /// Same as [`Self::do_command`].
    pub async fn set_hash_map<V: ToRedisArgs>(
        &self,
        key: &str,
        fields: &HashMap<String, V>,
    ) -> Result<(), StoreMiddlewareError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in fields {
            cmd.arg(field).arg(value);
        }
        self.run(cmd).await
    }

    /// # Errors
    /// Same as [`Self::do_command`].
    pub async fn get_hash_map_string(
        &self,
        key: &str,
    ) -> Result<HashMap<String, String>, StoreMiddlewareError> {
        let mut cmd = redis::cmd("HGETALL");
        cmd.arg(key);
        self.run(cmd).await
    }

    /// # Errors
    /// Same as [`Self::do_command`], plus `KvError` if a field is not an integer.
    pub async fn get_hash_map_i64(
        &self,
        key: &str,
    ) -> Result<HashMap<String, i64>, StoreMiddlewareError> {
        let mut cmd = redis::cmd("HGETALL");
        cmd.arg(key);
        self.run(cmd).await
    }

    /// Close idle connections and refuse further commands.
    pub fn close(&self) {
        self.pool.close();
    }
}
