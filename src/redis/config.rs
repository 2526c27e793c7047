use serde::{Deserialize, Serialize};

use crate::error::StoreMiddlewareError;
use crate::pool::PoolConfig;

/// Idle connections older than this are closed when no timeout is configured.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 120;

fn default_port() -> u16 {
    6379
}

/// Connection settings for a [`super::RedisStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Sent with `AUTH` after dialing when non-empty
    #[serde(default)]
    pub password: String,
    /// Logical database passed to `SELECT`
    #[serde(default)]
    pub database: i64,
    #[serde(default)]
    pub pool: PoolConfig,
}

impl RedisConfig {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            password: String::new(),
            database: 0,
            pool: PoolConfig::default(),
        }
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    #[must_use]
    pub fn with_database(mut self, database: i64) -> Self {
        self.database = database;
        self
    }

    #[must_use]
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Validate the settings and return the pool ceilings to use, with the
    /// default idle timeout filled in.
    ///
    /// # Errors
    /// Returns `StoreMiddlewareError::ConfigError` for a missing host or a negative
    /// database index, or invalid pool ceilings.
    pub fn pool_config(&self) -> Result<PoolConfig, StoreMiddlewareError> {
        if self.host.is_empty() {
            return Err(StoreMiddlewareError::ConfigError(
                "host is required".to_string(),
            ));
        }
        if self.database < 0 {
            return Err(StoreMiddlewareError::ConfigError(format!(
                "invalid redis database index: {}",
                self.database
            )));
        }
        let mut pool = self.pool.validated()?;
        pool.idle_timeout_secs
            .get_or_insert(DEFAULT_IDLE_TIMEOUT_SECS);
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_json() {
        let cfg: RedisConfig = serde_json::from_str(r#"{"host": "cache"}"#).unwrap();
        assert_eq!(cfg, RedisConfig::new("cache", 6379));
    }

    #[test]
    fn idle_timeout_defaults_to_two_minutes() {
        let pool = RedisConfig::new("cache", 6379).pool_config().unwrap();
        assert_eq!(pool.idle_timeout_secs, Some(120));

        let custom = RedisConfig::new("cache", 6379).with_pool(PoolConfig {
            idle_timeout_secs: Some(5),
            ..PoolConfig::default()
        });
        assert_eq!(custom.pool_config().unwrap().idle_timeout_secs, Some(5));
    }

    #[test]
    fn rejects_negative_database() {
        let cfg = RedisConfig::new("cache", 6379).with_database(-1);
        assert!(matches!(
            cfg.pool_config().unwrap_err(),
            StoreMiddlewareError::ConfigError(_)
        ));
    }
}
