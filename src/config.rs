//! Combined settings for both stores, loadable from JSON.

use serde::{Deserialize, Serialize};

use crate::error::StoreMiddlewareError;

#[cfg(feature = "mysql")]
use crate::mysql::MysqlConfig;
#[cfg(feature = "redis")]
use crate::redis::RedisConfig;

/// Settings for whichever stores a process uses; absent sections are not opened.
///
/// ```rust
/// use store_middleware::prelude::*;
///
/// let cfg = StoreConfig::from_json_str(r#"{
///     "mysql": {
///         "host": "127.0.0.1", "database": "app", "user": "svc", "password": "pw",
///         "pool": {"max_open_conns": 20, "max_idle_conns": 5},
///         "transaction_mode": "relaxed"
///     },
///     "redis": {"host": "127.0.0.1", "database": 2}
/// }"#)?;
/// # #[cfg(all(feature = "mysql", feature = "redis"))]
/// # {
/// let mysql = cfg.mysql.as_ref().unwrap();
/// assert_eq!(mysql.pool.max_open_conns, 20);
/// assert_eq!(mysql.transaction_mode, TransactionMode::Relaxed);
/// assert_eq!(cfg.redis.as_ref().unwrap().port, 6379);
/// # }
/// # Ok::<(), StoreMiddlewareError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[cfg(feature = "mysql")]
    #[serde(default)]
    pub mysql: Option<MysqlConfig>,
    #[cfg(feature = "redis")]
    #[serde(default)]
    pub redis: Option<RedisConfig>,
}

impl StoreConfig {
    /// # Errors
    /// Returns `StoreMiddlewareError::ConfigError` if the document is not valid JSON
    /// or does not match the expected shape.
    pub fn from_json_str(json: &str) -> Result<Self, StoreMiddlewareError> {
        serde_json::from_str(json)
            .map_err(|e| StoreMiddlewareError::ConfigError(format!("invalid store config: {e}")))
    }

    /// # Errors
    /// Returns `StoreMiddlewareError::ConfigError` if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, StoreMiddlewareError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            StoreMiddlewareError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_opens_nothing() {
        let cfg = StoreConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, StoreConfig::default());
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = StoreConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, StoreMiddlewareError::ConfigError(_)));
    }

    #[cfg(feature = "mysql")]
    #[test]
    fn unknown_transaction_mode_is_rejected() {
        let err = StoreConfig::from_json_str(
            r#"{"mysql": {"host": "h", "user": "u", "transaction_mode": "loose"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, StoreMiddlewareError::ConfigError(_)));
    }
}
