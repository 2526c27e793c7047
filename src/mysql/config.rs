use mysql_async::{Opts, OptsBuilder};
use serde::{Deserialize, Serialize};

use super::manager::MysqlManager;
use crate::error::StoreMiddlewareError;
use crate::pool::PoolConfig;
use crate::sql_pool::SqlPool;
use crate::types::TransactionMode;

fn default_port() -> u16 {
    3306
}

fn default_charset() -> String {
    "utf8mb4".to_string()
}

/// Connection settings for a MySQL pool.
///
/// ```rust
/// use store_middleware::prelude::*;
///
/// let cfg: MysqlConfig = serde_json::from_str(
///     r#"{"host": "127.0.0.1", "database": "app", "user": "svc", "password": "pw"}"#,
/// ).unwrap();
/// assert_eq!(cfg.port, 3306);
/// assert_eq!(cfg.charset, "utf8mb4");
/// assert_eq!(cfg.transaction_mode, TransactionMode::Strict);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MysqlConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub database: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_charset")]
    pub charset: String,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub transaction_mode: TransactionMode,
}

impl MysqlConfig {
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            database: database.into(),
            user: user.into(),
            password: password.into(),
            charset: default_charset(),
            pool: PoolConfig::default(),
            transaction_mode: TransactionMode::default(),
        }
    }

    /// Read host, port, credentials and database from a `mysql://` URL.
    ///
    /// # Errors
    /// Returns `StoreMiddlewareError::UrlError` if the URL does not parse.
    pub fn from_url(url: &str) -> Result<Self, StoreMiddlewareError> {
        let opts = Opts::from_url(url)?;
        Ok(Self {
            host: opts.ip_or_hostname().to_string(),
            port: opts.tcp_port(),
            database: opts.db_name().unwrap_or_default().to_string(),
            user: opts.user().unwrap_or_default().to_string(),
            password: opts.pass().unwrap_or_default().to_string(),
            charset: default_charset(),
            pool: PoolConfig::default(),
            transaction_mode: TransactionMode::default(),
        })
    }

    #[must_use]
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    #[must_use]
    pub fn with_transaction_mode(mut self, mode: TransactionMode) -> Self {
        self.transaction_mode = mode;
        self
    }

    /// Validate the settings and build driver options.
    ///
    /// # Errors
    /// Returns `StoreMiddlewareError::ConfigError` if a required field is missing or
    /// the charset is not a plain identifier.
    pub fn opts(&self) -> Result<Opts, StoreMiddlewareError> {
        if self.host.is_empty() {
            return Err(StoreMiddlewareError::ConfigError(
                "host is required".to_string(),
            ));
        }
        if self.user.is_empty() {
            return Err(StoreMiddlewareError::ConfigError(
                "user is required".to_string(),
            ));
        }
        // Interpolated into SET NAMES, so only identifiers are accepted.
        if self.charset.is_empty()
            || !self
                .charset
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(StoreMiddlewareError::ConfigError(format!(
                "invalid charset: {:?}",
                self.charset
            )));
        }

        let builder = OptsBuilder::default()
            .ip_or_hostname(self.host.clone())
            .tcp_port(self.port)
            .user(Some(self.user.clone()))
            .pass((!self.password.is_empty()).then(|| self.password.clone()))
            .db_name((!self.database.is_empty()).then(|| self.database.clone()))
            .init(vec![format!("SET NAMES {}", self.charset)]);
        Ok(Opts::from(builder))
    }
}

impl SqlPool<MysqlManager> {
    /// Build a MySQL pool and verify the server is reachable.
    ///
    /// # Errors
    /// `ConfigError` for invalid settings, `ConnectivityError` if the first
    /// connection cannot be opened and pinged.
    pub async fn new_mysql(config: MysqlConfig) -> Result<Self, StoreMiddlewareError> {
        let opts = config.opts()?;
        let pool = SqlPool::new(
            MysqlManager::new(opts),
            config.pool,
            config.transaction_mode,
        )?;
        pool.pool().ping().await?;
        tracing::debug!(
            host = %config.host,
            port = config.port,
            mode = config.transaction_mode.as_str(),
            "mysql pool ready"
        );
        Ok(pool)
    }

    /// [`Self::new_mysql`] from a `mysql://` URL.
    ///
    /// # Errors
    /// `UrlError` if the URL does not parse, else as [`Self::new_mysql`].
    pub async fn new_mysql_from_url(
        url: &str,
        pool: PoolConfig,
        mode: TransactionMode,
    ) -> Result<Self, StoreMiddlewareError> {
        let config = MysqlConfig::from_url(url)?
            .with_pool(pool)
            .with_transaction_mode(mode);
        Self::new_mysql(config).await
    }
}
