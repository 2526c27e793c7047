use thiserror::Error;

/// Misuse of the transaction lifecycle. Raising one never changes transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidOperation {
    #[error("operation invalid: transaction already open")]
    TransactionAlreadyOpen,

    #[error("commit invalid: no open transaction")]
    CommitWithoutTransaction,

    #[error("rollback invalid: no open transaction")]
    RollbackWithoutTransaction,

    #[error("operation invalid: pool is configured for {0} transactions")]
    WrongTransactionMode(&'static str),
}

#[derive(Debug, Error)]
pub enum StoreMiddlewareError {
    #[cfg(feature = "mysql")]
    #[error(transparent)]
    UrlError(#[from] mysql_async::UrlError),

    #[error(transparent)]
    InvalidOperation(#[from] InvalidOperation),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connectivity error: {0}")]
    ConnectivityError(String),

    #[error("Statement error: {0}")]
    StatementError(String),

    #[error("Cursor error: {0}")]
    CursorError(String),

    #[error("sql: no rows in result set")]
    NotFound,

    #[error("sql: more than one row ({0} returned)")]
    TooManyRows(usize),

    #[error("Key-value store error: {0}")]
    KvError(String),
}

impl StoreMiddlewareError {
    /// True when the error came from the reachability probe or dialing, before any
    /// statement was attempted.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::ConnectivityError(_))
    }
}
