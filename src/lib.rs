//! Pooled access to a MySQL relational store and a Redis key-value store.
//!
//! Rows come back as ordered name -> [`RowValues`] mappings, decoded from the raw
//! bytes each column carries according to the column's reported type. Statements
//! run through a [`SqlSession`]: either a [`SqlPool`] (autocommit, or the single
//! pool-level transaction in strict mode) or a [`Transaction`] handle (relaxed mode).

pub mod coercion;
pub mod config;
pub mod decode;
pub mod error;
pub mod pool;
pub mod prelude;
pub mod results;
pub mod session;
pub mod sql_pool;
pub mod store;
pub mod transaction;
pub mod types;

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "redis")]
pub mod redis;

pub use config::StoreConfig;
pub use error::{InvalidOperation, StoreMiddlewareError};
pub use pool::{Pool, PoolConfig, PoolState, PooledConnection};
pub use results::{DecodedRow, ExecOutcome, ResultSet};
pub use session::SqlSession;
pub use sql_pool::SqlPool;
pub use store::SqlConnection;
pub use transaction::Transaction;
pub use types::{RowValues, TransactionMode};

#[cfg(feature = "mysql")]
pub use crate::mysql::{MysqlConfig, MysqlPool};
#[cfg(feature = "redis")]
pub use crate::redis::{RedisConfig, RedisStore};
