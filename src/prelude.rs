//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::{
    DecodedRow, ExecOutcome, InvalidOperation, Pool, PoolConfig, ResultSet, RowValues,
    SqlConnection, SqlPool, SqlSession, StoreConfig, StoreMiddlewareError, Transaction,
    TransactionMode,
};

pub use crate::coercion::{TypeFamily, coerce, try_coerce};
pub use crate::decode::{ColumnDescriptor, RowCursor, decode};

#[cfg(feature = "mysql")]
pub use crate::mysql::{MysqlConfig, MysqlManager, MysqlPool};

#[cfg(feature = "redis")]
pub use crate::redis::{RedisConfig, RedisManager, RedisStore};
