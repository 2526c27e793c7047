// MySQL module - relational store backend over mysql_async
//
// - config: connection settings and pool construction
// - manager: dialing and liveness probe for the pool
// - params: parameter conversion between RowValues and mysql_async values
// - query: statement execution, cursor and column type tags

pub mod config;
pub mod manager;
pub mod params;
pub mod query;

pub use config::MysqlConfig;
pub use manager::{MysqlConnection, MysqlManager};
pub use params::Params;
pub use query::MysqlCursor;

/// Relational store pool backed by MySQL.
pub type MysqlPool = crate::SqlPool<MysqlManager>;
