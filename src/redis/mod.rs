// Redis module - key-value store wrapper over the redis crate
//
// - config: connection settings
// - manager: dialing, AUTH/SELECT and test-on-borrow PING for the pool
// - store: the RedisStore command surface

pub mod config;
pub mod manager;
pub mod store;

pub use config::RedisConfig;
pub use manager::RedisManager;
pub use store::RedisStore;
