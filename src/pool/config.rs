use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StoreMiddlewareError;

/// Connection ceilings for a [`super::Pool`].
///
/// ```rust
/// use store_middleware::prelude::*;
///
/// let cfg = PoolConfig { max_open_conns: 4, max_idle_conns: 10, ..PoolConfig::default() };
/// assert_eq!(cfg.validated()?.max_idle_conns, 4);
/// # Ok::<(), StoreMiddlewareError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Hard ceiling on connections checked out or being dialed at once
    pub max_open_conns: u32,
    /// Connections kept for reuse after release; clamped to `max_open_conns`
    pub max_idle_conns: u32,
    /// Idle connections older than this are closed instead of reused
    pub idle_timeout_secs: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_open_conns: 10,
            max_idle_conns: 2,
            idle_timeout_secs: None,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn new(max_open_conns: u32, max_idle_conns: u32) -> Self {
        Self {
            max_open_conns,
            max_idle_conns,
            idle_timeout_secs: None,
        }
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }

    /// Check the ceilings and clamp the idle ceiling to the open ceiling.
    ///
    /// # Errors
    /// Returns `StoreMiddlewareError::ConfigError` when `max_open_conns` is zero.
    pub fn validated(self) -> Result<Self, StoreMiddlewareError> {
        if self.max_open_conns == 0 {
            return Err(StoreMiddlewareError::ConfigError(
                "max_open_conns must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            max_idle_conns: self.max_idle_conns.min(self.max_open_conns),
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_open_conns_rejected() {
        let err = PoolConfig::new(0, 0).validated().unwrap_err();
        assert!(matches!(err, StoreMiddlewareError::ConfigError(_)));
    }

    #[test]
    fn idle_clamped_to_open() {
        let cfg = PoolConfig::new(3, 8).validated().unwrap();
        assert_eq!(cfg.max_idle_conns, 3);
        assert_eq!(PoolConfig::new(3, 1).validated().unwrap().max_idle_conns, 1);
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg: PoolConfig = serde_json::from_str(r#"{"max_open_conns": 20}"#).unwrap();
        assert_eq!(cfg.max_open_conns, 20);
        assert_eq!(cfg.max_idle_conns, 2);
        assert_eq!(cfg.idle_timeout(), None);
    }
}
