//! Pool cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tenantdb_core::{Result, TenantDbError};

/// Configuration for a [`PoolCache`](super::PoolCache)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached pools
    maxsize: usize,
    /// Lifetime of an entry in seconds, counted from insertion
    #[serde(with = "duration_secs")]
    default_ttl: Duration,
    /// Seconds between two sweeps of expired entries
    #[serde(with = "duration_secs")]
    sweep_interval: Duration,
}

impl CacheConfig {
    /// Create a cache configuration with the given capacity and entry lifetime
    pub fn new(maxsize: usize, default_ttl: Duration) -> Self {
        Self {
            maxsize,
            default_ttl,
            sweep_interval: Duration::from_secs(60),
        }
    }

    /// Set the interval between sweeps
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Reject configurations the cache cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.maxsize == 0 {
            return Err(TenantDbError::Configuration(
                "cache maxsize must be greater than 0".into(),
            ));
        }
        if self.default_ttl.is_zero() {
            return Err(TenantDbError::Configuration(
                "cache ttl must be greater than 0".into(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(TenantDbError::Configuration(
                "cache sweep interval must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn maxsize(&self) -> usize {
        self.maxsize
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }
}

impl Default for CacheConfig {
    /// Defaults:
    /// - maxsize: 10
    /// - default_ttl: 15 minutes
    /// - sweep_interval: 60 seconds
    fn default() -> Self {
        Self::new(10, Duration::from_secs(900))
    }
}

/// Durations as seconds, fractions allowed
mod duration_secs {
    use std::time::Duration;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() == 0 {
            duration.as_secs().serialize(serializer)
        } else {
            duration.as_secs_f64().serialize(serializer)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
