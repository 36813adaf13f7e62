//! Pool configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tenantdb_core::{Result, TenantDbError};

/// Configuration for a connection pool
///
/// Controls pool sizing, timeouts, and connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of connections kept open in the pool
    pool_size: usize,
    /// Extra connections allowed beyond `pool_size` under load
    max_overflow: usize,
    /// Timeout in milliseconds when acquiring a connection from the pool
    acquire_timeout_ms: u64,
    /// Age in seconds after which a connection is recycled, if set; 0 recycles
    /// on every checkout
    recycle_secs: Option<u64>,
    /// Ping idle connections before handing them out
    pre_ping: bool,
    /// Keep credentials and parameters out of logs and debug output
    hide_parameters: bool,
}

impl PoolConfig {
    /// Create a new pool configuration with the given size and overflow
    pub fn new(pool_size: usize, max_overflow: usize) -> Self {
        Self {
            pool_size,
            max_overflow,
            acquire_timeout_ms: 30_000, // 30 seconds default
            recycle_secs: None,
            pre_ping: false,
            hide_parameters: false,
        }
    }

    /// Set the acquire timeout in milliseconds
    pub fn with_acquire_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.acquire_timeout_ms = timeout_ms;
        self
    }

    /// Set the connection recycle age in seconds
    pub fn with_recycle_secs(mut self, recycle_secs: u64) -> Self {
        self.recycle_secs = Some(recycle_secs);
        self
    }

    /// Enable or disable pinging connections on checkout
    pub fn with_pre_ping(mut self, pre_ping: bool) -> Self {
        self.pre_ping = pre_ping;
        self
    }

    /// Enable or disable redaction of connection parameters
    pub fn with_hide_parameters(mut self, hide: bool) -> Self {
        self.hide_parameters = hide;
        self
    }

    /// Check the configuration can back a working pool
    pub fn validate(&self) -> Result<()> {
        if self.max_connections() == 0 {
            return Err(TenantDbError::Configuration(
                "pool_size + max_overflow must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Get the number of connections the pool keeps
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Get the number of overflow connections
    pub fn max_overflow(&self) -> usize {
        self.max_overflow
    }

    /// Upper bound on simultaneously checked out connections
    pub fn max_connections(&self) -> usize {
        self.pool_size + self.max_overflow
    }

    /// Get the acquire timeout as a Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Get the recycle age as a Duration if set
    pub fn recycle(&self) -> Option<Duration> {
        self.recycle_secs.map(Duration::from_secs)
    }

    pub fn pre_ping(&self) -> bool {
        self.pre_ping
    }

    pub fn hide_parameters(&self) -> bool {
        self.hide_parameters
    }
}

impl Default for PoolConfig {
    /// Create a default pool configuration
    ///
    /// Defaults:
    /// - pool_size: 5
    /// - max_overflow: 10
    /// - acquire_timeout: 30 seconds
    /// - recycle: None
    /// - pre_ping: false
    /// - hide_parameters: false
    fn default() -> Self {
        Self::new(5, 10)
    }
}
