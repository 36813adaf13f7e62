//! Pool sizing policies per tenant class

use serde::{Deserialize, Serialize};

/// Size and recycle age of the pools built for one class of tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSizingPolicy {
    /// Number of connections a pool keeps open
    pub pool_size: usize,
    /// Seconds after which a connection is replaced
    pub recycle_secs: u64,
}

impl PoolSizingPolicy {
    pub fn new(pool_size: usize, recycle_secs: u64) -> Self {
        Self {
            pool_size,
            recycle_secs,
        }
    }
}
