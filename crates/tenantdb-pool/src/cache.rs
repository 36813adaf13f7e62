//! Tenant pool cache with individual time-to-live
//!
//! Pools are expensive to set up, so each tenant's pool is cached and reused
//! across sessions. Entries expire a fixed time after insertion and are
//! removed by a background sweeper, which lets pools of inactive tenants
//! release their connections.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use tenantdb_pool::cache::{CacheConfig, PoolCache};
//!
//! let cache = PoolCache::new(CacheConfig::new(10, Duration::from_secs(900)))?;
//! cache.set("tenantA", pool);
//! assert!(cache.get(&"tenantA".into()).is_some());
//! ```

mod cache;
mod config;
mod sweeper;


pub use cache::PoolCache;
pub use config::CacheConfig;
