//! tenantdb Pool - Per-tenant connection pools with a TTL cache
//!
//! This crate owns the pools of a multi-tenant application: one pool per
//! tenant database, sized by tenant class, cached with an individual
//! time-to-live and handed out as sessions.

pub mod cache;
pub mod health;
pub mod pool;
pub mod provisioner;
pub mod session;
mod settings;

#[cfg(test)]
mod testing;

pub use cache::{CacheConfig, PoolCache};
pub use health::{PingError, PingResult, ping_database};
pub use pool::{ConnectionFactory, ConnectionPool, PoolConfig, PoolStats, PooledConnection};
pub use provisioner::{DriverConnectionFactory, MAX_OVERFLOW, PoolProvisioner, PoolSizingPolicy};
pub use session::{Session, SessionFactory, SessionOptions};
pub use settings::{DEFAULT_MAIN_DB_POOLSIZE, DEFAULT_MAIN_DB_RECYCLE_SECS, ManagerSettings};
