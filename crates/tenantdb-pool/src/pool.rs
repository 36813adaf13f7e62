//! Connection pooling for a single tenant database
//!
//! This module provides the pool a tenant's sessions draw from: a fixed
//! number of retained connections, a bounded overflow, acquire timeouts,
//! connection recycling and optional pre-ping.
//!
//! # Example
//!
//! ```ignore
//! use tenantdb_pool::pool::{ConnectionPool, PoolConfig};
//!
//! let config = PoolConfig::new(5, 10)
//!     .with_recycle_secs(300)
//!     .with_pre_ping(true);
//!
//! let pool = ConnectionPool::new(config, connection_factory)?;
//! let conn = pool.get().await?;
//! // Use connection...
//! // Connection returned to pool on drop
//! ```

mod config;
mod pool;
mod stats;


pub use config::PoolConfig;
pub use pool::{ConnectionFactory, ConnectionPool, PooledConnection};
pub use stats::PoolStats;
