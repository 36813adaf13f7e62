//! Pool construction per tenant
//!
//! The provisioner turns a tenant key into a ready-to-use (but not yet
//! connected) pool. The main database gets its own sizing policy; every
//! other tenant shares the regular one.

mod policy;


use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tenantdb_core::{Connection, ConnectionConfig, DatabaseDriver, Result, TenantDbError, TenantKey};

use crate::pool::{ConnectionFactory, ConnectionPool, PoolConfig};

pub use policy::PoolSizingPolicy;

/// Connections a pool may open beyond its `pool_size`
pub const MAX_OVERFLOW: usize = 10;

/// Default time a session waits for a free connection
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 30_000;

/// Opens connections to one tenant database through a driver
pub struct DriverConnectionFactory {
    driver: Arc<dyn DatabaseDriver>,
    config: ConnectionConfig,
}

impl DriverConnectionFactory {
    pub fn new(driver: Arc<dyn DatabaseDriver>, config: ConnectionConfig) -> Self {
        Self { driver, config }
    }
}

#[async_trait]
impl ConnectionFactory for DriverConnectionFactory {
    async fn create(&self) -> Result<Arc<dyn Connection>> {
        self.driver.connect(&self.config).await
    }

    fn target(&self) -> Option<&ConnectionConfig> {
        Some(&self.config)
    }
}

/// Builds connection pools for tenant databases
///
/// The URL of a tenant's database is `"{base_url}/{tenant}"`. Pools are built
/// with a fixed overflow of [`MAX_OVERFLOW`], pre-ping and parameter
/// redaction enabled, and sized by [`policy_for`](Self::policy_for).
pub struct PoolProvisioner {
    driver: Arc<dyn DatabaseDriver>,
    base_url: String,
    main_db: TenantKey,
    main_policy: PoolSizingPolicy,
    regular_policy: PoolSizingPolicy,
    acquire_timeout_ms: u64,
}

impl PoolProvisioner {
    pub fn new(
        driver: Arc<dyn DatabaseDriver>,
        base_url: impl Into<String>,
        main_db: impl Into<TenantKey>,
        main_policy: PoolSizingPolicy,
        regular_policy: PoolSizingPolicy,
    ) -> Self {
        Self {
            driver,
            base_url: base_url.into(),
            main_db: main_db.into(),
            main_policy,
            regular_policy,
            acquire_timeout_ms: DEFAULT_ACQUIRE_TIMEOUT_MS,
        }
    }

    /// Set how long sessions wait for a connection from built pools
    pub fn with_acquire_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.acquire_timeout_ms = timeout_ms;
        self
    }

    /// Whether `key` is the main database
    ///
    /// Exact equality with the configured main database; no normalisation.
    pub fn is_main(&self, key: &TenantKey) -> bool {
        *key == self.main_db
    }

    /// The sizing policy that applies to `key`
    pub fn policy_for(&self, key: &TenantKey) -> &PoolSizingPolicy {
        if self.is_main(key) {
            &self.main_policy
        } else {
            &self.regular_policy
        }
    }

    /// The connection URL of the database for `key`
    pub fn tenant_url(&self, key: &TenantKey) -> String {
        format!("{}/{}", self.base_url, key)
    }

    /// The pool configuration used for `key`
    pub fn pool_config_for(&self, key: &TenantKey) -> PoolConfig {
        let policy = self.policy_for(key);
        PoolConfig::new(policy.pool_size, MAX_OVERFLOW)
            .with_recycle_secs(policy.recycle_secs)
            .with_acquire_timeout_ms(self.acquire_timeout_ms)
            .with_pre_ping(true)
            .with_hide_parameters(true)
    }

    /// Build a new pool for `key`
    ///
    /// No connection is opened; the first checkout connects. Fails with
    /// `TenantDbError::Provisioning` if the driver rejects the URL or the
    /// sizing is unusable.
    pub fn build(&self, key: &TenantKey) -> Result<ConnectionPool> {
        let target = self
            .driver
            .parse_url(&self.tenant_url(key))
            .map_err(|e| {
                TenantDbError::Provisioning(format!(
                    "invalid connection URL for tenant '{}': {}",
                    key, e
                ))
            })?;
        let config = self.pool_config_for(key);

        tracing::debug!(
            tenant = %key,
            url = %target,
            main = self.is_main(key),
            pool_size = config.pool_size(),
            recycle = ?config.recycle(),
            "building tenant pool"
        );

        let factory = DriverConnectionFactory::new(self.driver.clone(), target);
        ConnectionPool::new(config, factory).map_err(|e| {
            TenantDbError::Provisioning(format!("pool for tenant '{}' rejected: {}", key, e))
        })
    }

    pub fn main_db(&self) -> &TenantKey {
        &self.main_db
    }

    pub fn main_policy(&self) -> &PoolSizingPolicy {
        &self.main_policy
    }

    pub fn regular_policy(&self) -> &PoolSizingPolicy {
        &self.regular_policy
    }

    pub fn driver(&self) -> &Arc<dyn DatabaseDriver> {
        &self.driver
    }
}

impl fmt::Debug for PoolProvisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolProvisioner")
            .field("driver", &self.driver.name())
            .field("main_db", &self.main_db)
            .field("main_policy", &self.main_policy)
            .field("regular_policy", &self.regular_policy)
            .finish_non_exhaustive()
    }
}
