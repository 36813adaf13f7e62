//! Session issuance

use std::sync::Arc;

use tenantdb_core::{DatabaseDriver, Result, TenantKey};

use super::handle::{Session, SessionOptions};
use crate::cache::PoolCache;
use crate::pool::ConnectionPool;
use crate::provisioner::PoolProvisioner;
use crate::settings::ManagerSettings;

/// Turns tenant keys into sessions, reusing cached pools
///
/// On a cache miss the provisioner builds the tenant's pool and the cache
/// keeps it for its TTL; subsequent sessions for the tenant draw from the
/// same pool.
#[derive(Debug)]
pub struct SessionFactory {
    cache: PoolCache,
    provisioner: PoolProvisioner,
    options: SessionOptions,
}

impl SessionFactory {
    pub fn new(cache: PoolCache, provisioner: PoolProvisioner) -> Self {
        Self {
            cache,
            provisioner,
            options: SessionOptions::default(),
        }
    }

    /// Build a factory, its cache and its provisioner from settings
    ///
    /// Must be called inside a tokio runtime for the cache sweeper to run.
    pub fn from_settings(settings: &ManagerSettings, driver: Arc<dyn DatabaseDriver>) -> Result<Self> {
        settings.validate()?;
        let cache = PoolCache::new(settings.cache.clone())?;
        let provisioner = PoolProvisioner::new(
            driver,
            settings.db_url.clone(),
            settings.main_db.clone(),
            settings.main_policy(),
            settings.regular_policy(),
        );
        tracing::info!(
            main_db = %settings.main_db,
            main_policy = ?settings.main_policy(),
            regular_policy = ?settings.regular_policy(),
            "session factory configured"
        );
        Ok(Self::new(cache, provisioner))
    }

    /// Create a session on the database of `key`
    ///
    /// Errors from pool construction and connection checkout are returned
    /// unchanged; checkout failures are logged first. Nothing is retried.
    pub async fn create_session(&self, key: impl Into<TenantKey>) -> Result<Session> {
        let key = key.into();
        self.create_session_for(&key).await
    }

    #[tracing::instrument(skip_all, fields(tenant = %key))]
    async fn create_session_for(&self, key: &TenantKey) -> Result<Session> {
        let pool = self
            .cache
            .get_or_insert_with(key, |key| self.provisioner.build(key))?;
        self.open_session(key, &pool).await
    }

    async fn open_session(&self, key: &TenantKey, pool: &ConnectionPool) -> Result<Session> {
        match pool.get().await {
            Ok(connection) => {
                let session = Session::new(key.clone(), connection, self.options);
                tracing::debug!(session_id = %session.id(), "session created");
                Ok(session)
            }
            Err(e) if e.is_driver_error() => {
                tracing::error!(error = %e, "error while creating database connection from pool");
                Err(e)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "unexpected error while creating database connection from pool"
                );
                Err(e)
            }
        }
    }

    /// Drop the cached pool of `key`, if any
    pub fn evict(&self, key: &TenantKey) -> bool {
        self.cache.delete(key)
    }

    pub fn cache(&self) -> &PoolCache {
        &self.cache
    }

    pub fn provisioner(&self) -> &PoolProvisioner {
        &self.provisioner
    }

    /// Stop the sweeper and retire every cached pool
    ///
    /// Live sessions keep their connections until they are dropped.
    pub fn shutdown(&self) {
        tracing::info!(pools = self.cache.len(), "shutting down session factory");
        self.cache.shutdown();
        self.cache.clear();
    }
}
