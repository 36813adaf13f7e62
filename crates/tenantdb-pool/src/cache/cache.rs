//! Individual-TTL pool cache

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tenantdb_core::{Result, TenantKey};
use tokio::time::Instant;

use super::config::CacheConfig;
use super::sweeper::Sweeper;
use crate::pool::ConnectionPool;

/// A cached pool and the moment it becomes eligible for eviction
struct CacheEntry {
    pool: ConnectionPool,
    expires_at: Instant,
}

/// State shared between the cache handle and its sweeper
pub(super) struct CacheState {
    config: CacheConfig,
    entries: RwLock<HashMap<TenantKey, CacheEntry>>,
}

impl CacheState {
    /// Remove every entry whose expiry lies in the past
    pub(super) fn sweep(&self) -> usize {
        let now = Instant::now();
        let evicted: Vec<(TenantKey, CacheEntry)> = {
            let mut entries = self.entries.write();
            let expired: Vec<TenantKey> = entries
                .iter()
                .filter(|(_, entry)| entry.expires_at < now)
                .map(|(key, _)| key.clone())
                .collect();
            expired
                .into_iter()
                .filter_map(|key| entries.remove(&key).map(|entry| (key, entry)))
                .collect()
        };

        for (key, entry) in &evicted {
            tracing::debug!(tenant = %key, stats = ?entry.pool.stats(), "evicting expired pool");
            entry.pool.retire();
        }
        if !evicted.is_empty() {
            tracing::info!(evicted = evicted.len(), "swept expired tenant pools");
        }
        evicted.len()
    }

    /// Evict the entry closest to expiry when inserting would exceed `maxsize`
    fn make_room(
        &self,
        entries: &mut HashMap<TenantKey, CacheEntry>,
    ) -> Option<(TenantKey, CacheEntry)> {
        if entries.len() < self.config.maxsize() {
            return None;
        }
        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.expires_at)
            .map(|(key, _)| key.clone())?;
        entries.remove(&oldest).map(|entry| (oldest, entry))
    }
}

/// Cache of connection pools keyed by tenant, with per-entry expiry
///
/// Every entry lives for `default_ttl` from the moment it is inserted; reads
/// do not extend it. A background sweeper removes expired entries every
/// `sweep_interval`, so an expired entry stays visible to [`get`](Self::get)
/// until the next sweep. Evicted pools are retired, not torn down: sessions
/// already holding a connection keep it.
///
/// At most `maxsize` pools are cached. Inserting a new tenant into a full
/// cache evicts the pool closest to expiry.
pub struct PoolCache {
    state: Arc<CacheState>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl PoolCache {
    /// Create a cache and start its sweeper on the current tokio runtime
    ///
    /// Outside a runtime the cache works but only sweeps when
    /// [`sweep`](Self::sweep) is called.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let interval = config.sweep_interval();
        let state = Arc::new(CacheState {
            config,
            entries: RwLock::new(HashMap::new()),
        });

        let sweeper = match tokio::runtime::Handle::try_current() {
            Ok(handle) => Some(Sweeper::spawn(&handle, Arc::downgrade(&state), interval)),
            Err(_) => {
                tracing::warn!("no async runtime, expired pools are only removed by explicit sweeps");
                None
            }
        };

        Ok(Self {
            state,
            sweeper: Mutex::new(sweeper),
        })
    }

    /// Create a cache with the default configuration
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default()).expect("default cache config is valid")
    }

    /// Get the pool cached for `key`
    ///
    /// Does not refresh the entry's expiry.
    pub fn get(&self, key: &TenantKey) -> Option<ConnectionPool> {
        self.state
            .entries
            .read()
            .get(key)
            .map(|entry| entry.pool.clone())
    }

    /// Insert or overwrite the pool for `key`, expiring `default_ttl` from now
    ///
    /// A pool that gets replaced by a different one is retired.
    pub fn set(&self, key: impl Into<TenantKey>, pool: ConnectionPool) {
        let key = key.into();
        let expires_at = Instant::now() + self.state.config.default_ttl();

        let (replaced, evicted) = {
            let mut entries = self.state.entries.write();
            let evicted = if entries.contains_key(&key) {
                None
            } else {
                self.state.make_room(&mut entries)
            };
            let replaced = entries.insert(
                key.clone(),
                CacheEntry {
                    pool: pool.clone(),
                    expires_at,
                },
            );
            (replaced, evicted)
        };

        tracing::debug!(tenant = %key, "cached tenant pool");
        if let Some(old) = replaced
            && !old.pool.ptr_eq(&pool)
        {
            old.pool.retire();
        }
        if let Some((evicted_key, entry)) = evicted {
            tracing::debug!(tenant = %evicted_key, "cache full, evicting pool closest to expiry");
            entry.pool.retire();
        }
    }

    /// Get the pool for `key`, building and inserting it if absent
    ///
    /// The check and the insert happen under one write lock, so concurrent
    /// callers missing on the same key build exactly one pool. A failed build
    /// leaves the cache untouched.
    pub fn get_or_insert_with<F>(&self, key: &TenantKey, build: F) -> Result<ConnectionPool>
    where
        F: FnOnce(&TenantKey) -> Result<ConnectionPool>,
    {
        if let Some(pool) = self.get(key) {
            tracing::debug!(tenant = %key, "pool cache hit");
            return Ok(pool);
        }

        let (pool, evicted) = {
            let mut entries = self.state.entries.write();
            if let Some(entry) = entries.get(key) {
                tracing::debug!(tenant = %key, "pool cache hit after lock");
                return Ok(entry.pool.clone());
            }

            tracing::debug!(tenant = %key, "pool cache miss");
            let pool = build(key)?;
            let evicted = self.state.make_room(&mut entries);
            entries.insert(
                key.clone(),
                CacheEntry {
                    pool: pool.clone(),
                    expires_at: Instant::now() + self.state.config.default_ttl(),
                },
            );
            (pool, evicted)
        };

        if let Some((evicted_key, entry)) = evicted {
            tracing::debug!(tenant = %evicted_key, "cache full, evicting pool closest to expiry");
            entry.pool.retire();
        }
        Ok(pool)
    }

    /// Remove the entry for `key` and retire its pool
    ///
    /// Returns whether an entry was present. Deleting an absent key is a no-op.
    pub fn delete(&self, key: &TenantKey) -> bool {
        let removed = self.state.entries.write().remove(key);
        match removed {
            Some(entry) => {
                tracing::debug!(tenant = %key, "removed tenant pool from cache");
                entry.pool.retire();
                true
            }
            None => false,
        }
    }

    /// Evict all expired entries now, returning how many were removed
    pub fn sweep(&self) -> usize {
        self.state.sweep()
    }

    /// Remove every entry and retire all pools
    pub fn clear(&self) {
        let drained: Vec<_> = self.state.entries.write().drain().collect();
        for (_, entry) in drained {
            entry.pool.retire();
        }
    }

    /// When the entry for `key` becomes eligible for eviction
    pub fn expires_at(&self, key: &TenantKey) -> Option<Instant> {
        self.state
            .entries
            .read()
            .get(key)
            .map(|entry| entry.expires_at)
    }

    pub fn contains(&self, key: &TenantKey) -> bool {
        self.state.entries.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<TenantKey> {
        self.state.entries.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &CacheConfig {
        &self.state.config
    }

    /// Whether the background sweeper is running
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|sweeper| !sweeper.is_finished())
    }

    /// Stop the background sweeper
    ///
    /// Cached entries are kept; they just no longer expire on their own.
    pub fn shutdown(&self) {
        if let Some(sweeper) = self.sweeper.lock().take() {
            sweeper.stop();
        }
    }
}

impl Drop for PoolCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for PoolCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolCache")
            .field("config", &self.state.config)
            .field("len", &self.len())
            .field("sweeping", &self.is_sweeping())
            .finish()
    }
}
