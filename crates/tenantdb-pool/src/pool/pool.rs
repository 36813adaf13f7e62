//! Connection pool implementation

use std::collections::VecDeque;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tenantdb_core::{Connection, ConnectionConfig, Result, TenantDbError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use super::config::PoolConfig;
use super::stats::PoolStats;
use crate::health::ping_database;

/// Factory trait for creating new connections
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    /// Create a new connection
    async fn create(&self) -> Result<Arc<dyn Connection>>;

    /// Validate that a connection is still usable
    ///
    /// Default implementation only checks that the connection is open.
    async fn validate(&self, conn: &dyn Connection) -> bool {
        !conn.is_closed()
    }

    /// The database this factory connects to, if known
    fn target(&self) -> Option<&ConnectionConfig> {
        None
    }
}

#[async_trait]
impl<T: ConnectionFactory> ConnectionFactory for Arc<T> {
    async fn create(&self) -> Result<Arc<dyn Connection>> {
        (**self).create().await
    }

    async fn validate(&self, conn: &dyn Connection) -> bool {
        (**self).validate(conn).await
    }

    fn target(&self) -> Option<&ConnectionConfig> {
        (**self).target()
    }
}

/// Idle connection with the time it was opened
struct IdleConnection {
    connection: Arc<dyn Connection>,
    created_at: Instant,
}

struct PoolInner {
    config: PoolConfig,
    factory: Arc<dyn ConnectionFactory>,
    /// Available idle connections, at most `pool_size` of them
    idle: Mutex<VecDeque<IdleConnection>>,
    /// Limits checked out connections to `pool_size + max_overflow`
    semaphore: Arc<Semaphore>,
    active_count: AtomicUsize,
    waiting_count: AtomicUsize,
    /// Set once the pool has been evicted; only written under the `idle` lock
    retired: AtomicBool,
}

/// A connection pool bound to a single database
///
/// Cloning is cheap and yields another handle to the same pool. Connections
/// are opened lazily on checkout and returned to the pool when the
/// `PooledConnection` wrapper is dropped. At most `pool_size` connections are
/// kept idle; overflow connections are closed when they come back.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Create a new connection pool with the given configuration and factory
    ///
    /// No connection is opened until the first checkout.
    pub fn new<F: ConnectionFactory>(config: PoolConfig, factory: F) -> Result<Self> {
        config.validate()?;
        let semaphore = Arc::new(Semaphore::new(config.max_connections()));
        Ok(Self {
            inner: Arc::new(PoolInner {
                config,
                factory: Arc::new(factory),
                idle: Mutex::new(VecDeque::new()),
                semaphore,
                active_count: AtomicUsize::new(0),
                waiting_count: AtomicUsize::new(0),
                retired: AtomicBool::new(false),
            }),
        })
    }

    /// Get a connection from the pool
    ///
    /// This will:
    /// 1. Wait for a free slot (at most `pool_size + max_overflow` checked out)
    /// 2. Reuse an idle connection, dropping ones that are too old or fail the pre-ping
    /// 3. Otherwise open a new connection through the factory
    ///
    /// Returns a `Timeout` error if the acquire timeout is exceeded.
    pub async fn get(&self) -> Result<PooledConnection> {
        let timeout = self.inner.config.acquire_timeout();
        let result = {
            let _waiting = WaitingGuard::new(&self.inner.waiting_count);
            tokio::time::timeout(timeout, self.checkout()).await
        };

        match result {
            Ok(conn) => conn,
            Err(_) => Err(TenantDbError::Timeout(format!(
                "Timed out waiting for connection (timeout: {:?})",
                timeout
            ))),
        }
    }

    async fn checkout(&self) -> Result<PooledConnection> {
        let permit = self
            .inner
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| TenantDbError::Connection("Pool semaphore closed".into()))?;

        let (connection, created_at) = match self.try_get_idle().await {
            Some(idle) => (idle.connection, idle.created_at),
            None => (self.inner.factory.create().await?, Instant::now()),
        };

        self.inner.active_count.fetch_add(1, Ordering::SeqCst);

        Ok(PooledConnection {
            connection: Some(connection),
            created_at,
            pool: self.inner.clone(),
            _permit: permit,
        })
    }

    /// Try to get an idle connection, checking age, liveness and validity
    async fn try_get_idle(&self) -> Option<IdleConnection> {
        let config = &self.inner.config;
        loop {
            let idle = { self.inner.idle.lock().pop_front() }?;

            if let Some(recycle) = config.recycle()
                && (recycle.is_zero() || idle.created_at.elapsed() > recycle)
            {
                tracing::debug!("recycling connection past its maximum age");
                let _ = idle.connection.close().await;
                continue;
            }

            // Closed if the checkout is cancelled while the connection is being checked
            let candidate = CloseOnDrop::new(idle.connection.clone());

            if config.pre_ping()
                && let Err(e) = ping_database(&*idle.connection).await
            {
                tracing::debug!(error = %e, "pre-ping failed, discarding connection");
                candidate.disarm();
                let _ = idle.connection.close().await;
                continue;
            }

            if !self.inner.factory.validate(&*idle.connection).await {
                candidate.disarm();
                let _ = idle.connection.close().await;
                continue;
            }

            candidate.disarm();
            return Some(idle);
        }
    }

    /// Retire the pool after it has been evicted
    ///
    /// Idle connections are closed right away. Connections that are still
    /// checked out stay usable and are closed when they are returned instead
    /// of going back to the idle set. Handles that are already held keep
    /// working, they just stop reusing connections.
    pub fn retire(&self) {
        let drained: Vec<_> = {
            let mut idle = self.inner.idle.lock();
            self.inner.retired.store(true, Ordering::SeqCst);
            idle.drain(..).collect()
        };

        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "closing idle connections of retired pool");
        }
        for idle in drained {
            close_detached(idle.connection);
        }
    }

    /// Whether the pool has been retired
    pub fn is_retired(&self) -> bool {
        self.inner.retired.load(Ordering::SeqCst)
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        let idle = self.inner.idle.lock().len();
        let active = self.inner.active_count.load(Ordering::SeqCst);
        let waiting = self.inner.waiting_count.load(Ordering::SeqCst);
        PoolStats::new(idle + active, idle, active, waiting)
    }

    /// Get the pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// The database this pool connects to, if known
    pub fn target(&self) -> Option<&ConnectionConfig> {
        self.inner.factory.target()
    }

    /// Whether two handles refer to the same pool
    pub fn ptr_eq(&self, other: &ConnectionPool) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Close all idle connections in the pool
    pub async fn close_idle(&self) {
        let connections: Vec<_> = {
            let mut idle = self.inner.idle.lock();
            idle.drain(..).collect()
        };

        for idle in connections {
            let _ = idle.connection.close().await;
        }
    }
}

impl PoolInner {
    /// Return a connection to the pool
    fn return_connection(&self, connection: Arc<dyn Connection>, created_at: Instant) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);

        // Don't return closed connections
        if connection.is_closed() {
            return;
        }

        let surplus = {
            let mut idle = self.idle.lock();
            if self.retired.load(Ordering::SeqCst) || idle.len() >= self.config.pool_size() {
                Some(connection)
            } else {
                idle.push_back(IdleConnection {
                    connection,
                    created_at,
                });
                None
            }
        };

        if let Some(connection) = surplus {
            close_detached(connection);
        }
    }
}

/// Counts a caller as waiting for as long as it is alive
///
/// Dropping the `get` future mid-wait still decrements the counter.
struct WaitingGuard<'a> {
    count: &'a AtomicUsize,
}

impl<'a> WaitingGuard<'a> {
    fn new(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        Self { count }
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Closes a connection on drop unless disarmed
struct CloseOnDrop {
    connection: Option<Arc<dyn Connection>>,
}

impl CloseOnDrop {
    fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection: Some(connection),
        }
    }

    fn disarm(mut self) {
        self.connection = None;
    }
}

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            tracing::debug!("checkout cancelled, closing connection");
            close_detached(connection);
        }
    }
}

/// Close a connection from synchronous context
///
/// Needs a tokio runtime to run the close; without one the connection is
/// simply dropped.
fn close_detached(connection: Arc<dyn Connection>) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(e) = connection.close().await {
                    tracing::debug!(error = %e, "failed to close connection");
                }
            });
        }
        Err(_) => {
            tracing::debug!("no async runtime, dropping connection without closing it");
        }
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = self.target().map(|target| {
            if self.inner.config.hide_parameters() {
                target.redacted()
            } else {
                target.url().to_string()
            }
        });
        f.debug_struct("ConnectionPool")
            .field("target", &target)
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .field("retired", &self.is_retired())
            .finish()
    }
}

/// A connection borrowed from the pool
///
/// When dropped, the connection is automatically returned to the pool. The
/// wrapper keeps the pool alive, so it stays valid after the pool has been
/// evicted from any cache.
pub struct PooledConnection {
    connection: Option<Arc<dyn Connection>>,
    created_at: Instant,
    pool: Arc<PoolInner>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        self.connection.as_ref().expect("connection taken").as_ref()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.take() {
            self.pool.return_connection(conn, self.created_at);
        }
    }
}

impl PooledConnection {
    /// Get the underlying connection as an Arc
    pub fn inner(&self) -> &Arc<dyn Connection> {
        self.connection.as_ref().expect("connection taken")
    }

    /// When the underlying connection was opened
    pub fn created_at(&self) -> Instant {
        self.created_at
    }
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("driver", &self.connection.as_ref().map(|c| c.driver_name()))
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
