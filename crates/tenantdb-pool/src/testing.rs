//! Mock driver and connections shared by the unit tests

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tenantdb_core::{
    Connection, ConnectionConfig, DatabaseDriver, Result, TenantDbError,
};

use crate::pool::ConnectionFactory;

/// Mock connection recording pings and closes
pub(crate) struct MockConnection {
    #[allow(dead_code)]
    pub(crate) id: usize,
    closed: AtomicBool,
    /// Shared with the driver so tests can simulate a server dropping connections
    broken: Arc<AtomicBool>,
    closes: Arc<AtomicUsize>,
    pings: Arc<AtomicUsize>,
    /// Shared with the driver; pings hang while set
    stalled: Arc<AtomicBool>,
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, _sql: &str) -> Result<u64> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.stalled.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.broken.load(Ordering::SeqCst) {
            return Err(TenantDbError::Connection("server closed the connection".into()));
        }
        Ok(0)
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// How the mock driver fails on connect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectFailure {
    None,
    /// Driver-level failure, e.g. refused or bad credentials
    Driver,
    /// Failure outside the driver's error domain
    Unexpected,
}

/// Mock driver accepting `mock://` URLs and counting connections
pub(crate) struct MockDriver {
    connects: AtomicUsize,
    closes: Arc<AtomicUsize>,
    pings: Arc<AtomicUsize>,
    broken: Arc<AtomicBool>,
    stalled: Arc<AtomicBool>,
    failure: Mutex<ConnectFailure>,
    parsed_urls: Mutex<Vec<String>>,
    connected_urls: Mutex<Vec<String>>,
}

impl MockDriver {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            connects: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
            pings: Arc::new(AtomicUsize::new(0)),
            broken: Arc::new(AtomicBool::new(false)),
            stalled: Arc::new(AtomicBool::new(false)),
            failure: Mutex::new(ConnectFailure::None),
            parsed_urls: Mutex::new(Vec::new()),
            connected_urls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn fail_with(&self, failure: ConnectFailure) {
        *self.failure.lock() = failure;
    }

    /// Make every connection opened so far, and later, fail its pings
    pub(crate) fn break_connections(&self, broken: bool) {
        self.broken.store(broken, Ordering::SeqCst);
    }

    /// Make pings on every connection hang, like an unresponsive server
    pub(crate) fn stall_pings(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    pub(crate) fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    /// Number of URLs parsed, i.e. pools built
    pub(crate) fn builds(&self) -> usize {
        self.parsed_urls.lock().len()
    }

    pub(crate) fn parsed_urls(&self) -> Vec<String> {
        self.parsed_urls.lock().clone()
    }

    pub(crate) fn connected_urls(&self) -> Vec<String> {
        self.connected_urls.lock().clone()
    }

    fn open(&self) -> Arc<dyn Connection> {
        let id = self.connects.fetch_add(1, Ordering::SeqCst);
        Arc::new(MockConnection {
            id,
            closed: AtomicBool::new(false),
            broken: self.broken.clone(),
            closes: self.closes.clone(),
            pings: self.pings.clone(),
            stalled: self.stalled.clone(),
        })
    }
}

#[async_trait]
impl DatabaseDriver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn parse_url(&self, url: &str) -> Result<ConnectionConfig> {
        let config = ConnectionConfig::parse(url)?;
        if config.scheme() != "mock" {
            return Err(TenantDbError::Configuration(format!(
                "unsupported scheme '{}'",
                config.scheme()
            )));
        }
        self.parsed_urls.lock().push(url.to_string());
        Ok(config)
    }

    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let failure = *self.failure.lock();
        match failure {
            ConnectFailure::None => {}
            ConnectFailure::Driver => {
                return Err(TenantDbError::Connection(format!(
                    "could not connect to {}",
                    config
                )));
            }
            ConnectFailure::Unexpected => {
                return Err(TenantDbError::Other("session setup misuse".into()));
            }
        }
        self.connected_urls.lock().push(config.url().to_string());
        Ok(self.open())
    }
}

/// Connection factory backed by a mock driver, without URL handling
pub(crate) struct MockConnectionFactory {
    driver: Arc<MockDriver>,
}

impl MockConnectionFactory {
    pub(crate) fn new(driver: Arc<MockDriver>) -> Self {
        Self { driver }
    }
}

#[async_trait]
impl ConnectionFactory for MockConnectionFactory {
    async fn create(&self) -> Result<Arc<dyn Connection>> {
        Ok(self.driver.open())
    }
}

/// Let detached close tasks run
pub(crate) async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
