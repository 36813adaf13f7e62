//! Database ping implementation

use std::time::{Duration, Instant};

use tenantdb_core::Connection;
use thiserror::Error;

/// Result of a ping operation
pub type PingResult = Result<Duration, PingError>;

/// Error that can occur during a ping operation
#[derive(Debug, Clone, Error)]
pub enum PingError {
    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Ping query failed: {0}")]
    QueryFailed(String),
}

/// Ping a database connection to check if it's alive.
///
/// Executes the driver's ping statement (usually `SELECT 1`) and returns the
/// round-trip time.
pub async fn ping_database(conn: &dyn Connection) -> PingResult {
    if conn.is_closed() {
        return Err(PingError::ConnectionClosed);
    }

    let start = Instant::now();
    match conn.execute(conn.ping_statement()).await {
        Ok(_) => Ok(start.elapsed()),
        Err(e) => Err(PingError::QueryFailed(e.to_string())),
    }
}
