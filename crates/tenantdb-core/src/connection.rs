//! Connection trait

use async_trait::async_trait;

use crate::Result;

/// A single physical database connection
///
/// Query execution is the driver's business; the pooling layer only needs to
/// check a connection's liveness and close it.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "sqlite", "postgresql", "mysql")
    fn driver_name(&self) -> &str;

    /// Execute a statement, returning the number of affected rows
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Statement used to check that the connection is alive
    fn ping_statement(&self) -> &'static str {
        "SELECT 1"
    }

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}
