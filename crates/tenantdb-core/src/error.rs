//! Error types for tenantdb

use thiserror::Error;

/// Core error type for tenantdb operations
#[derive(Error, Debug)]
pub enum TenantDbError {
    /// The pool for a tenant could not be constructed (bad URL, invalid sizing).
    #[error("Provisioning error: {0}")]
    Provisioning(String),

    /// The driver failed to open or use a connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// No connection became available within the acquire timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid connection URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}

impl TenantDbError {
    /// Whether the error originates in the driver or the pool rather than in
    /// the surrounding glue.
    ///
    /// Driver-level failures are the expected failure mode of session
    /// creation (network, credentials, exhaustion); everything else is
    /// reported as unexpected.
    pub fn is_driver_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

/// Result type alias for tenantdb operations
pub type Result<T> = std::result::Result<T, TenantDbError>;
