//! Database driver trait and connection configuration

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::{Connection, Result, TenantDbError};

/// Placeholder shown instead of credentials in redacted URLs
const REDACTED: &str = "***";

/// Parsed connection target for one database
///
/// Holds the full URL including credentials. `Display` and `Debug` only ever
/// show the redacted form; use [`ConnectionConfig::url`] to get the real one.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    url: Url,
}

impl ConnectionConfig {
    /// Parse a connection URL
    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url)?;
        if url.cannot_be_a_base() {
            return Err(TenantDbError::Configuration(format!(
                "connection URL must be hierarchical, got scheme '{}'",
                url.scheme()
            )));
        }
        Ok(Self { url })
    }

    /// The full connection URL, credentials included
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// URL scheme, e.g. "postgresql"
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    pub fn username(&self) -> &str {
        self.url.username()
    }

    /// The database name, taken from the last path segment
    pub fn database(&self) -> Option<&str> {
        self.url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
    }

    /// The URL with the password and query parameters masked
    pub fn redacted(&self) -> String {
        let mut url = self.url.clone();
        if url.password().is_some() {
            let _ = url.set_password(Some(REDACTED));
        }
        if url.query().is_some() {
            url.set_query(Some(REDACTED));
        }
        url.to_string()
    }
}

impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.redacted())
            .finish()
    }
}

/// Core driver trait that all database drivers must implement
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Get the driver name
    fn name(&self) -> &'static str;

    /// Parse and validate a connection URL for this driver
    ///
    /// The default implementation accepts any hierarchical URL. Drivers that
    /// only understand specific schemes should override it.
    fn parse_url(&self, url: &str) -> Result<ConnectionConfig> {
        ConnectionConfig::parse(url)
    }

    /// Open a new connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;
}
