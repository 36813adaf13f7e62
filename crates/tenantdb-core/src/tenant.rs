//! Tenant identifiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one backing database.
///
/// Tenants are addressed either by name or by numeric id. Equality is exact:
/// `TenantKey::Name("7")` and `TenantKey::Id(7)` are different tenants, and
/// names are compared without any case normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TenantKey {
    Id(i64),
    Name(String),
}

impl TenantKey {
    /// Create a name-based key
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Create an id-based key
    pub fn id(id: i64) -> Self {
        Self::Id(id)
    }
}

impl fmt::Display for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantKey::Id(id) => write!(f, "{}", id),
            TenantKey::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for TenantKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for TenantKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for TenantKey {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

impl From<i64> for TenantKey {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&TenantKey> for TenantKey {
    fn from(key: &TenantKey) -> Self {
        key.clone()
    }
}
