//! Session handles issued to callers

use std::fmt;

use serde::{Deserialize, Serialize};
use tenantdb_core::{Connection, TenantKey};
use uuid::Uuid;

use crate::pool::PooledConnection;

/// Behaviour flags of issued sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Commit after every statement
    pub autocommit: bool,
    /// Flush pending changes before every query
    pub autoflush: bool,
}

impl Default for SessionOptions {
    /// Both autocommit and autoflush are off
    fn default() -> Self {
        Self {
            autocommit: false,
            autoflush: false,
        }
    }
}

/// A checked-out connection wrapped for one caller
///
/// Sessions are never cached. Dropping a session returns its connection to
/// the tenant's pool, even if that pool has since been evicted.
pub struct Session {
    id: Uuid,
    tenant: TenantKey,
    options: SessionOptions,
    connection: PooledConnection,
}

impl Session {
    pub(crate) fn new(tenant: TenantKey, connection: PooledConnection, options: SessionOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant,
            options,
            connection,
        }
    }

    /// Unique id of this session, for log correlation
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The tenant this session is connected to
    pub fn tenant(&self) -> &TenantKey {
        &self.tenant
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn autocommit(&self) -> bool {
        self.options.autocommit
    }

    pub fn autoflush(&self) -> bool {
        self.options.autoflush
    }

    /// The underlying database connection
    pub fn connection(&self) -> &dyn Connection {
        &*self.connection
    }

    /// Release the session, returning its connection to the pool
    pub fn close(self) {
        tracing::debug!(session_id = %self.id, tenant = %self.tenant, "closing session");
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("tenant", &self.tenant)
            .field("options", &self.options)
            .field("connection", &self.connection)
            .finish()
    }
}
