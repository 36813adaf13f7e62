//! tenantdb Core - Shared abstractions for per-tenant connection pooling
//!
//! This crate provides the traits and types the pooling runtime is built on:
//!
//! - `TenantKey` - Identifier of a tenant database
//! - `Connection` - Trait for a single physical database connection
//! - `DatabaseDriver` - Trait for opening connections from a parsed URL
//! - `ConnectionConfig` - Parsed connection URL with credential redaction
//! - `TenantDbError` - Error taxonomy shared by every crate

mod connection;
mod driver;
mod error;
mod tenant;

pub use connection::*;
pub use driver::*;
pub use error::*;
pub use tenant::*;
