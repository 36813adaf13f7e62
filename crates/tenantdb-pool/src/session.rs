//! Per-request session creation
//!
//! # Example
//!
//! ```ignore
//! use tenantdb_pool::{ManagerSettings, SessionFactory};
//!
//! let settings = ManagerSettings::new("main", "postgresql://app:secret@db:5432");
//! let factory = SessionFactory::from_settings(&settings, driver)?;
//!
//! let session = factory.create_session("tenant7").await?;
//! assert!(!session.autocommit());
//! ```

mod factory;
mod handle;


pub use factory::SessionFactory;
pub use handle::{Session, SessionOptions};
