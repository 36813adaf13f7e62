//! Liveness checks for pooled connections
//!
//! The pool pings idle connections on checkout when pre-ping is enabled, so
//! a connection dropped by the server is replaced instead of being handed to
//! a session.

mod ping;


pub use ping::{PingError, PingResult, ping_database};
