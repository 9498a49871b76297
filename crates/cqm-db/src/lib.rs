//! cqm-db - Cluster session abstraction for cqlmigrate
//!
//! This crate defines the `Session` trait the engine drives, the value model
//! rows come back in, and per-statement timeout helpers. A backend for the
//! scylla driver is available behind the `scylla` feature.

pub mod error;
pub mod session;
pub mod util;
pub mod value;

#[cfg(feature = "scylla")]
pub mod scylla_session;

pub use error::{DbError, DbResult};
pub use session::{
    execute_conditional_with_timeout, execute_with_timeout, query_with_timeout, Session,
};
pub use value::{CqlValue, Row};
