//! cqm-ledger - Durable schema-version ledger for cqlmigrate
//!
//! Persists each migration application as a row in the
//! `{prefix}cassandra_migration_version` table inside the target keyspace,
//! allocates monotonic installed ranks from a companion counter table, and
//! provides the advisory lock commands coordinate through.

pub mod dao;
pub mod ddl;
pub mod error;
pub mod lock;
pub mod memory;
pub mod row;

pub use dao::{CqlSchemaVersionDao, SchemaVersionDao};
pub use error::{LedgerError, LedgerResult};
pub use lock::LockPolicy;
pub use memory::MemoryDao;
