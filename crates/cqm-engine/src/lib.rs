//! cqm-engine - Migration control plane for cqlmigrate
//!
//! Discovers migration units through resolvers, merges them with the applied
//! ledger into a status-annotated view, and drives the four commands:
//! Initialize, Baseline, Migrate, Validate.

pub mod commands;
pub mod error;
pub mod info;
pub mod resolver;
pub mod scanner;

pub use commands::{baseline, initialize, migrate, validate};
pub use error::{EngineError, EngineResult};
pub use info::{MigrationInfo, MigrationInfoService, MigrationState};
pub use resolver::{
    CompositeResolver, CqlMigrationResolver, ExecutableMigration, MigrationExecutor,
    MigrationResolver,
};
pub use scanner::{FileSystemScanner, Resource, Scanner};
