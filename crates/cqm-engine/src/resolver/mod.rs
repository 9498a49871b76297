//! Migration resolvers: mapping discovered resources to executable
//! migrations.

use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use cqm_core::ResolvedMigration;
use cqm_db::Session;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub mod code;
pub mod cql;
pub mod filename;

pub use code::{CodeMigration, CodeMigrationResolver};
pub use cql::CqlMigrationResolver;
pub use filename::{FilenameGrammar, ParsedName};

/// Executes one migration against a live session.
///
/// Commands are values: an executor is constructed by a resolver and carries
/// everything it needs except the session and the per-statement timeout.
#[async_trait]
pub trait MigrationExecutor: Send + Sync {
    async fn execute(&self, session: &dyn Session, timeout: Duration) -> EngineResult<()>;
}

/// A resolved migration paired with its executor.
pub struct ExecutableMigration {
    pub resolved: ResolvedMigration,
    pub executor: Arc<dyn MigrationExecutor>,
}

impl std::fmt::Debug for ExecutableMigration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutableMigration")
            .field("resolved", &self.resolved)
            .finish_non_exhaustive()
    }
}

/// Discovers and parses migration units.
pub trait MigrationResolver: Send + Sync {
    /// All migrations this resolver knows, sorted ascending by version.
    fn resolve(&self) -> EngineResult<Vec<ExecutableMigration>>;
}

/// Merges the output of several resolvers into one ordered sequence.
pub struct CompositeResolver {
    resolvers: Vec<Box<dyn MigrationResolver>>,
}

impl CompositeResolver {
    pub fn new(resolvers: Vec<Box<dyn MigrationResolver>>) -> Self {
        Self { resolvers }
    }
}

impl MigrationResolver for CompositeResolver {
    fn resolve(&self) -> EngineResult<Vec<ExecutableMigration>> {
        let mut merged = Vec::new();
        for resolver in &self.resolvers {
            merged.extend(resolver.resolve()?);
        }
        check_unique_versions(&merged)?;
        merged.sort_by(|a, b| a.resolved.version.cmp(&b.resolved.version));
        Ok(merged)
    }
}

/// Fail with `DuplicateVersion` if two migrations share a version.
pub(crate) fn check_unique_versions(migrations: &[ExecutableMigration]) -> EngineResult<()> {
    let mut seen: HashMap<&cqm_core::MigrationVersion, &str> = HashMap::new();
    for migration in migrations {
        let resolved = &migration.resolved;
        if let Some(first) = seen.insert(&resolved.version, &resolved.script) {
            return Err(EngineError::DuplicateVersion {
                version: resolved.version.to_string(),
                first: first.to_string(),
                second: resolved.script.clone(),
            });
        }
    }
    Ok(())
}
