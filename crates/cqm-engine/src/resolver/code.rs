//! Resolver for code-unit migrations registered by the embedding host.

use crate::error::{EngineError, EngineResult};
use crate::resolver::{
    check_unique_versions, ExecutableMigration, MigrationExecutor, MigrationResolver,
};
use async_trait::async_trait;
use cqm_core::migration::MigrationType;
use cqm_core::{MigrationVersion, ResolvedMigration};
use cqm_db::Session;
use std::sync::Arc;
use std::time::Duration;

/// A migration implemented in host code rather than a CQL script.
///
/// Hosts register implementations with [`CodeMigrationResolver`]; the
/// ledger tags their rows `JAVA_DRIVER` for wire compatibility with
/// existing deployments.
#[async_trait]
pub trait CodeMigration: Send + Sync {
    /// Declared version, in the same dotted form as a script filename.
    fn version(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Logical name used in error messages and the ledger `script` column.
    fn name(&self) -> &str;

    /// Content digest, if this unit can compute a stable one.
    fn checksum(&self) -> Option<i32> {
        None
    }

    /// Run the migration against a live session.
    async fn execute(&self, session: &dyn Session) -> EngineResult<()>;
}

/// Resolves migrations from a registered set of code units.
pub struct CodeMigrationResolver {
    migrations: Vec<Arc<dyn CodeMigration>>,
}

impl CodeMigrationResolver {
    pub fn new(migrations: Vec<Arc<dyn CodeMigration>>) -> Self {
        Self { migrations }
    }
}

impl MigrationResolver for CodeMigrationResolver {
    fn resolve(&self) -> EngineResult<Vec<ExecutableMigration>> {
        let mut resolved = Vec::with_capacity(self.migrations.len());

        for unit in &self.migrations {
            let version = MigrationVersion::parse(unit.version()).map_err(|e| {
                EngineError::InvalidMigrationName {
                    path: unit.name().to_string(),
                    reason: e.to_string(),
                }
            })?;

            let record = ResolvedMigration::new(
                version,
                unit.description(),
                MigrationType::JavaDriver,
                unit.name(),
                unit.checksum(),
                unit.name(),
            )?;

            resolved.push(ExecutableMigration {
                resolved: record,
                executor: Arc::new(CodeExecutor {
                    unit: Arc::clone(unit),
                }),
            });
        }

        check_unique_versions(&resolved)?;
        resolved.sort_by(|a, b| a.resolved.version.cmp(&b.resolved.version));
        Ok(resolved)
    }
}

/// Delegates execution to the code unit under the configured timeout.
struct CodeExecutor {
    unit: Arc<dyn CodeMigration>,
}

#[async_trait]
impl MigrationExecutor for CodeExecutor {
    async fn execute(&self, session: &dyn Session, timeout: Duration) -> EngineResult<()> {
        match tokio::time::timeout(timeout, self.unit.execute(session)).await {
            Ok(result) => result,
            Err(_) => Err(cqm_db::DbError::StatementTimeout {
                statement: self.unit.name().to_string(),
                seconds: timeout.as_secs(),
            }
            .into()),
        }
    }
}
