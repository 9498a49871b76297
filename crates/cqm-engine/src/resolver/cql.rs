//! Resolver for CQL script migrations on the filesystem.

use crate::error::EngineResult;
use crate::resolver::filename::FilenameGrammar;
use crate::resolver::{check_unique_versions, ExecutableMigration, MigrationExecutor};
use crate::scanner::Scanner;
use async_trait::async_trait;
use cqm_core::checksum::compute_checksum;
use cqm_core::migration::MigrationType;
use cqm_core::ResolvedMigration;
use cqm_db::session::execute_with_timeout;
use cqm_db::Session;
use std::sync::Arc;
use std::time::Duration;

/// Resolves `V<version>__<description>.cql` scripts under the configured
/// location roots.
pub struct CqlMigrationResolver {
    scanner: Arc<dyn Scanner>,
    locations: Vec<String>,
    encoding: String,
    grammar: FilenameGrammar,
}

impl CqlMigrationResolver {
    pub fn new(scanner: Arc<dyn Scanner>, locations: Vec<String>, encoding: String) -> Self {
        Self {
            scanner,
            locations,
            encoding,
            grammar: FilenameGrammar::cql(),
        }
    }
}

impl super::MigrationResolver for CqlMigrationResolver {
    fn resolve(&self) -> EngineResult<Vec<ExecutableMigration>> {
        let mut migrations = Vec::new();

        for location in &self.locations {
            for resource in self.scanner.scan(location, self.grammar.suffix())? {
                let parsed = match self.grammar.parse(resource.filename()) {
                    None => {
                        log::debug!("ignoring non-migration file {}", resource.logical_path());
                        continue;
                    }
                    Some(result) => result?,
                };

                let content = resource.load_as_string(&self.encoding)?;
                let checksum = compute_checksum(&content);
                // Split now: a malformed script must fail resolution, before
                // any ledger write
                let statements = cqm_cql::split_statements(&content)?;

                let resolved = ResolvedMigration::new(
                    parsed.version,
                    parsed.description,
                    MigrationType::Cql,
                    resource.filename(),
                    Some(checksum),
                    resource.logical_path(),
                )?;

                migrations.push(ExecutableMigration {
                    resolved,
                    executor: Arc::new(CqlScriptExecutor { statements }),
                });
            }
        }

        check_unique_versions(&migrations)?;
        migrations.sort_by(|a, b| a.resolved.version.cmp(&b.resolved.version));
        Ok(migrations)
    }
}

/// Runs each statement of a split script in order.
struct CqlScriptExecutor {
    statements: Vec<String>,
}

#[async_trait]
impl MigrationExecutor for CqlScriptExecutor {
    async fn execute(&self, session: &dyn Session, timeout: Duration) -> EngineResult<()> {
        for statement in &self.statements {
            execute_with_timeout(session, statement, timeout).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "cql_test.rs"]
mod tests;
