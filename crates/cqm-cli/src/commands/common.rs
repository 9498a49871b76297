//! Shared utilities for CLI commands

use crate::cli::GlobalArgs;
use anyhow::{Context, Result};
use cqm_core::MigrationConfig;
use cqm_db::Session;
use cqm_engine::{CqlMigrationResolver, FileSystemScanner};
use cqm_ledger::CqlSchemaVersionDao;
use std::sync::Arc;

/// Load the configuration file, apply command-line overrides, and validate
/// the result.
pub fn load_config(global: &GlobalArgs) -> Result<MigrationConfig> {
    let mut config = MigrationConfig::load_from_dir(&global.config_dir)
        .context("failed to load configuration")?;

    if let Some(keyspace) = &global.keyspace {
        config.keyspace = keyspace.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Build the script resolver rooted at the config directory.
pub fn build_resolver(global: &GlobalArgs, config: &MigrationConfig) -> CqlMigrationResolver {
    CqlMigrationResolver::new(
        Arc::new(FileSystemScanner::new(&global.config_dir)),
        config.locations.clone(),
        config.encoding.clone(),
    )
}

/// Build the ledger DAO over a connected session.
pub fn build_dao(session: Arc<dyn Session>, config: &MigrationConfig) -> CqlSchemaVersionDao {
    CqlSchemaVersionDao::new(session, config)
}

/// Connect to the cluster described by the configuration.
///
/// The returned session is owned by the CLI and dropped on every exit path;
/// the engine only ever borrows it.
#[cfg(feature = "scylla")]
pub async fn connect(config: &MigrationConfig) -> Result<Arc<dyn Session>> {
    use cqm_db::scylla_session::{connect as connect_cluster, ConnectOptions};

    let session = connect_cluster(&ConnectOptions {
        contact_points: config.contact_points.clone(),
        port: config.port,
        keyspace: Some(config.keyspace.clone()),
        username: config.username.clone(),
        password: config.password.clone(),
    })
    .await
    .context("failed to connect to the cluster")?;
    Ok(Arc::new(session))
}

#[cfg(not(feature = "scylla"))]
pub async fn connect(_config: &MigrationConfig) -> Result<Arc<dyn Session>> {
    Err(cqm_db::DbError::BackendUnavailable {
        feature: "scylla".to_string(),
    }
    .into())
}
