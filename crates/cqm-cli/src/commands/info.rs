//! Info command implementation

use crate::cli::GlobalArgs;
use crate::commands::common;
use anyhow::Result;
use cqm_engine::{MigrationInfoService, MigrationResolver};
use cqm_ledger::SchemaVersionDao;

/// Execute the info command: print the merged migration status table.
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let config = common::load_config(global)?;
    let resolver = common::build_resolver(global, &config);
    let session = common::connect(&config).await?;
    let dao = common::build_dao(session, &config);

    let resolved: Vec<_> = resolver
        .resolve()?
        .into_iter()
        .map(|m| m.resolved)
        .collect();
    dao.ensure_tables().await?;
    let applied = dao.find_applied_migrations().await?;

    let mut service =
        MigrationInfoService::new(config.target_version()?, config.allow_out_of_order);
    service.refresh(&resolved, &applied);

    print!("{}", service.dump());
    match service.current() {
        Some(current) => println!("\nCurrent version: {}", current.version),
        None => println!("\nCurrent version: none (no migrations applied)"),
    }
    Ok(())
}
