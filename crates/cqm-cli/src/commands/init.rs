//! Init command implementation

use crate::cli::GlobalArgs;
use crate::commands::common;
use anyhow::Result;

/// Execute the init command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let config = common::load_config(global)?;
    let session = common::connect(&config).await?;
    let dao = common::build_dao(session, &config);

    cqm_engine::initialize(&dao, &config).await?;
    println!(
        "Migration ledger ready in keyspace '{}' (table {})",
        config.keyspace,
        config.table_name()
    );
    Ok(())
}
