//! Baseline command implementation

use crate::cli::{BaselineArgs, GlobalArgs};
use crate::commands::common;
use anyhow::Result;

/// Execute the baseline command
pub async fn execute(args: &BaselineArgs, global: &GlobalArgs) -> Result<()> {
    let mut config = common::load_config(global)?;
    if let Some(version) = &args.version {
        config.baseline_version = version.clone();
    }
    if let Some(description) = &args.description {
        config.baseline_description = description.clone();
    }
    config.validate()?;

    let session = common::connect(&config).await?;
    let dao = common::build_dao(session, &config);

    let baselined = cqm_engine::baseline(&dao, &config).await?;
    println!(
        "Baselined keyspace '{}' at version {baselined}",
        config.keyspace
    );
    Ok(())
}
