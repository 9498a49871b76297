//! Migrate command implementation

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common;
use anyhow::Result;

/// Execute the migrate command
pub async fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let mut config = common::load_config(global)?;
    if let Some(target) = &args.target {
        config.target = target.clone();
    }
    if args.out_of_order {
        config.allow_out_of_order = true;
    }
    config.validate()?;

    let resolver = common::build_resolver(global, &config);
    let session = common::connect(&config).await?;
    let dao = common::build_dao(session.clone(), &config);

    let count = cqm_engine::migrate(session.as_ref(), &dao, &resolver, &config).await?;
    match count {
        0 => println!("Keyspace '{}' is up to date", config.keyspace),
        1 => println!("1 migration applied"),
        n => println!("{n} migrations applied"),
    }
    Ok(())
}
