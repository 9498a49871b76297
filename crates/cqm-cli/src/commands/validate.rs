//! Validate command implementation

use crate::cli::GlobalArgs;
use crate::commands::common;
use anyhow::Result;
use cqm_engine::EngineError;

/// Execute the validate command
pub async fn execute(global: &GlobalArgs) -> Result<()> {
    let config = common::load_config(global)?;
    let resolver = common::build_resolver(global, &config);
    let session = common::connect(&config).await?;
    let dao = common::build_dao(session, &config);

    match cqm_engine::validate(&dao, &resolver, &config).await? {
        None => {
            println!("No validation errors detected");
            Ok(())
        }
        Some(detail) => {
            eprintln!("{detail}");
            Err(EngineError::ValidationFailed { detail }.into())
        }
    }
}
