//! cqlmigrate CLI - schema migrations for Cassandra-compatible clusters

use anyhow::Result;
use clap::Parser;
use cqm_engine::EngineError;

mod cli;
mod commands;

use cli::Cli;
use commands::{baseline, info, init, migrate, validate};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if cli.global.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    if let Err(err) = run(&cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Init => init::execute(&cli.global).await,
        cli::Commands::Migrate(args) => migrate::execute(args, &cli.global).await,
        cli::Commands::Validate => validate::execute(&cli.global).await,
        cli::Commands::Baseline(args) => baseline::execute(args, &cli.global).await,
        cli::Commands::Info => info::execute(&cli.global).await,
    }
}

/// Process exit codes: 1 validation failure, 2 migration failure,
/// 3 configuration/IO/store errors.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::ValidationFailed { .. }) => 1,
        Some(EngineError::MigrationFailed { .. }) => 2,
        _ => 3,
    }
}
