//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// cqlmigrate - schema migrations for Cassandra-compatible clusters
#[derive(Parser, Debug)]
#[command(name = "cqlmigrate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory containing cqlmigrate.yml and the migration locations
    #[arg(short = 'd', long, global = true, default_value = ".")]
    pub config_dir: PathBuf,

    /// Override the target keyspace
    #[arg(short, long, global = true)]
    pub keyspace: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the migration ledger and seed the schema marker
    Init,

    /// Apply pending migrations up to the target version
    Migrate(MigrateArgs),

    /// Check applied migrations against the local scripts
    Validate,

    /// Mark a version below which migrations are assumed applied
    Baseline(BaselineArgs),

    /// Show the merged migration status table
    Info,
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Upper bound on migrations to apply (default: latest)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Permit applying versions below the current ledger maximum
    #[arg(long)]
    pub out_of_order: bool,
}

/// Arguments for the baseline command
#[derive(Args, Debug)]
pub struct BaselineArgs {
    /// Baseline cut-off version (default: from configuration)
    #[arg(short = 'b', long)]
    pub version: Option<String>,

    /// Label recorded on the baseline row
    #[arg(long)]
    pub description: Option<String>,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
