//! Configuration types and parsing for cqlmigrate.yml

use crate::error::{CoreError, CoreResult};
use crate::version::MigrationVersion;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Base name of the schema-version ledger table.
pub const BASE_TABLE_NAME: &str = "cassandra_migration_version";

/// Migration engine configuration from cqlmigrate.yml
///
/// The engine consumes this immutably; the caller (CLI or embedding host)
/// assembles it, either from a file or programmatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationConfig {
    /// Target keyspace
    #[serde(default)]
    pub keyspace: String,

    /// Cluster contact points
    #[serde(default = "default_contact_points")]
    pub contact_points: Vec<String>,

    /// Native protocol port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional username for the driver
    #[serde(default)]
    pub username: Option<String>,

    /// Optional password for the driver
    #[serde(default)]
    pub password: Option<String>,

    /// Upper bound on migrations to apply (`latest`, `empty`, or a version)
    #[serde(default = "default_target")]
    pub target: String,

    /// Baseline cut-off version
    #[serde(default = "default_baseline_version")]
    pub baseline_version: String,

    /// Label recorded on the baseline row
    #[serde(default = "default_baseline_description")]
    pub baseline_description: String,

    /// CQL script encoding (only UTF-8 is supported)
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Resource roots scanned for migration scripts
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,

    /// Per-statement timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Prefix prepended to the ledger table name
    #[serde(default)]
    pub table_prefix: String,

    /// Permit applying a version below the current ledger maximum
    #[serde(default)]
    pub allow_out_of_order: bool,

    /// Identity recorded in the ledger's `installed_by` column;
    /// empty means the DAO defaults it
    #[serde(default)]
    pub installed_by: Option<String>,
}

fn default_contact_points() -> Vec<String> {
    vec!["127.0.0.1".to_string()]
}

fn default_port() -> u16 {
    9042
}

fn default_target() -> String {
    "latest".to_string()
}

fn default_baseline_version() -> String {
    "1".to_string()
}

fn default_baseline_description() -> String {
    "<< Cassandra Baseline >>".to_string()
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_locations() -> Vec<String> {
    vec!["db/migration".to_string()]
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            keyspace: String::new(),
            contact_points: default_contact_points(),
            port: default_port(),
            username: None,
            password: None,
            target: default_target(),
            baseline_version: default_baseline_version(),
            baseline_description: default_baseline_description(),
            encoding: default_encoding(),
            locations: default_locations(),
            timeout_secs: default_timeout_secs(),
            table_prefix: String::new(),
            allow_out_of_order: false,
            installed_by: None,
        }
    }
}

impl MigrationConfig {
    /// Load configuration from a directory, probing `cqlmigrate.yml` then
    /// `cqlmigrate.yaml`.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("cqlmigrate.yml");
        let yaml_path = dir.join("cqlmigrate.yaml");

        let path = if yml_path.exists() {
            yml_path
        } else if yaml_path.exists() {
            yaml_path
        } else {
            return Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            });
        };

        Self::load_from_file(&path)
    }

    /// Load configuration from an explicit file path.
    ///
    /// Parsing only; call [`validate`](Self::validate) once any caller-side
    /// overrides (such as a `--keyspace` flag) have been applied.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: MigrationConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Reject out-of-range or unsupported values.
    pub fn validate(&self) -> CoreResult<()> {
        if self.keyspace.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                field: "keyspace".to_string(),
                reason: "a target keyspace is required".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(CoreError::ConfigInvalid {
                field: "timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if !matches!(
            self.encoding.to_ascii_lowercase().as_str(),
            "utf-8" | "utf8"
        ) {
            return Err(CoreError::ConfigInvalid {
                field: "encoding".to_string(),
                reason: format!("unsupported encoding '{}'", self.encoding),
            });
        }
        if self.locations.iter().any(|l| l.trim().is_empty()) {
            return Err(CoreError::ConfigInvalid {
                field: "locations".to_string(),
                reason: "locations must not contain empty entries".to_string(),
            });
        }
        self.target_version()?;
        self.baseline()?;
        Ok(())
    }

    /// Full ledger table name: `{table_prefix}{base name}`.
    pub fn table_name(&self) -> String {
        format!("{}{}", self.table_prefix, BASE_TABLE_NAME)
    }

    /// Companion counter table name.
    pub fn counts_table_name(&self) -> String {
        format!("{}_counts", self.table_name())
    }

    /// Parsed target version.
    pub fn target_version(&self) -> CoreResult<MigrationVersion> {
        self.target.parse()
    }

    /// Parsed baseline version.
    pub fn baseline(&self) -> CoreResult<MigrationVersion> {
        MigrationVersion::parse(&self.baseline_version)
    }

    /// Per-statement timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
