//! Migration info service: the merged, status-annotated view of resolved
//! and applied migrations.

use cqm_core::migration::MigrationType;
use cqm_core::{AppliedMigration, MigrationVersion, ResolvedMigration};
use std::collections::BTreeMap;
use std::fmt;

/// Status of one entry in the merged view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    /// Resolved, not applied, at or below target.
    Pending,
    /// Resolved, not applied, above target.
    AboveTarget,
    /// Applied successfully in order.
    Success,
    /// Applied successfully below an earlier-applied higher version.
    OutOfOrder,
    /// Resolved below the current ledger maximum; will not run because
    /// out-of-order execution is disabled.
    Ignored,
    /// Applied and failed; blocks further progress.
    Failed,
    /// Applied successfully but no longer resolved locally.
    MissingSuccess,
    /// Applied unsuccessfully and no longer resolved locally.
    MissingFailed,
    /// The synthetic baseline marker.
    Baseline,
}

impl MigrationState {
    /// Whether this state counts as successfully applied.
    pub fn is_applied(&self) -> bool {
        matches!(
            self,
            MigrationState::Success
                | MigrationState::OutOfOrder
                | MigrationState::Baseline
                | MigrationState::MissingSuccess
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, MigrationState::Failed | MigrationState::MissingFailed)
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationState::Pending => "Pending",
            MigrationState::AboveTarget => "Above Target",
            MigrationState::Success => "Success",
            MigrationState::OutOfOrder => "Out of Order",
            MigrationState::Ignored => "Ignored",
            MigrationState::Failed => "Failed",
            MigrationState::MissingSuccess => "Missing (success)",
            MigrationState::MissingFailed => "Missing (failed)",
            MigrationState::Baseline => "Baseline",
        };
        f.write_str(name)
    }
}

/// One entry of the merged view: the resolved half, the applied half, or
/// both, plus the computed state.
#[derive(Debug, Clone)]
pub struct MigrationInfo {
    pub version: MigrationVersion,
    pub description: String,
    pub migration_type: MigrationType,
    pub script: String,
    pub state: MigrationState,
    pub resolved: Option<ResolvedMigration>,
    pub applied: Option<AppliedMigration>,
}

/// Builds and serves the merged view.
pub struct MigrationInfoService {
    target: MigrationVersion,
    allow_out_of_order: bool,
    infos: Vec<MigrationInfo>,
}

impl MigrationInfoService {
    pub fn new(target: MigrationVersion, allow_out_of_order: bool) -> Self {
        Self {
            target,
            allow_out_of_order,
            infos: Vec::new(),
        }
    }

    pub fn target(&self) -> &MigrationVersion {
        &self.target
    }

    /// Rebuild the merged view from a resolved set and the applied ledger.
    pub fn refresh(&mut self, resolved: &[ResolvedMigration], applied: &[AppliedMigration]) {
        let mut merged: BTreeMap<MigrationVersion, Entry<'_>> = BTreeMap::new();
        for r in resolved {
            merged.entry(r.version.clone()).or_default().resolved = Some(r);
        }
        for a in applied {
            merged.entry(a.version.clone()).or_default().applied = Some(a);
        }

        // Highest successfully applied version; pending entries below it are
        // out of order.
        let current_max = applied
            .iter()
            .filter(|a| a.success)
            .map(|a| a.version.clone())
            .max()
            .unwrap_or(MigrationVersion::EMPTY);

        let target = self.target.clone();
        let allow_out_of_order = self.allow_out_of_order;
        self.infos = merged
            .into_iter()
            .map(|(version, entry)| {
                let state =
                    entry.state(&version, &target, &current_max, allow_out_of_order, applied);
                entry.into_info(version, state)
            })
            .collect();
    }

    /// All entries, version ascending.
    pub fn all(&self) -> &[MigrationInfo] {
        &self.infos
    }

    /// The highest entry in a successfully-applied state.
    pub fn current(&self) -> Option<&MigrationInfo> {
        self.infos
            .iter()
            .rev()
            .find(|i| i.state.is_applied() && i.applied.is_some())
    }

    /// Entries that the next Migrate run would apply, version ascending.
    pub fn pending(&self) -> Vec<&MigrationInfo> {
        self.infos
            .iter()
            .filter(|i| i.state == MigrationState::Pending)
            .collect()
    }

    /// Render the merged view as an aligned text table.
    pub fn dump(&self) -> String {
        let mut rows: Vec<[String; 4]> = vec![[
            "Version".to_string(),
            "Description".to_string(),
            "Type".to_string(),
            "State".to_string(),
        ]];
        for info in &self.infos {
            rows.push([
                info.version.to_string(),
                info.description.clone(),
                info.migration_type.to_string(),
                info.state.to_string(),
            ]);
        }

        let mut widths = [0usize; 4];
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        for (n, row) in rows.iter().enumerate() {
            for (i, cell) in row.iter().enumerate() {
                out.push_str("| ");
                out.push_str(cell);
                out.extend(std::iter::repeat(' ').take(widths[i] - cell.chars().count() + 1));
            }
            out.push_str("|\n");
            if n == 0 {
                for width in widths {
                    out.push('+');
                    out.extend(std::iter::repeat('-').take(width + 2));
                }
                out.push_str("+\n");
            }
        }
        out
    }
}

#[derive(Default)]
struct Entry<'a> {
    resolved: Option<&'a ResolvedMigration>,
    applied: Option<&'a AppliedMigration>,
}

impl<'a> Entry<'a> {
    fn state(
        &self,
        version: &MigrationVersion,
        target: &MigrationVersion,
        current_max: &MigrationVersion,
        allow_out_of_order: bool,
        all_applied: &[AppliedMigration],
    ) -> MigrationState {
        match (self.resolved, self.applied) {
            (Some(_), None) => {
                if version > target {
                    MigrationState::AboveTarget
                } else if version < current_max && !allow_out_of_order {
                    MigrationState::Ignored
                } else {
                    MigrationState::Pending
                }
            }
            (None, Some(applied)) => match applied.migration_type {
                MigrationType::Schema => MigrationState::Success,
                MigrationType::Baseline => MigrationState::Baseline,
                _ if applied.success => MigrationState::MissingSuccess,
                _ => MigrationState::MissingFailed,
            },
            (Some(_), Some(applied)) => {
                if applied.migration_type == MigrationType::Baseline {
                    MigrationState::Baseline
                } else if !applied.success {
                    MigrationState::Failed
                } else if applied_out_of_order(applied, all_applied) {
                    MigrationState::OutOfOrder
                } else {
                    MigrationState::Success
                }
            }
            (None, None) => unreachable!("merged entry with neither half"),
        }
    }

    fn into_info(self, version: MigrationVersion, state: MigrationState) -> MigrationInfo {
        // The resolved half is authoritative for identity fields when present
        let (description, migration_type, script) = match (self.resolved, self.applied) {
            (Some(r), _) => (r.description.clone(), r.migration_type, r.script.clone()),
            (None, Some(a)) => (a.description.clone(), a.migration_type, a.script.clone()),
            (None, None) => unreachable!("merged entry with neither half"),
        };
        MigrationInfo {
            version,
            description,
            migration_type,
            script,
            state,
            resolved: self.resolved.cloned(),
            applied: self.applied.cloned(),
        }
    }
}

/// Whether a higher version landed in the ledger before this row.
fn applied_out_of_order(row: &AppliedMigration, all_applied: &[AppliedMigration]) -> bool {
    all_applied
        .iter()
        .any(|other| other.installed_rank < row.installed_rank && other.version > row.version)
}

#[cfg(test)]
#[path = "info_test.rs"]
mod tests;
