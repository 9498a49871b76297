//! Migration version type with a total order and two sentinels.

use crate::error::{CoreError, CoreResult};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A migration version: a dotted numeric sequence, or one of two sentinels
/// that sort below (`Empty`) and above (`Latest`) every numbered version.
///
/// Numbered versions are stored in canonical form with trailing zero
/// components trimmed, so `1.0` and `1` compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MigrationVersion {
    repr: Repr,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Repr {
    Empty,
    Numbered(Vec<u64>),
    Latest,
}

impl MigrationVersion {
    /// Sentinel below all numbered versions.
    pub const EMPTY: MigrationVersion = MigrationVersion { repr: Repr::Empty };

    /// Sentinel above all numbered versions.
    pub const LATEST: MigrationVersion = MigrationVersion { repr: Repr::Latest };

    /// Parse a dotted numeric version string such as `1`, `1.2` or `2.0.1`.
    ///
    /// Empty strings, empty components (`1..2`) and non-numeric components
    /// fail with [`CoreError::InvalidVersion`]. Trailing zero components are
    /// trimmed so the result is canonical.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidVersion {
                raw: raw.to_string(),
                reason: "version is empty".to_string(),
            });
        }

        let mut components = Vec::new();
        for part in trimmed.split('.') {
            if part.is_empty() {
                return Err(CoreError::InvalidVersion {
                    raw: raw.to_string(),
                    reason: "empty version component".to_string(),
                });
            }
            let n = part.parse::<u64>().map_err(|_| CoreError::InvalidVersion {
                raw: raw.to_string(),
                reason: format!("non-numeric component '{part}'"),
            })?;
            components.push(n);
        }

        // Canonical form: trim trailing zeros, keeping at least one component
        // so the version `0` survives.
        while components.len() > 1 && components.last() == Some(&0) {
            components.pop();
        }

        Ok(Self {
            repr: Repr::Numbered(components),
        })
    }

    /// Whether this is one of the two sentinels.
    pub fn is_sentinel(&self) -> bool {
        !matches!(self.repr, Repr::Numbered(_))
    }

    /// `self >= other`
    pub fn is_at_least(&self, other: &MigrationVersion) -> bool {
        self >= other
    }

    /// `self > other`
    pub fn is_newer_than(&self, other: &MigrationVersion) -> bool {
        self > other
    }

    /// The text persisted in the ledger's `version` column.
    ///
    /// Only valid for numbered versions; sentinels are never persisted.
    pub fn table_value(&self) -> String {
        debug_assert!(
            !self.is_sentinel(),
            "sentinel versions must not be persisted"
        );
        self.to_string()
    }
}

impl fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Empty => write!(f, "<< Empty Schema >>"),
            Repr::Latest => write!(f, "<< Latest >>"),
            Repr::Numbered(components) => {
                let text = components
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(".");
                f.write_str(&text)
            }
        }
    }
}

impl FromStr for MigrationVersion {
    type Err = CoreError;

    /// Parse configuration input: the sentinel spellings `latest` / `current`
    /// and `empty` (case-insensitive) or any numeric form.
    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" | "current" => Ok(Self::LATEST),
            "empty" => Ok(Self::EMPTY),
            _ => Self::parse(s),
        }
    }
}

impl Ord for MigrationVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.repr, &other.repr) {
            (Repr::Empty, Repr::Empty) => Ordering::Equal,
            (Repr::Empty, _) => Ordering::Less,
            (_, Repr::Empty) => Ordering::Greater,
            (Repr::Latest, Repr::Latest) => Ordering::Equal,
            (Repr::Latest, _) => Ordering::Greater,
            (_, Repr::Latest) => Ordering::Less,
            (Repr::Numbered(a), Repr::Numbered(b)) => {
                let len = a.len().max(b.len());
                for i in 0..len {
                    let x = a.get(i).copied().unwrap_or(0);
                    let y = b.get(i).copied().unwrap_or(0);
                    match x.cmp(&y) {
                        Ordering::Equal => continue,
                        unequal => return unequal,
                    }
                }
                Ordering::Equal
            }
        }
    }
}

impl PartialOrd for MigrationVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
#[path = "version_test.rs"]
mod tests;
