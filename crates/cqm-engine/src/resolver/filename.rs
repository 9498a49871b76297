//! Migration filename grammar: `PREFIX VERSION SEPARATOR DESCRIPTION SUFFIX`.

use crate::error::{EngineError, EngineResult};
use cqm_core::MigrationVersion;

/// Parsed components of a migration filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub version: MigrationVersion,
    pub description: String,
}

/// Filename grammar with configurable prefix, separator and suffix.
#[derive(Debug, Clone)]
pub struct FilenameGrammar {
    prefix: String,
    separator: String,
    suffix: String,
}

impl FilenameGrammar {
    pub fn new(
        prefix: impl Into<String>,
        separator: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            suffix: suffix.into(),
        }
    }

    /// Default grammar for CQL scripts: `V<version>__<description>.cql`.
    pub fn cql() -> Self {
        Self::new("V", "__", ".cql")
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Parse a filename.
    ///
    /// Returns `None` when the name does not match the grammar (such files
    /// are ignored by resolvers), and `Some(Err(_))` when it matches but the
    /// version or description is unusable.
    pub fn parse(&self, filename: &str) -> Option<EngineResult<ParsedName>> {
        let stem = filename.strip_suffix(self.suffix.as_str())?;
        let rest = stem.strip_prefix(self.prefix.as_str())?;

        // VERSION is the longest leading run of digits and dots
        let version_len = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(rest.len());
        if version_len == 0 {
            return None;
        }
        let (version_text, tail) = rest.split_at(version_len);

        let description_raw = tail.strip_prefix(self.separator.as_str())?;
        if description_raw.is_empty() {
            return Some(Err(EngineError::InvalidMigrationName {
                path: filename.to_string(),
                reason: "missing description".to_string(),
            }));
        }

        let version = match MigrationVersion::parse(version_text) {
            Ok(v) => v,
            Err(e) => {
                return Some(Err(EngineError::InvalidMigrationName {
                    path: filename.to_string(),
                    reason: e.to_string(),
                }))
            }
        };

        Some(Ok(ParsedName {
            version,
            description: description_raw.replace('_', " "),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(s: &str) -> MigrationVersion {
        MigrationVersion::parse(s).unwrap()
    }

    #[test]
    fn test_parse_simple_name() {
        let parsed = FilenameGrammar::cql()
            .parse("V1__init.cql")
            .unwrap()
            .unwrap();
        assert_eq!(parsed.version, version("1"));
        assert_eq!(parsed.description, "init");
    }

    #[test]
    fn test_underscore_is_not_a_version_character() {
        // The version is dot-separated; an underscore ends it, and a single
        // underscore where the separator belongs means no match at all
        assert!(FilenameGrammar::cql()
            .parse("V1_2_3__add_user_table.cql")
            .is_none());
    }

    #[test]
    fn test_parse_dot_separated_version() {
        let parsed = FilenameGrammar::cql()
            .parse("V2.0.1__tighten_quorum.cql")
            .unwrap()
            .unwrap();
        assert_eq!(parsed.version, version("2.0.1"));
        assert_eq!(parsed.description, "tighten quorum");
    }

    #[test]
    fn test_non_matching_names_ignored() {
        let grammar = FilenameGrammar::cql();
        assert!(grammar.parse("readme.txt").is_none());
        assert!(grammar.parse("Vabc__x.cql").is_none());
        assert!(grammar.parse("X1__x.cql").is_none());
        // Missing separator
        assert!(grammar.parse("V1_x.cql").is_none());
        assert!(grammar.parse("V1init.cql").is_none());
    }

    #[test]
    fn test_unparseable_version_is_an_error() {
        let result = FilenameGrammar::cql().parse("V1..2__broken.cql").unwrap();
        assert!(matches!(
            result,
            Err(EngineError::InvalidMigrationName { .. })
        ));
    }

    #[test]
    fn test_missing_description_is_an_error() {
        let result = FilenameGrammar::cql().parse("V1__.cql").unwrap();
        assert!(matches!(
            result,
            Err(EngineError::InvalidMigrationName { .. })
        ));
    }

    #[test]
    fn test_custom_grammar() {
        let grammar = FilenameGrammar::new("M", "-", ".sql");
        let parsed = grammar.parse("M42-the-answer.sql").unwrap().unwrap();
        assert_eq!(parsed.version, version("42"));
        assert_eq!(parsed.description, "the-answer");
    }
}
