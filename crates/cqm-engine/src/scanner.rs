//! Resource scanning: enumerating migration scripts under location roots.

use crate::error::{EngineError, EngineResult};
use std::path::{Path, PathBuf};

/// UTF-8 byte-order mark.
const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// A single discovered resource.
pub trait Resource: Send + Sync {
    /// Location-prefixed path used in ledger `script` columns and messages.
    fn logical_path(&self) -> &str;

    /// Final path component.
    fn filename(&self) -> &str;

    /// Load the content, stripping a leading UTF-8 BOM.
    fn load_as_string(&self, encoding: &str) -> EngineResult<String>;
}

/// Enumerates resources under a location prefix.
pub trait Scanner: Send + Sync {
    /// All resources under `location` whose filename ends with `suffix`,
    /// sorted by logical path.
    fn scan(&self, location: &str, suffix: &str) -> EngineResult<Vec<Box<dyn Resource>>>;
}

/// Scanner over a directory tree on disk.
///
/// Locations are resolved relative to a base directory (typically the
/// project root the CLI runs in).
pub struct FileSystemScanner {
    base_dir: PathBuf,
}

impl FileSystemScanner {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn collect(
        dir: &Path,
        location: &str,
        suffix: &str,
        out: &mut Vec<Box<dyn Resource>>,
    ) -> EngineResult<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_dir() {
                Self::collect(&path, location, suffix, out)?;
            } else if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(suffix))
            {
                out.push(Box::new(FileResource::new(path, location)));
            }
        }
        Ok(())
    }
}

impl Scanner for FileSystemScanner {
    fn scan(&self, location: &str, suffix: &str) -> EngineResult<Vec<Box<dyn Resource>>> {
        let root = self.base_dir.join(location);
        if !root.exists() {
            // A location may only exist in some deployments
            log::debug!("location '{location}' does not exist, skipping");
            return Ok(Vec::new());
        }

        let mut resources = Vec::new();
        Self::collect(&root, location, suffix, &mut resources)?;
        resources.sort_by(|a, b| a.logical_path().cmp(b.logical_path()));
        Ok(resources)
    }
}

/// A resource backed by a file on disk.
struct FileResource {
    physical: PathBuf,
    logical: String,
    filename: String,
}

impl FileResource {
    fn new(physical: PathBuf, location: &str) -> Self {
        let filename = physical
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let logical = format!("{}/{}", location.trim_end_matches('/'), filename);
        Self {
            physical,
            logical,
            filename,
        }
    }
}

impl Resource for FileResource {
    fn logical_path(&self) -> &str {
        &self.logical
    }

    fn filename(&self) -> &str {
        &self.filename
    }

    fn load_as_string(&self, encoding: &str) -> EngineResult<String> {
        if !matches!(encoding.to_ascii_lowercase().as_str(), "utf-8" | "utf8") {
            return Err(EngineError::ResourceDecode {
                path: self.logical.clone(),
                detail: format!("unsupported encoding '{encoding}'"),
            });
        }

        let bytes = std::fs::read(&self.physical)?;
        let bytes = match bytes.strip_prefix(&BOM) {
            Some(rest) => rest.to_vec(),
            None => bytes,
        };
        String::from_utf8(bytes).map_err(|e| EngineError::ResourceDecode {
            path: self.logical.clone(),
            detail: e.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "scanner_test.rs"]
mod tests;
