//! Download cache record
//!
//! A persistent JSON map of catalog-name -> configuration-entry snapshot,
//! used purely as a completion marker: an entry under a name means that
//! name's artifact set was fully fetched at some point. It is not an
//! integrity check. Entries are appended or overwritten by name, never
//! removed automatically.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::catalog::ConfigEntry;
use crate::error::{DeployError, Result};

/// Handle to the downloaded-versions record file
#[derive(Debug, Clone)]
pub struct DownloadRecord {
    path: PathBuf,
}

impl DownloadRecord {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decide whether the fetch phase can be skipped for `name`.
    ///
    /// `forced` always re-fetches, regardless of the record contents. An
    /// absent record file means nothing was ever fetched.
    pub fn should_skip_fetch(&self, name: &str, forced: bool) -> Result<bool> {
        if forced {
            return Ok(false);
        }
        if !self.path.exists() {
            return Ok(false);
        }
        Ok(self.load()?.contains_key(name))
    }

    /// Mark `name` as fully fetched, overwriting any previous snapshot.
    ///
    /// Called exactly once, after all artifact locators of the entry have
    /// been fetched successfully.
    pub fn record_complete(&self, name: &str, entry: &ConfigEntry) -> Result<()> {
        let mut entries = if self.path.exists() {
            self.load()?
        } else {
            BTreeMap::new()
        };
        entries.insert(name.to_string(), entry.clone());

        let content = serde_json::to_string_pretty(&entries).map_err(|e| {
            DeployError::RecordWriteFailed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        std::fs::write(&self.path, content).map_err(|e| DeployError::RecordWriteFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn load(&self) -> Result<BTreeMap<String, ConfigEntry>> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| DeployError::RecordReadFailed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        serde_json::from_str(&content).map_err(|e| DeployError::RecordReadFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
