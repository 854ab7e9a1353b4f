//! Immutable per-run state
//!
//! Built once after catalog resolution and threaded explicitly through the
//! fetch, staging and flash phases.

use crate::catalog::ConfigEntry;
use crate::layout::WorkspacePaths;

/// Everything a provisioning run needs, resolved up front
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Catalog name of the resolved entry
    pub name: String,
    /// The resolved configuration entry
    pub entry: ConfigEntry,
    /// Paths derived from the entry
    pub paths: WorkspacePaths,
}

impl RunContext {
    pub fn new(name: impl Into<String>, entry: ConfigEntry, paths: WorkspacePaths) -> Self {
        Self {
            name: name.into(),
            entry,
            paths,
        }
    }
}
