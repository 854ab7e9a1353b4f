//! Configuration catalog
//!
//! The catalog is a JSON map of catalog-name -> configuration entry. It is
//! loaded once at startup, validated, and read-only thereafter. A requested
//! selection tuple resolves to exactly one entry or the run aborts.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DeployError, Result};

/// Supported device families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[value(name = "xavier_nx")]
    XavierNx,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::XavierNx => write!(f, "xavier_nx"),
        }
    }
}

/// Target storage medium; each variant selects a distinct flashing invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Storage {
    Emmc,
    Nvme,
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::Emmc => write!(f, "emmc"),
            Storage::Nvme => write!(f, "nvme"),
        }
    }
}

/// One catalog entry: the hardware tuple plus its artifact locators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub device: Device,
    pub l4t_version: String,
    pub board: String,
    pub storage: Storage,
    pub rootfs: String,
    pub l4t: String,
    /// The catalog uses the literal string "none" for entries without an
    /// NVIDIA overlay; it round-trips through `Option`.
    #[serde(
        serialize_with = "serialize_overlay",
        deserialize_with = "deserialize_overlay"
    )]
    pub nvidia_overlay: Option<String>,
    pub airvolute_overlay: String,
}

fn serialize_overlay<S: Serializer>(
    value: &Option<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(url) => serializer.serialize_str(url),
        None => serializer.serialize_str("none"),
    }
}

fn deserialize_overlay<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if raw == "none" {
        Ok(None)
    } else {
        Ok(Some(raw))
    }
}

impl ConfigEntry {
    /// True when this entry matches the requested selection exactly
    fn matches(&self, selection: &Selection) -> bool {
        self.device == selection.device
            && self.l4t_version == selection.l4t_version
            && self.board == selection.board
            && self.storage == selection.storage
    }

    fn tuple(&self) -> (Device, &str, &str, Storage) {
        (
            self.device,
            self.l4t_version.as_str(),
            self.board.as_str(),
            self.storage,
        )
    }
}

/// The operator-supplied tuple; exists only to resolve to a `ConfigEntry`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub device: Device,
    pub l4t_version: String,
    pub board: String,
    pub storage: Storage,
}

/// The loaded, validated set of catalog entries
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: BTreeMap<String, ConfigEntry>,
}

impl Catalog {
    /// Load and validate the catalog from a JSON file.
    ///
    /// A missing file is fatal. Two names describing the same
    /// (device, l4t_version, board, storage) tuple are rejected so a
    /// selection can only ever match one entry.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DeployError::CatalogMissing {
                    path: path.display().to_string(),
                }
            } else {
                DeployError::IoError {
                    message: format!("Failed to read catalog '{}': {}", path.display(), e),
                }
            }
        })?;

        let entries: BTreeMap<String, ConfigEntry> =
            serde_json::from_str(&content).map_err(|e| DeployError::CatalogInvalid {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let catalog = Self { entries };
        catalog.reject_duplicates()?;
        Ok(catalog)
    }

    fn reject_duplicates(&self) -> Result<()> {
        let pairs: Vec<(&String, &ConfigEntry)> = self.entries.iter().collect();
        for (i, (first_name, first)) in pairs.iter().enumerate() {
            for (second_name, second) in &pairs[i + 1..] {
                if first.tuple() == second.tuple() {
                    return Err(DeployError::DuplicateCatalogEntry {
                        first: (*first_name).clone(),
                        second: (*second_name).clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Resolve a selection to its single matching entry.
    ///
    /// No fuzzy matching, no defaulting; no match aborts the pipeline
    /// before any filesystem mutation.
    pub fn resolve(&self, selection: &Selection) -> Result<(&str, &ConfigEntry)> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.matches(selection))
            .map(|(name, entry)| (name.as_str(), entry))
            .ok_or_else(|| DeployError::UnsupportedSelection {
                device: selection.device.to_string(),
                l4t_version: selection.l4t_version.clone(),
                board: selection.board.clone(),
                storage: selection.storage.to_string(),
            })
    }

    /// Iterate entries in a stable (name-sorted) order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ConfigEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn test_entry(storage: Storage, nvidia_overlay: Option<&str>) -> ConfigEntry {
    ConfigEntry {
        device: Device::XavierNx,
        l4t_version: "51".to_string(),
        board: "1.2".to_string(),
        storage,
        rootfs: "https://example.com/rootfs.tbz2".to_string(),
        l4t: "https://example.com/l4t.tbz2".to_string(),
        nvidia_overlay: nvidia_overlay.map(str::to_string),
        airvolute_overlay: "https://example.com/airvolute_overlay.tbz2".to_string(),
    }
}
