//! Common test utilities for dcs-deploy integration tests

use std::path::PathBuf;
use tempfile::TempDir;

/// A disposable catalog file plus workspace root for integration tests
#[allow(dead_code)]
pub struct TestSetup {
    /// Temporary directory holding the catalog and the workspace root
    pub temp: TempDir,
    /// Path to the catalog file
    pub catalog_path: PathBuf,
    /// Workspace root passed via DCS_DEPLOY_ROOT
    pub root: PathBuf,
}

#[allow(dead_code)]
pub const CATALOG_JSON: &str = r#"{
    "xavier_nx_51_12_emmc": {
        "device": "xavier_nx",
        "l4t_version": "51",
        "board": "1.2",
        "storage": "emmc",
        "rootfs": "https://example.com/rootfs.tbz2",
        "l4t": "https://example.com/l4t.tbz2",
        "nvidia_overlay": "none",
        "airvolute_overlay": "https://example.com/airvolute_overlay.tbz2"
    },
    "xavier_nx_51_12_nvme": {
        "device": "xavier_nx",
        "l4t_version": "51",
        "board": "1.2",
        "storage": "nvme",
        "rootfs": "https://example.com/rootfs.tbz2",
        "l4t": "https://example.com/l4t.tbz2",
        "nvidia_overlay": "https://example.com/nvidia_overlay.tbz2",
        "airvolute_overlay": "https://example.com/airvolute_overlay.tbz2"
    }
}"#;

impl TestSetup {
    /// Create a temp directory with the standard two-entry catalog
    pub fn new() -> Self {
        Self::with_catalog(CATALOG_JSON)
    }

    /// Create a temp directory with a custom catalog body
    pub fn with_catalog(catalog: &str) -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let catalog_path = temp.path().join("config_db.json");
        std::fs::write(&catalog_path, catalog).expect("Failed to write catalog");
        let root = temp.path().join("workspace");
        Self {
            temp,
            catalog_path,
            root,
        }
    }

    /// A dcs-deploy command wired to this setup's catalog and workspace root
    pub fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = self.raw_cmd();
        cmd.arg("--catalog").arg(&self.catalog_path);
        cmd
    }

    /// A dcs-deploy command with the workspace root set but no catalog
    #[allow(dead_code)]
    pub fn raw_cmd(&self) -> assert_cmd::Command {
        #[allow(deprecated)]
        let mut cmd = assert_cmd::Command::cargo_bin("dcs-deploy").expect("binary builds");
        cmd.env("DCS_DEPLOY_ROOT", &self.root);
        cmd
    }
}
