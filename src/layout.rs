//! Workspace layout
//!
//! Derives the deterministic set of filesystem paths for a resolved
//! configuration entry, and owns the side-effecting workspace preparation.
//! The download area is persistent across runs (it backs the cache); the
//! flash/staging area is always destroyed and recreated.

use std::path::{Path, PathBuf};

use crate::catalog::ConfigEntry;
use crate::error::{DeployError, Result};
use crate::exec::{CommandRunner, Invocation};

/// Workspace directory name under the user's home directory
const WORKSPACE_DIR: &str = ".dcs_deploy";

/// File name of the downloaded-versions record at the workspace root
const RECORD_FILE: &str = "downloaded_versions.json";

/// Get the workspace root directory.
///
/// Defaults to `~/.dcs_deploy`; can be overridden with the
/// `DCS_DEPLOY_ROOT` environment variable.
pub fn workspace_root() -> Result<PathBuf> {
    if let Ok(root) = std::env::var("DCS_DEPLOY_ROOT") {
        return Ok(PathBuf::from(root));
    }

    let home = dirs::home_dir().ok_or(DeployError::HomeDirNotFound)?;
    Ok(home.join(WORKSPACE_DIR))
}

/// Canonical relative key for a configuration entry.
///
/// Equal entries always produce the same key; this is what makes the
/// download cache meaningful.
pub fn config_key(entry: &ConfigEntry) -> String {
    format!(
        "{}_{}_{}_{}",
        entry.device, entry.storage, entry.board, entry.l4t_version
    )
}

/// All filesystem paths for one provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    /// Workspace root (persistent)
    pub root: PathBuf,
    /// Per-configuration download area (persistent)
    pub download_dir: PathBuf,
    /// Per-configuration staging area (destroyed and recreated every run)
    pub flash_dir: PathBuf,
    /// Downloaded artifact archives
    pub rootfs_archive: PathBuf,
    pub l4t_archive: PathBuf,
    pub nvidia_overlay_archive: PathBuf,
    pub airvolute_overlay_archive: PathBuf,
    /// Extracted L4T tree root
    pub l4t_dir: PathBuf,
    /// Rootfs subdirectory of the L4T tree
    pub rootfs_dir: PathBuf,
    /// Downloaded-versions record file
    pub record_path: PathBuf,
    /// L4T helper scripts
    pub apply_binaries_script: PathBuf,
    pub create_user_script: PathBuf,
    pub initrd_flash_script: PathBuf,
    pub external_xml_config: PathBuf,
    /// First-boot marker inside the extracted rootfs
    pub first_boot_marker: PathBuf,
}

impl WorkspacePaths {
    /// Derive all paths for an entry under the given workspace root.
    ///
    /// Pure computation, no I/O.
    pub fn derive(entry: &ConfigEntry, root: &Path) -> Self {
        let key = config_key(entry);
        let download_dir = root.join("download").join(&key);
        let flash_dir = root.join("flash").join(&key);
        let l4t_dir = flash_dir.join("Linux_for_Tegra");
        let rootfs_dir = l4t_dir.join("rootfs");

        Self {
            root: root.to_path_buf(),
            rootfs_archive: download_dir.join("rootfs.tbz2"),
            l4t_archive: download_dir.join("l4t.tbz2"),
            nvidia_overlay_archive: download_dir.join("nvidia_overlay.tbz2"),
            airvolute_overlay_archive: download_dir.join("airvolute_overlay.tbz2"),
            record_path: root.join(RECORD_FILE),
            apply_binaries_script: l4t_dir.join("apply_binaries.sh"),
            create_user_script: l4t_dir.join("tools/l4t_create_default_user.sh"),
            initrd_flash_script: l4t_dir.join("tools/kernel_flash/l4t_initrd_flash.sh"),
            external_xml_config: l4t_dir.join("tools/kernel_flash/flash_l4t_external_custom.xml"),
            first_boot_marker: rootfs_dir.join("etc/first_boot"),
            download_dir,
            flash_dir,
            l4t_dir,
            rootfs_dir,
        }
    }

    /// Prepare the workspace for a run.
    ///
    /// The root and download directories are created if absent. The flash
    /// directory is always reset to empty: staged trees contain root-owned
    /// files, so removal falls back to a privileged `rm -r` when the
    /// unprivileged removal is not permitted. This reset is unconditional
    /// and independent of `--force`, which only governs the download cache.
    pub fn prepare(&self, runner: &dyn CommandRunner) -> Result<()> {
        create_dir_all(&self.download_dir)?;

        if self.flash_dir.exists() {
            println!("Removing previous staging tree ...");
            if let Err(e) = std::fs::remove_dir_all(&self.flash_dir) {
                let invocation = Invocation::new("rm")
                    .arg("-r")
                    .arg(self.flash_dir.display().to_string())
                    .privileged();
                let status = runner.run(&invocation)?;
                if !status.success {
                    return Err(DeployError::WorkspaceSetupFailed {
                        path: self.flash_dir.display().to_string(),
                        reason: format!("{} ({})", e, status.describe()),
                    });
                }
            }
        }
        create_dir_all(&self.flash_dir)
    }
}

fn create_dir_all(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| DeployError::WorkspaceSetupFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Storage, test_entry};
    use crate::exec::testing::RecordingRunner;

    #[test]
    fn test_config_key_format() {
        let entry = test_entry(Storage::Emmc, None);
        assert_eq!(config_key(&entry), "xavier_nx_emmc_1.2_51");
    }

    #[test]
    fn test_derive_is_deterministic() {
        let entry = test_entry(Storage::Nvme, Some("https://example.com/overlay.tbz2"));
        let root = Path::new("/tmp/dcs");
        assert_eq!(
            WorkspacePaths::derive(&entry, root),
            WorkspacePaths::derive(&entry.clone(), root)
        );
    }

    #[test]
    fn test_derived_paths() {
        let entry = test_entry(Storage::Emmc, None);
        let paths = WorkspacePaths::derive(&entry, Path::new("/home/op/.dcs_deploy"));

        assert_eq!(
            paths.download_dir,
            Path::new("/home/op/.dcs_deploy/download/xavier_nx_emmc_1.2_51")
        );
        assert_eq!(
            paths.l4t_dir,
            Path::new("/home/op/.dcs_deploy/flash/xavier_nx_emmc_1.2_51/Linux_for_Tegra")
        );
        assert_eq!(paths.rootfs_dir, paths.l4t_dir.join("rootfs"));
        assert_eq!(paths.rootfs_archive, paths.download_dir.join("rootfs.tbz2"));
        assert_eq!(
            paths.record_path,
            Path::new("/home/op/.dcs_deploy/downloaded_versions.json")
        );
        assert_eq!(
            paths.first_boot_marker,
            paths.rootfs_dir.join("etc/first_boot")
        );
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let temp = tempfile::TempDir::new().unwrap();
        let entry = test_entry(Storage::Emmc, None);
        let paths = WorkspacePaths::derive(&entry, temp.path());
        let runner = RecordingRunner::new();

        paths.prepare(&runner).unwrap();
        assert!(paths.download_dir.is_dir());
        assert!(paths.flash_dir.is_dir());

        // Stale staging content is wiped on the next prepare
        std::fs::create_dir_all(paths.flash_dir.join("Linux_for_Tegra")).unwrap();
        paths.prepare(&runner).unwrap();
        assert!(paths.flash_dir.is_dir());
        assert_eq!(std::fs::read_dir(&paths.flash_dir).unwrap().count(), 0);

        paths.prepare(&runner).unwrap();
        assert_eq!(std::fs::read_dir(&paths.flash_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_prepare_preserves_download_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let entry = test_entry(Storage::Emmc, None);
        let paths = WorkspacePaths::derive(&entry, temp.path());
        let runner = RecordingRunner::new();

        paths.prepare(&runner).unwrap();
        std::fs::write(&paths.l4t_archive, b"cached").unwrap();

        paths.prepare(&runner).unwrap();
        assert!(paths.l4t_archive.exists());
    }
}
