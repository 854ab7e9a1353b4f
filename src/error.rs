//! Error types and handling for dcs-deploy
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for dcs-deploy operations
#[derive(Error, Diagnostic, Debug)]
pub enum DeployError {
    // Catalog errors
    #[error("Configuration catalog not found: {path}")]
    #[diagnostic(
        code(dcs_deploy::catalog::missing),
        help("Provide a catalog file with --catalog or place one at local/config_db.json")
    )]
    CatalogMissing { path: String },

    #[error("Failed to parse configuration catalog: {path}")]
    #[diagnostic(code(dcs_deploy::catalog::parse_failed))]
    CatalogInvalid { path: String, reason: String },

    #[error("Catalog entries '{first}' and '{second}' describe the same configuration")]
    #[diagnostic(
        code(dcs_deploy::catalog::duplicate),
        help("Each (device, l4t_version, board, storage) tuple must appear under exactly one name")
    )]
    DuplicateCatalogEntry { first: String, second: String },

    #[error("Unsupported configuration: {device} / L4T {l4t_version} / board {board} / {storage}")]
    #[diagnostic(
        code(dcs_deploy::catalog::unsupported),
        help("Run 'dcs-deploy list' to see the supported configurations")
    )]
    UnsupportedSelection {
        device: String,
        l4t_version: String,
        board: String,
        storage: String,
    },

    // Workspace errors
    #[error("Could not determine home directory")]
    #[diagnostic(
        code(dcs_deploy::workspace::no_home),
        help("Set DCS_DEPLOY_ROOT to choose the workspace location explicitly")
    )]
    HomeDirNotFound,

    #[error("Failed to set up workspace directory '{path}': {reason}")]
    #[diagnostic(code(dcs_deploy::workspace::setup_failed))]
    WorkspaceSetupFailed { path: String, reason: String },

    // Download-record errors
    #[error("Failed to read downloaded-versions record: {path}")]
    #[diagnostic(code(dcs_deploy::record::read_failed))]
    RecordReadFailed { path: String, reason: String },

    #[error("Failed to write downloaded-versions record: {path}")]
    #[diagnostic(code(dcs_deploy::record::write_failed))]
    RecordWriteFailed { path: String, reason: String },

    // Fetch errors
    #[error("Failed to download '{url}'")]
    #[diagnostic(
        code(dcs_deploy::fetch::failed),
        help("Check network connectivity and that the artifact URL is still valid")
    )]
    FetchFailed { url: String, reason: String },

    // Staging errors
    #[error("Stage '{stage}' failed: {command} exited with {status}")]
    #[diagnostic(
        code(dcs_deploy::stage::failed),
        help("Re-run with --force to rebuild the staging tree from scratch")
    )]
    StageFailed {
        stage: String,
        command: String,
        status: String,
    },

    #[error("Failed to spawn '{command}': {reason}")]
    #[diagnostic(
        code(dcs_deploy::exec::spawn_failed),
        help("Check that the program exists and that sudo is available")
    )]
    SpawnFailed { command: String, reason: String },

    // Flash errors
    #[error("No flashing procedure for {device} on {storage}")]
    #[diagnostic(
        code(dcs_deploy::flash::unsupported_target),
        help("Supported targets: xavier_nx on emmc or nvme")
    )]
    UnsupportedTarget { device: String, storage: String },

    #[error("Flashing failed: {command} exited with {status}")]
    #[diagnostic(code(dcs_deploy::flash::failed))]
    FlashFailed { command: String, status: String },

    // Generic I/O
    #[error("I/O error: {message}")]
    #[diagnostic(code(dcs_deploy::io::error))]
    IoError { message: String },
}

/// Result type alias using DeployError
pub type Result<T> = std::result::Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_selection_display() {
        let err = DeployError::UnsupportedSelection {
            device: "xavier_nx".to_string(),
            l4t_version: "51".to_string(),
            board: "1.2".to_string(),
            storage: "usb".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Unsupported configuration"));
        assert!(msg.contains("xavier_nx"));
        assert!(msg.contains("51"));
    }

    #[test]
    fn test_stage_failed_carries_command_and_status() {
        let err = DeployError::StageFailed {
            stage: "apply binaries".to_string(),
            command: "sudo ./apply_binaries.sh".to_string(),
            status: "exit code 1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("apply binaries"));
        assert!(msg.contains("apply_binaries.sh"));
        assert!(msg.contains("exit code 1"));
    }

    #[test]
    fn test_unsupported_target_display() {
        let err = DeployError::UnsupportedTarget {
            device: "xavier_nx".to_string(),
            storage: "sdcard".to_string(),
        };
        assert!(err.to_string().contains("No flashing procedure"));
    }
}
