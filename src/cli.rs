//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::{Device, Selection, Storage};

/// dcs-deploy - Airvolute DCS provisioning tool
///
/// Resolve a device configuration, download and stage its artifacts, and
/// flash the board.
#[derive(Parser, Debug)]
#[command(
    name = "dcs-deploy",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Provisioning and flashing tool for Airvolute DCS carrier boards",
    long_about = "dcs-deploy resolves a requested (device, jetpack, hardware revision, storage) \
                  configuration against the configuration catalog, downloads and caches its \
                  artifact set, stages a flashable Linux for Tegra tree, and invokes the \
                  storage-specific flashing procedure.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  dcs-deploy list\n    \
                  dcs-deploy flash xavier_nx 51 1.2 emmc\n    \
                  dcs-deploy flash xavier_nx 51 1.2 nvme --force"
)]
pub struct Cli {
    /// Path to the configuration catalog
    #[arg(long, global = true, default_value = "local/config_db.json")]
    pub catalog: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available configurations
    List,

    /// Run the entire flash process
    Flash(FlashArgs),
}

/// Arguments for the flash command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Flash the eMMC of a Xavier NX carrier:\n    dcs-deploy flash xavier_nx 51 1.2 emmc\n\n\
                  Flash an NVMe drive, re-downloading all artifacts:\n    dcs-deploy flash xavier_nx 51 1.2 nvme --force\n\n\
                  Keep staging after a failed stage (diagnostics):\n    dcs-deploy flash xavier_nx 51 1.2 emmc --keep-going")]
pub struct FlashArgs {
    /// Which type of device are we setting up
    #[arg(value_enum)]
    pub target_device: Device,

    /// Which jetpack are we going to use (e.g. 51)
    pub jetpack: String,

    /// Which hardware revision of carrier board are we going to use (e.g. 1.2)
    pub hwrev: String,

    /// Which storage medium are we going to use
    #[arg(value_enum)]
    pub storage: Storage,

    /// Files will be deleted, downloaded and extracted again
    #[arg(long)]
    pub force: bool,

    /// Run remaining stages after a stage failure instead of stopping
    #[arg(long)]
    pub keep_going: bool,

    /// Directory holding the first-boot service files and scripts
    #[arg(long, default_value = "resources")]
    pub resources: PathBuf,
}

impl FlashArgs {
    /// The selection tuple this invocation asks to provision
    pub fn selection(&self) -> Selection {
        Selection {
            device: self.target_device,
            l4t_version: self.jetpack.clone(),
            board: self.hwrev.clone(),
            storage: self.storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_flash() {
        let cli =
            Cli::try_parse_from(["dcs-deploy", "flash", "xavier_nx", "51", "1.2", "emmc"]).unwrap();
        match cli.command {
            Commands::Flash(args) => {
                assert_eq!(args.target_device, Device::XavierNx);
                assert_eq!(args.jetpack, "51");
                assert_eq!(args.hwrev, "1.2");
                assert_eq!(args.storage, Storage::Emmc);
                assert!(!args.force);
                assert!(!args.keep_going);
            }
            Commands::List => panic!("Expected Flash command"),
        }
    }

    #[test]
    fn test_cli_parsing_flash_with_options() {
        let cli = Cli::try_parse_from([
            "dcs-deploy",
            "flash",
            "xavier_nx",
            "51",
            "1.2",
            "nvme",
            "--force",
            "--keep-going",
        ])
        .unwrap();
        match cli.command {
            Commands::Flash(args) => {
                assert_eq!(args.storage, Storage::Nvme);
                assert!(args.force);
                assert!(args.keep_going);
            }
            Commands::List => panic!("Expected Flash command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_storage() {
        let result = Cli::try_parse_from(["dcs-deploy", "flash", "xavier_nx", "51", "1.2", "usb"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_device() {
        let result = Cli::try_parse_from(["dcs-deploy", "flash", "orin_agx", "51", "1.2", "emmc"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parsing_list() {
        let cli = Cli::try_parse_from(["dcs-deploy", "list"]).unwrap();
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_cli_global_catalog_option() {
        let cli =
            Cli::try_parse_from(["dcs-deploy", "list", "--catalog", "/tmp/db.json"]).unwrap();
        assert_eq!(cli.catalog, PathBuf::from("/tmp/db.json"));
    }

    #[test]
    fn test_flash_args_selection() {
        let cli =
            Cli::try_parse_from(["dcs-deploy", "flash", "xavier_nx", "51", "1.2", "emmc"]).unwrap();
        let Commands::Flash(args) = cli.command else {
            panic!("Expected Flash command");
        };
        let selection = args.selection();
        assert_eq!(selection.device, Device::XavierNx);
        assert_eq!(selection.l4t_version, "51");
        assert_eq!(selection.board, "1.2");
        assert_eq!(selection.storage, Storage::Emmc);
    }
}
