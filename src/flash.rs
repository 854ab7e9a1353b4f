//! Flash dispatch
//!
//! Builds and issues the storage-specific flashing invocation against a
//! fully staged L4T tree. The board identifier embeds the carrier-board
//! hardware revision; the Jetson module identifier is fixed for the
//! supported device family.

use crate::catalog::{ConfigEntry, Device, Storage};
use crate::context::RunContext;
use crate::error::{DeployError, Result};
use crate::exec::{CommandRunner, Invocation};

/// Jetson module part of the flashing board identifier
const MODULE_SUFFIX: &str = "+p3668-0001-qspi-emmc";

/// Board identifier passed to the vendor initrd-flash script
pub fn board_id(entry: &ConfigEntry) -> String {
    format!("airvolute-dcs{}{}", entry.board, MODULE_SUFFIX)
}

fn invocation_for(ctx: &RunContext) -> Option<Invocation> {
    let paths = &ctx.paths;
    let script = paths.initrd_flash_script.display().to_string();

    match (ctx.entry.device, ctx.entry.storage) {
        (Device::XavierNx, Storage::Emmc) => Some(
            Invocation::new("bash")
                .arg(script)
                .arg(board_id(&ctx.entry))
                .arg("mmcblk0p1")
                .current_dir(&paths.l4t_dir)
                .privileged(),
        ),
        (Device::XavierNx, Storage::Nvme) => Some(
            Invocation::new("bash")
                .arg(script)
                .args(["--external-only", "--external-device", "nvme0n1p1"])
                .arg("-c")
                .arg(paths.external_xml_config.display().to_string())
                .arg("--showlogs")
                .arg(board_id(&ctx.entry))
                .arg("nvme0n1p1")
                .current_dir(&paths.l4t_dir)
                .privileged(),
        ),
    }
}

/// Flash the staged tree onto the target device's storage.
///
/// A (device, storage) combination without a flashing procedure is an
/// explicit error, never a silent no-op.
pub fn flash(ctx: &RunContext, runner: &dyn CommandRunner) -> Result<()> {
    let invocation = invocation_for(ctx).ok_or_else(|| DeployError::UnsupportedTarget {
        device: ctx.entry.device.to_string(),
        storage: ctx.entry.storage.to_string(),
    })?;

    let status = runner.run(&invocation)?;
    if !status.success {
        return Err(DeployError::FlashFailed {
            command: invocation.rendered(),
            status: status.describe(),
        });
    }
    Ok(())
}
