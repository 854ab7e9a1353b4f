//! List command implementation
//!
//! Prints every catalog entry's device, L4T version, board revision and
//! storage medium. No side effects.

use std::path::Path;

use console::Style;

use crate::catalog::Catalog;
use crate::error::Result;

/// Run list command
pub fn run(catalog_path: &Path) -> Result<()> {
    let catalog = Catalog::load(catalog_path)?;

    if catalog.is_empty() {
        println!("No configurations available.");
        return Ok(());
    }

    for (name, entry) in catalog.entries() {
        println!("==== {} ====", Style::new().bold().yellow().apply_to(name));
        println!(
            "{} {}",
            Style::new().bold().apply_to("Device:"),
            entry.device
        );
        println!(
            "{} {}",
            Style::new().bold().apply_to("L4T version:"),
            entry.l4t_version
        );
        println!("{} {}", Style::new().bold().apply_to("Board:"), entry.board);
        println!(
            "{} {}",
            Style::new().bold().apply_to("Storage:"),
            entry.storage
        );
        println!("====================");
        println!();
    }

    Ok(())
}
