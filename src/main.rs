//! dcs-deploy - Airvolute DCS provisioning tool
//!
//! Resolves a requested hardware/software configuration to a concrete
//! artifact set, caches the artifacts locally, stages them into a flashable
//! Linux for Tegra tree, and invokes the device-specific flashing procedure.

use clap::Parser;

mod cache;
mod catalog;
mod cli;
mod commands;
mod context;
mod error;
mod exec;
mod fetch;
mod flash;
mod layout;
mod progress;
mod stage;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List => commands::list::run(&cli.catalog),
        Commands::Flash(args) => commands::flash::run(&cli.catalog, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
