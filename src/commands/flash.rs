//! Flash command implementation
//!
//! Orchestrates the full provisioning run: resolve the selection, derive
//! and prepare the workspace, fetch (or reuse) the artifact set, run the
//! staging pipeline, and dispatch the flash.

use std::path::Path;

use console::Style;

use crate::cache::DownloadRecord;
use crate::catalog::Catalog;
use crate::cli::FlashArgs;
use crate::context::RunContext;
use crate::error::Result;
use crate::exec::SystemRunner;
use crate::fetch::{self, WgetFetcher};
use crate::flash;
use crate::layout::{self, WorkspacePaths};
use crate::progress::SpinnerProgress;
use crate::stage::{FailurePolicy, StagingPipeline};

/// Run flash command
pub fn run(catalog_path: &Path, args: FlashArgs) -> Result<()> {
    let catalog = Catalog::load(catalog_path)?;

    // Resolution failure aborts before any filesystem mutation.
    let (name, entry) = catalog.resolve(&args.selection())?;

    let root = layout::workspace_root()?;
    let paths = WorkspacePaths::derive(entry, &root);
    let ctx = RunContext::new(name, entry.clone(), paths);

    let runner = SystemRunner;
    ctx.paths.prepare(&runner)?;

    let record = DownloadRecord::new(&ctx.paths.record_path);
    let fetcher = WgetFetcher::new(&runner);
    fetch::fetch_artifacts(&ctx, &fetcher, &record, args.force)?;

    let policy = if args.keep_going {
        FailurePolicy::KeepGoing
    } else {
        FailurePolicy::FailFast
    };
    let progress = SpinnerProgress::new();
    let pipeline = StagingPipeline::new(&runner, &progress, policy, args.resources.clone());
    pipeline.run(&ctx)?;

    flash::flash(&ctx, &runner)?;

    println!(
        "{} {} flashed successfully.",
        Style::new().bold().green().apply_to("Done:"),
        ctx.name
    );
    Ok(())
}
