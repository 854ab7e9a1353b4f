//! Artifact fetching
//!
//! Network transfer itself is a collaborator behind the [`Fetcher`] trait;
//! this module owns the ordering of the artifact set, the cache gate, and
//! the completion-record write that makes future runs a cache hit.

use std::path::Path;

use crate::cache::DownloadRecord;
use crate::context::RunContext;
use crate::error::{DeployError, Result};
use crate::exec::{CommandRunner, Invocation};

/// Retrieves one artifact to a destination path
pub trait Fetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Production fetcher shelling out to wget
pub struct WgetFetcher<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> WgetFetcher<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }
}

impl Fetcher for WgetFetcher<'_> {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let invocation = Invocation::new("wget")
            .args(["-q", "--show-progress", "-O"])
            .arg(dest.display().to_string())
            .arg(url);
        let status = self.runner.run(&invocation)?;
        if !status.success {
            return Err(DeployError::FetchFailed {
                url: url.to_string(),
                reason: status.describe(),
            });
        }
        Ok(())
    }
}

/// Fetch the entire artifact set for a run, unless it is already cached.
///
/// Order: rootfs, L4T, NVIDIA overlay (skipped when the entry has none),
/// Airvolute overlay. The completion record is written only after all
/// fetches succeeded, so a partial fetch never marks the set as present.
pub fn fetch_artifacts(
    ctx: &RunContext,
    fetcher: &dyn Fetcher,
    record: &DownloadRecord,
    forced: bool,
) -> Result<()> {
    if record.should_skip_fetch(&ctx.name, forced)? {
        println!("Resources for your config are already downloaded!");
        return Ok(());
    }

    println!("Downloading rootfs:");
    fetcher.fetch(&ctx.entry.rootfs, &ctx.paths.rootfs_archive)?;

    println!("Downloading Linux for Tegra:");
    fetcher.fetch(&ctx.entry.l4t, &ctx.paths.l4t_archive)?;

    if let Some(url) = &ctx.entry.nvidia_overlay {
        println!("Downloading NVIDIA overlay:");
        fetcher.fetch(url, &ctx.paths.nvidia_overlay_archive)?;
    }

    println!("Downloading Airvolute overlay:");
    fetcher.fetch(
        &ctx.entry.airvolute_overlay,
        &ctx.paths.airvolute_overlay_archive,
    )?;

    record.record_complete(&ctx.name, &ctx.entry)
}
