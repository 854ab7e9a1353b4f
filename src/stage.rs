//! Staging pipeline
//!
//! Runs the ordered sequence of extraction, overlay and customization steps
//! that turn a fetched artifact set into a flashable L4T tree. The order is
//! fixed; each stage assumes the previous one completed. All privileged
//! work goes through the [`CommandRunner`] seam, and every exit status is
//! inspected.

use std::path::{Path, PathBuf};

use crate::context::RunContext;
use crate::error::{DeployError, Result};
use crate::exec::{CommandRunner, Invocation};
use crate::progress::ProgressReporter;

/// Default user created on the staged rootfs
const DEFAULT_USERNAME: &str = "dcs_user";
const DEFAULT_PASSWORD: &str = "dronecore";
const DEFAULT_HOSTNAME: &str = "dcs";

/// Companion package installed into the default user's home
const UHUBCTL_PACKAGE: &str = "uhubctl_2.1.0-1_arm64.deb";

/// What to do when a stage's external invocation fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failing stage (default)
    FailFast,
    /// Run the remaining stages, then report the first failure
    KeepGoing,
}

/// A named stage: one or more external invocations run in order
struct Stage {
    name: &'static str,
    invocations: Vec<Invocation>,
}

/// A first-boot systemd unit: a service file, its companion script, and
/// whether it is enabled at the multi-user boot target
struct FirstBootUnit {
    service: &'static str,
    script: &'static str,
    enable_at_boot: bool,
}

const FIRST_BOOT_UNITS: &[FirstBootUnit] = &[
    FirstBootUnit {
        service: "usb3_control/usb3_control.service",
        script: "usb3_control/usb3_control.sh",
        enable_at_boot: false,
    },
    FirstBootUnit {
        service: "usb_hub_control/usb_hub_control.service",
        script: "usb_hub_control/usb_hub_control.sh",
        enable_at_boot: false,
    },
    FirstBootUnit {
        service: "dcs_first_boot.service",
        script: "dcs_first_boot.sh",
        enable_at_boot: true,
    },
];

/// Runs the staged provisioning sequence against a prepared workspace
pub struct StagingPipeline<'a> {
    runner: &'a dyn CommandRunner,
    progress: &'a dyn ProgressReporter,
    policy: FailurePolicy,
    resources_dir: PathBuf,
}

impl<'a> StagingPipeline<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        progress: &'a dyn ProgressReporter,
        policy: FailurePolicy,
        resources_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            progress,
            policy,
            resources_dir: resources_dir.into(),
        }
    }

    /// Run all stages in order, consuming the fetched artifacts.
    ///
    /// With `FailFast` the first failing invocation aborts the run; with
    /// `KeepGoing` the rest of the failing stage is skipped, the remaining
    /// stages still run, and the first failure is returned at the end.
    pub fn run(&self, ctx: &RunContext) -> Result<()> {
        // Prime the sudo credential cache before the spinner hides the
        // password prompt.
        self.runner.run(&Invocation::new("id").privileged())?;

        let mut first_failure = None;

        for stage in self.stages(ctx) {
            self.progress.stage_started(stage.name);
            let outcome = self.run_stage(&stage);
            self.progress.stage_finished();

            if let Err(e) = outcome {
                match self.policy {
                    FailurePolicy::FailFast => return Err(e),
                    FailurePolicy::KeepGoing => {
                        eprintln!("Warning: {e}");
                        first_failure.get_or_insert(e);
                    }
                }
            }
        }

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn run_stage(&self, stage: &Stage) -> Result<()> {
        for invocation in &stage.invocations {
            let status = self.runner.run(invocation)?;
            if !status.success {
                return Err(DeployError::StageFailed {
                    stage: stage.name.to_string(),
                    command: invocation.rendered(),
                    status: status.describe(),
                });
            }
        }
        Ok(())
    }

    fn stages(&self, ctx: &RunContext) -> Vec<Stage> {
        let paths = &ctx.paths;
        let mut stages = vec![
            Stage {
                name: "extract Linux for Tegra",
                invocations: vec![extract_archive(&paths.l4t_archive, &paths.flash_dir, false)],
            },
            Stage {
                name: "extract root filesystem",
                invocations: vec![
                    Invocation::new("tar")
                        .arg("xpf")
                        .arg(paths.rootfs_archive.display().to_string())
                        .arg("--directory")
                        .arg(paths.rootfs_dir.display().to_string())
                        .privileged(),
                ],
            },
        ];

        if ctx.entry.nvidia_overlay.is_some() {
            stages.push(Stage {
                name: "apply NVIDIA overlay",
                invocations: vec![extract_archive(
                    &paths.nvidia_overlay_archive,
                    &paths.flash_dir,
                    true,
                )],
            });
        }

        stages.push(Stage {
            name: "apply binaries",
            invocations: vec![
                Invocation::new(paths.apply_binaries_script.display().to_string()).privileged(),
            ],
        });

        stages.push(Stage {
            name: "apply Airvolute overlay",
            invocations: vec![extract_archive(
                &paths.airvolute_overlay_archive,
                &paths.flash_dir,
                true,
            )],
        });

        // The Airvolute overlay can reintroduce files the first pass
        // already processed, so binaries are applied a second time.
        stages.push(Stage {
            name: "re-apply binaries",
            invocations: vec![
                Invocation::new(paths.apply_binaries_script.display().to_string())
                    .args(["-t", "False"])
                    .privileged(),
            ],
        });

        stages.push(Stage {
            name: "create default user",
            invocations: vec![
                Invocation::new(paths.create_user_script.display().to_string())
                    .args(["-u", DEFAULT_USERNAME])
                    .args(["-p", DEFAULT_PASSWORD])
                    .args(["-n", DEFAULT_HOSTNAME])
                    .arg("--accept-license")
                    .privileged(),
            ],
        });

        stages.push(Stage {
            name: "install first boot setup",
            invocations: self.first_boot_invocations(ctx),
        });

        stages
    }

    fn first_boot_invocations(&self, ctx: &RunContext) -> Vec<Invocation> {
        let paths = &ctx.paths;
        let service_dir = paths.rootfs_dir.join("etc/systemd/system");
        let bin_dir = paths.rootfs_dir.join("usr/local/bin");
        let home_dir = paths.rootfs_dir.join("home").join(DEFAULT_USERNAME);

        let mut invocations = vec![
            Invocation::new("touch")
                .arg(paths.first_boot_marker.display().to_string())
                .privileged(),
        ];

        for unit in FIRST_BOOT_UNITS {
            invocations.extend(self.install_unit(unit, &service_dir, &bin_dir));
        }

        invocations.push(
            Invocation::new("cp")
                .arg(self.resources_dir.join(UHUBCTL_PACKAGE).display().to_string())
                .arg(home_dir.display().to_string())
                .privileged(),
        );

        invocations
    }

    /// Install one service/script pair: copy the unit file into the rootfs
    /// service directory, copy the script into the rootfs binary directory
    /// and mark it executable, and optionally enable the service at the
    /// multi-user boot target.
    fn install_unit(
        &self,
        unit: &FirstBootUnit,
        service_dir: &Path,
        bin_dir: &Path,
    ) -> Vec<Invocation> {
        let service_source = self.resources_dir.join(unit.service);
        let script_source = self.resources_dir.join(unit.script);
        let script_name = Path::new(unit.script)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| unit.script.to_string());
        let service_name = Path::new(unit.service)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| unit.service.to_string());

        let mut invocations = vec![
            Invocation::new("cp")
                .arg(service_source.display().to_string())
                .arg(service_dir.display().to_string())
                .privileged(),
            Invocation::new("cp")
                .arg(script_source.display().to_string())
                .arg(bin_dir.display().to_string())
                .privileged(),
            Invocation::new("chmod")
                .arg("+x")
                .arg(bin_dir.join(&script_name).display().to_string())
                .privileged(),
        ];

        if unit.enable_at_boot {
            invocations.push(
                Invocation::new("ln")
                    .arg("-s")
                    .arg(format!("/etc/systemd/system/{service_name}"))
                    .arg(
                        service_dir
                            .join("multi-user.target.wants")
                            .join(&service_name)
                            .display()
                            .to_string(),
                    )
                    .privileged(),
            );
        }

        invocations
    }
}

fn extract_archive(archive: &Path, dest: &Path, privileged: bool) -> Invocation {
    let invocation = Invocation::new("tar")
        .arg("xf")
        .arg(archive.display().to_string())
        .arg("-C")
        .arg(dest.display().to_string());
    if privileged {
        invocation.privileged()
    } else {
        invocation
    }
}
