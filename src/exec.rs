//! External process invocation seam
//!
//! Every external call the pipeline makes (tar extraction, L4T helper
//! scripts, file installation, flashing) goes through [`CommandRunner`] so
//! the staging and flashing logic is testable without touching the system.
//! Privileged invocations are prefixed with `sudo` by the production runner.

use std::path::PathBuf;
use std::process::Command;

use crate::error::{DeployError, Result};

/// A single external invocation, fully described before it is run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    privileged: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            privileged: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Run under sudo
    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    /// Human-readable command line for logs and error messages
    pub fn rendered(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 2);
        if self.privileged {
            parts.push("sudo".to_string());
        }
        parts.push(self.program.clone());
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Outcome of an external invocation that was spawned and waited for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    pub success: bool,
    pub code: Option<i32>,
}

impl RunStatus {
    /// Describe the exit status for error messages
    pub fn describe(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "termination by signal".to_string(),
        }
    }
}

/// Seam for running external processes
pub trait CommandRunner {
    /// Spawn the invocation and wait for it to exit.
    ///
    /// A non-zero exit is not an error at this level; callers inspect the
    /// returned status and decide how to report it.
    fn run(&self, invocation: &Invocation) -> Result<RunStatus>;
}

/// Production runner backed by `std::process::Command`
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<RunStatus> {
        let mut command = if invocation.privileged {
            let mut cmd = Command::new("sudo");
            cmd.arg(&invocation.program);
            cmd
        } else {
            Command::new(&invocation.program)
        };
        command.args(&invocation.args);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        let status = command.status().map_err(|e| DeployError::SpawnFailed {
            command: invocation.rendered(),
            reason: e.to_string(),
        })?;

        Ok(RunStatus {
            success: status.success(),
            code: status.code(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Test runner that records rendered command lines instead of spawning.
    ///
    /// Commands whose rendered form contains one of the configured failure
    /// substrings report a non-zero exit.
    pub struct RecordingRunner {
        commands: Mutex<Vec<String>>,
        fail_on: Vec<String>,
    }

    impl RecordingRunner {
        pub fn new() -> Self {
            Self {
                commands: Mutex::new(Vec::new()),
                fail_on: Vec::new(),
            }
        }

        pub fn failing_on(substring: &str) -> Self {
            Self {
                commands: Mutex::new(Vec::new()),
                fail_on: vec![substring.to_string()],
            }
        }

        pub fn commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, invocation: &Invocation) -> Result<RunStatus> {
            let rendered = invocation.rendered();
            let failed = self.fail_on.iter().any(|s| rendered.contains(s));
            self.commands.lock().unwrap().push(rendered);
            Ok(RunStatus {
                success: !failed,
                code: Some(if failed { 1 } else { 0 }),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_plain_command() {
        let invocation = Invocation::new("tar").args(["xf", "l4t.tbz2"]);
        assert_eq!(invocation.rendered(), "tar xf l4t.tbz2");
    }

    #[test]
    fn test_rendered_privileged_command() {
        let invocation = Invocation::new("tar")
            .args(["xpf", "rootfs.tbz2"])
            .privileged();
        assert_eq!(invocation.rendered(), "sudo tar xpf rootfs.tbz2");
    }

    #[test]
    fn test_system_runner_reports_exit_code() {
        let status = SystemRunner.run(&Invocation::new("false")).unwrap();
        assert!(!status.success);
        assert_eq!(status.code, Some(1));
        assert_eq!(status.describe(), "exit code 1");
    }

    #[test]
    fn test_system_runner_success() {
        let status = SystemRunner.run(&Invocation::new("true")).unwrap();
        assert!(status.success);
    }

    #[test]
    fn test_system_runner_spawn_failure() {
        let err = SystemRunner
            .run(&Invocation::new("/nonexistent/program-xyz"))
            .unwrap_err();
        assert!(matches!(err, DeployError::SpawnFailed { .. }));
    }
}
