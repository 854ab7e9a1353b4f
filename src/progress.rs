//! Progress reporting for long-running stages
//!
//! The pipeline reports stage boundaries through [`ProgressReporter`] and
//! never depends on the rendering; tests run with [`SilentProgress`].

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Callback surface invoked around each long-running stage
pub trait ProgressReporter {
    /// A stage started; `message` is the operator-facing description
    fn stage_started(&self, message: &str);

    /// The most recently started stage finished
    fn stage_finished(&self);
}

/// Terminal spinner shown while a blocking external call runs
pub struct SpinnerProgress {
    active: Mutex<Option<ProgressBar>>,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
        }
    }
}

impl ProgressReporter for SpinnerProgress {
    fn stage_started(&self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));

        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = active.take() {
            previous.finish();
        }
        *active = Some(spinner);
    }

    fn stage_finished(&self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(spinner) = active.take() {
            spinner.finish();
        }
    }
}

/// No-op reporter for tests
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage_started(&self, _message: &str) {}
    fn stage_finished(&self) {}
}
