//! Progress reporting for batch runs
//!
//! Provides a simple API for displaying pipeline state:
//! - Current phase (Scanning, Loading, Aggregating, Complete)
//! - Progress (current/total with a label)
//! - Activity log, forwarded to `tracing`

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::pipeline::PipelineKind;

/// Pipeline phases reported to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scanning(PipelineKind),
    Loading(PipelineKind),
    Aggregating(PipelineKind),
    Complete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Scanning(kind) => write!(f, "Scanning {} files", kind),
            Phase::Loading(kind) => write!(f, "Loading {} records", kind),
            Phase::Aggregating(kind) => write!(f, "Aggregating {} stats", kind),
            Phase::Complete => write!(f, "Complete"),
        }
    }
}

/// Trait for UI implementations - allows both console and silent/test modes
pub trait Ui {
    fn set_phase(&mut self, phase: Phase);
    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>);
    fn clear_progress(&mut self);
    fn log(&mut self, message: impl Into<String>);
}

/// Console UI: one progress bar for the current phase, log lines via tracing
pub struct ConsoleUi {
    bar: Option<ProgressBar>,
    style: ProgressStyle,
}

impl ConsoleUi {
    pub fn new() -> Self {
        let style = ProgressStyle::default_bar()
            .template("{msg:30} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        Self { bar: None, style }
    }
}

impl Default for ConsoleUi {
    fn default() -> Self {
        Self::new()
    }
}

impl Ui for ConsoleUi {
    fn set_phase(&mut self, phase: Phase) {
        self.clear_progress();
        info!("{}", phase);
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        let bar = self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(total);
            bar.set_style(self.style.clone());
            bar
        });
        bar.set_length(total);
        bar.set_position(current);
        bar.set_message(label.into());
    }

    fn clear_progress(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        match &self.bar {
            Some(bar) => bar.suspend(|| info!("{}", message)),
            None => info!("{}", message),
        }
    }
}

impl Drop for ConsoleUi {
    fn drop(&mut self) {
        self.clear_progress();
    }
}

/// Silent UI implementation for testing and non-interactive use
#[derive(Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn set_phase(&mut self, _phase: Phase) {}
    fn set_progress(&mut self, _current: u64, _total: u64, _label: impl Into<String>) {}
    fn clear_progress(&mut self) {}
    fn log(&mut self, _message: impl Into<String>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Loading(PipelineKind::Weather).to_string(), "Loading weather records");
        assert_eq!(Phase::Aggregating(PipelineKind::Yield).to_string(), "Aggregating yield stats");
    }
}
