//! Progress reporting for long cube builds.
//!
//! Progress is observability only: indicators never influence the values
//! written to a cube.

use tracing::info;

/// Receiver of progress updates.
pub trait ProgressIndicator {
    /// Reports `progress` completed units out of `total`.
    fn update_progress(&mut self, progress: usize, total: usize, detail: &str);

    /// Clears state between runs.
    fn reset(&mut self) {}
}

/// Fans progress out to every registered indicator.
#[derive(Default)]
pub struct ProgressReporter {
    indicators: Vec<Box<dyn ProgressIndicator>>,
}

impl ProgressReporter {
    /// Creates a reporter with no indicators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an indicator.
    pub fn register(&mut self, indicator: Box<dyn ProgressIndicator>) {
        self.indicators.push(indicator);
    }

    /// Number of registered indicators.
    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    /// Whether no indicator is registered.
    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    /// Forwards an update to every indicator.
    pub fn update_progress(&mut self, progress: usize, total: usize, detail: &str) {
        for indicator in &mut self.indicators {
            indicator.update_progress(progress, total, detail);
        }
    }

    /// Resets every indicator.
    pub fn reset(&mut self) {
        for indicator in &mut self.indicators {
            indicator.reset();
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("indicators", &self.indicators.len())
            .finish()
    }
}

/// Logs at most `max_messages` evenly spaced progress lines.
#[derive(Clone, Debug)]
pub struct ProgressLog {
    name: String,
    max_messages: usize,
    messages: usize,
}

impl ProgressLog {
    /// Creates a log for the named task.
    pub fn new(name: impl Into<String>, max_messages: usize) -> Self {
        Self {
            name: name.into(),
            max_messages,
            messages: 0,
        }
    }

    /// Messages emitted so far.
    pub fn messages(&self) -> usize {
        self.messages
    }
}

impl ProgressIndicator for ProgressLog {
    fn update_progress(&mut self, progress: usize, total: usize, _detail: &str) {
        if total == 0 || self.messages >= self.max_messages {
            return;
        }
        // At most one line per update; the last threshold equals total.
        let next = ((self.messages + 1) * total).div_ceil(self.max_messages);
        if progress >= next {
            info!(
                "{} progress {}/{} ({:.0}%)",
                self.name,
                progress,
                total,
                100.0 * progress as f64 / total as f64
            );
            self.messages += 1;
        }
    }

    fn reset(&mut self) {
        self.messages = 0;
    }
}
