//! Poll Policy
//!
//! Deadline, cadence and progress observer for a single wait or monitor run.

use crate::types::PollOutcome;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Total wall-clock budget for one wait (90s)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(90_000);

/// Delay between polls (3s)
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(3_000);

/// Floor for the delay between polls; a zero interval would spin on the source
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Progress observer, invoked after every poll attempt in issue order
pub type ProgressFn = Arc<dyn Fn(&PollOutcome) + Send + Sync>;

#[derive(Clone)]
pub struct PollPolicy {
    pub timeout: Duration,
    pub interval: Duration,
    pub on_progress: Option<ProgressFn>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            on_progress: None,
        }
    }
}

impl PollPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval: interval.max(MIN_INTERVAL),
            on_progress: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    pub fn with_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(&PollOutcome) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(f));
        self
    }

    pub(crate) fn notify(&self, outcome: &PollOutcome) {
        if let Some(f) = &self.on_progress {
            f(outcome);
        }
    }
}

impl fmt::Debug for PollPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollPolicy")
            .field("timeout", &self.timeout)
            .field("interval", &self.interval)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}
