//! Fixed-interval wait for a file the host application writes.

use std::path::Path;
use std::time::Duration;

use mockup_core::config::PollingConfig;
use mockup_core::PollOutcome;

/// Sleep one `interval`, then check for `path`; up to `max_attempts` times.
///
/// No backoff. The first check happens one interval after the call.
pub async fn await_artifact(path: &Path, max_attempts: u32, interval: Duration) -> PollOutcome {
    for attempt in 1..=max_attempts {
        tokio::time::sleep(interval).await;
        if path.try_exists().unwrap_or(false) {
            tracing::debug!(path = %path.display(), attempt, "artifact found");
            return PollOutcome::Found(path.to_path_buf());
        }
        tracing::trace!(path = %path.display(), attempt, max_attempts, "artifact not yet present");
    }
    PollOutcome::TimedOut
}

/// Poll budget taken from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultPoller {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl ResultPoller {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(config.max_attempts, config.interval())
    }

    /// Longest time a poll can take before giving up.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }

    pub async fn wait_for(&self, path: &Path) -> PollOutcome {
        await_artifact(path, self.max_attempts, self.interval).await
    }
}
