use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::SpecError;

pub const DEFAULT_START_RETRIES: u32 = 20;
pub const DEFAULT_REPORT_RETRIES: u32 = 5;
/// Pause after a start attempt that returned no usable snapshot id.
pub const DEFAULT_START_BACKOFF_SECS: u64 = 10;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60 * 60;
pub const DEFAULT_WAKE_TIMEOUT_SECS: u64 = 30;

/// Retry bounds and timings for one backup lifecycle.
///
/// Start attempts back off only after a soft failure (sentinel or missing id);
/// a transport error is retried at once. Report fetches never back off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecyclePolicy {
    pub start_retries: u32,
    pub start_backoff_secs: u64,
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
    pub report_retries: u32,
    pub wake_timeout_secs: u64,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            start_retries: DEFAULT_START_RETRIES,
            start_backoff_secs: DEFAULT_START_BACKOFF_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            report_retries: DEFAULT_REPORT_RETRIES,
            wake_timeout_secs: DEFAULT_WAKE_TIMEOUT_SECS,
        }
    }
}

impl LifecyclePolicy {
    /// A zero poll interval would never let the deadline pass on a manual
    /// clock and would poll the service without pause on a real one.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.poll_interval_secs == 0 {
            return Err(SpecError::ZeroPollInterval);
        }
        Ok(())
    }

    pub fn start_backoff(&self) -> Duration {
        Duration::from_secs(self.start_backoff_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn wake_timeout(&self) -> Duration {
        Duration::from_secs(self.wake_timeout_secs)
    }
}
