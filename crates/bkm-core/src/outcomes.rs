use serde::Serialize;

use crate::{ids::*, BackupReport, RunState};

/// Why a watched run is considered failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureCause {
    /// The service reported a terminal failure state.
    Remote { state: RunState },
    /// The deadline passed without a terminal state.
    TimedOut { checks: u32 },
    /// The service refused to report progress for this snapshot.
    Service { message: String },
}

/// Result of watching a run. Timeouts are failures like any other.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PollOutcome {
    Succeeded { state: RunState, checks: u32 },
    Failed { cause: FailureCause },
}

impl PollOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PollOutcome::Succeeded { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LifecycleOutcome {
    pub configuration_id: ConfigurationId,
    pub created_configuration: bool,
    pub snapshot_id: SnapshotId,
    pub poll: PollOutcome,
    pub report: Option<BackupReport>,
}

impl LifecycleOutcome {
    pub fn succeeded(&self) -> bool {
        self.poll.is_success()
    }
}
