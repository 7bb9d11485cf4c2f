use std::time::Duration;

use bkm_core::{AgentId, BackupConfiguration, ConfigurationId, Progress, RawReport, ServiceError, SnapshotId};

/// Create and look up backup configurations.
pub trait ConfigStore {
    fn retrieve_configuration(&self, id: ConfigurationId) -> Result<BackupConfiguration, ServiceError>;

    /// Submit a new configuration. On `Ok(true)` the service has written its
    /// assigned id into `config.configuration_id`.
    fn create_configuration(&self, config: &mut BackupConfiguration) -> Result<bool, ServiceError>;
}

/// Start runs and observe them.
pub trait RunController {
    /// Raw snapshot id; `None` or -1 means the service did not start anything.
    fn start_run(&self, config_id: ConfigurationId) -> Result<Option<i64>, ServiceError>;
    fn fetch_progress(&self, snapshot_id: SnapshotId) -> Result<Progress, ServiceError>;
    fn fetch_report(&self, snapshot_id: SnapshotId) -> Result<RawReport, ServiceError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WakeRequest {
    pub agent_id: AgentId,
    pub timeout: Duration,
    pub keep_awake: bool,
}

pub trait AgentWaker {
    fn wake_agent(&self, request: &WakeRequest) -> Result<bool, ServiceError>;
}

/// Everything the orchestrator needs from the remote side.
pub trait BackupService: ConfigStore + RunController + AgentWaker {}

impl<T: ConfigStore + RunController + AgentWaker> BackupService for T {}

/// Time source and sleep primitive. `now` is measured from an arbitrary origin.
pub trait Clock {
    fn now(&self) -> Duration;
    fn sleep(&self, d: Duration);
}
