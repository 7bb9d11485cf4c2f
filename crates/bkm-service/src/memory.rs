use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use bkm_core::{
    AgentId, BackupConfiguration, ConfigurationId, ConfigurationSpec, PathInput, Progress, RawReport, Retention,
    RunState, ServiceError, SnapshotId,
};
use tracing::debug;

use crate::script::*;
use crate::traits::{AgentWaker, ConfigStore, RunController, WakeRequest};

const DEFAULT_FIRST_CONFIGURATION_ID: i64 = 1000;

/// In-memory backup service replaying a [`ServiceScript`].
/// Used by tests and by fixture runs; records every call it receives.
#[derive(Default)]
pub struct ScriptedService {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    configurations: HashMap<i64, BackupConfiguration>,
    next_configuration_id: i64,
    create: CreateStep,
    wake: WakeStep,
    start: VecDeque<StartStep>,
    progress: VecDeque<ProgressStep>,
    report: VecDeque<ReportStep>,
    calls: CallLog,
}

/// Calls observed by a [`ScriptedService`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallLog {
    pub retrieve: Vec<ConfigurationId>,
    pub created: Vec<BackupConfiguration>,
    pub wake: Vec<WakeRequest>,
    pub start: Vec<ConfigurationId>,
    pub progress: Vec<SnapshotId>,
    pub report: Vec<SnapshotId>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::from_script(ServiceScript::default())
    }

    pub fn from_script(script: ServiceScript) -> Self {
        let configurations = script
            .existing_configurations
            .iter()
            .map(|&id| (id, placeholder_configuration(id)))
            .collect();
        Self {
            inner: Mutex::new(Inner {
                configurations,
                next_configuration_id: script.next_configuration_id.unwrap_or(DEFAULT_FIRST_CONFIGURATION_ID),
                create: script.create,
                wake: script.wake,
                start: script.start.into(),
                progress: script.progress.into(),
                report: script.report.into(),
                calls: CallLog::default(),
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_start(self, steps: impl IntoIterator<Item = StartStep>) -> Self {
        self.inner().start.extend(steps);
        self
    }

    pub fn with_progress(self, steps: impl IntoIterator<Item = ProgressStep>) -> Self {
        self.inner().progress.extend(steps);
        self
    }

    pub fn with_report(self, steps: impl IntoIterator<Item = ReportStep>) -> Self {
        self.inner().report.extend(steps);
        self
    }

    pub fn with_create(self, step: CreateStep) -> Self {
        self.inner().create = step;
        self
    }

    pub fn with_wake(self, step: WakeStep) -> Self {
        self.inner().wake = step;
        self
    }

    pub fn calls(&self) -> CallLog {
        self.inner().calls.clone()
    }
}

/// Stand-in for a configuration created outside this session.
fn placeholder_configuration(id: i64) -> BackupConfiguration {
    let spec = ConfigurationSpec {
        name: format!("configuration-{id}"),
        retention: Retention::Days30,
        notify_email: String::new(),
        notify_success: false,
        notify_failure: false,
        folders: PathInput::default(),
        files: PathInput::default(),
    };
    let mut conf = BackupConfiguration::from_spec(&spec, AgentId(0));
    conf.configuration_id = ConfigurationId(id);
    conf
}

impl ConfigStore for ScriptedService {
    fn retrieve_configuration(&self, id: ConfigurationId) -> Result<BackupConfiguration, ServiceError> {
        let mut inner = self.inner();
        inner.calls.retrieve.push(id);
        inner
            .configurations
            .get(&id.get())
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("configuration {id}")))
    }

    fn create_configuration(&self, config: &mut BackupConfiguration) -> Result<bool, ServiceError> {
        let mut inner = self.inner();
        inner.calls.created.push(config.clone());
        match inner.create.clone() {
            CreateStep::Accept => {
                let id = inner.next_configuration_id;
                inner.next_configuration_id += 1;
                config.configuration_id = ConfigurationId(id);
                inner.configurations.insert(id, config.clone());
                debug!(configuration_id = id, "scripted service created configuration");
                Ok(true)
            }
            CreateStep::Reject => Ok(false),
            CreateStep::Error { error } => Err((&error).into()),
        }
    }
}

impl RunController for ScriptedService {
    fn start_run(&self, config_id: ConfigurationId) -> Result<Option<i64>, ServiceError> {
        let mut inner = self.inner();
        inner.calls.start.push(config_id);
        match inner.start.pop_front() {
            Some(StartStep::Snapshot { id }) => Ok(Some(id)),
            Some(StartStep::Missing) => Ok(None),
            Some(StartStep::Error { error }) => Err((&error).into()),
            None => Err(ServiceError::Transient("no scripted start response".into())),
        }
    }

    fn fetch_progress(&self, snapshot_id: SnapshotId) -> Result<Progress, ServiceError> {
        let mut inner = self.inner();
        inner.calls.progress.push(snapshot_id);
        let step = if inner.progress.len() > 1 {
            inner.progress.pop_front()
        } else {
            inner.progress.front().cloned()
        };
        let configuration_id = inner.calls.start.last().copied().unwrap_or(ConfigurationId::UNASSIGNED);
        match step {
            Some(ProgressStep::State { state }) => Ok(Progress {
                run_id: snapshot_id.get(),
                configuration_id,
                state: RunState::parse(&state),
            }),
            Some(ProgressStep::Error { error }) => Err((&error).into()),
            None => Err(ServiceError::Transient("no scripted progress".into())),
        }
    }

    fn fetch_report(&self, snapshot_id: SnapshotId) -> Result<RawReport, ServiceError> {
        let mut inner = self.inner();
        inner.calls.report.push(snapshot_id);
        let configuration_id = inner.calls.start.last().map(|c| c.get()).unwrap_or(0);
        match inner.report.pop_front() {
            Some(ReportStep::Report { snapshot_id, detail }) => Ok(RawReport { snapshot_id, configuration_id, detail }),
            Some(ReportStep::Error { error }) => Err((&error).into()),
            None => Err(ServiceError::Transient("no scripted report".into())),
        }
    }
}

impl AgentWaker for ScriptedService {
    fn wake_agent(&self, request: &WakeRequest) -> Result<bool, ServiceError> {
        let mut inner = self.inner();
        inner.calls.wake.push(request.clone());
        match inner.wake.clone() {
            WakeStep::Awake => Ok(true),
            WakeStep::Asleep => Ok(false),
            WakeStep::Error { error } => Err((&error).into()),
        }
    }
}
