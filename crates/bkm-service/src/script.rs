use serde::{Deserialize, Serialize};

use bkm_core::{ReportDetail, ServiceError};

/// Canned responses for a [`crate::ScriptedService`], loadable from YAML.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceScript {
    /// Configuration ids the service already knows about.
    pub existing_configurations: Vec<i64>,
    /// Id handed to the next created configuration (incremented afterwards).
    pub next_configuration_id: Option<i64>,
    pub create: CreateStep,
    pub wake: WakeStep,
    pub start: Vec<StartStep>,
    /// The last step repeats once the list is used up.
    pub progress: Vec<ProgressStep>,
    pub report: Vec<ReportStep>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CreateStep {
    #[default]
    Accept,
    Reject,
    Error { error: ScriptedError },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WakeStep {
    #[default]
    Awake,
    Asleep,
    Error { error: ScriptedError },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StartStep {
    Snapshot { id: i64 },
    Missing,
    Error { error: ScriptedError },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressStep {
    State { state: String },
    Error { error: ScriptedError },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportStep {
    Report {
        snapshot_id: i64,
        #[serde(default)]
        detail: ReportDetail,
    },
    Error { error: ScriptedError },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", content = "message", rename_all = "snake_case")]
pub enum ScriptedError {
    NotFound(String),
    Transient(String),
    Fatal(String),
}

impl From<&ScriptedError> for ServiceError {
    fn from(e: &ScriptedError) -> Self {
        match e {
            ScriptedError::NotFound(m) => ServiceError::NotFound(m.clone()),
            ScriptedError::Transient(m) => ServiceError::Transient(m.clone()),
            ScriptedError::Fatal(m) => ServiceError::Fatal(m.clone()),
        }
    }
}

impl StartStep {
    pub fn transient(msg: &str) -> Self {
        StartStep::Error { error: ScriptedError::Transient(msg.to_string()) }
    }
}

impl ProgressStep {
    pub fn state(s: &str) -> Self {
        ProgressStep::State { state: s.to_string() }
    }
}

impl ReportStep {
    pub fn report(snapshot_id: i64) -> Self {
        ReportStep::Report { snapshot_id, detail: ReportDetail::default() }
    }

    pub fn transient(msg: &str) -> Self {
        ReportStep::Error { error: ScriptedError::Transient(msg.to_string()) }
    }
}
