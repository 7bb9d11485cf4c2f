use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SpecError;

/// How long the service keeps old file versions. Only these three values are accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RetentionValue", into = "u32")]
pub enum Retention {
    Indefinite,
    Days30,
    Days60,
}

impl Retention {
    pub fn days(self) -> u32 {
        match self {
            Retention::Indefinite => 0,
            Retention::Days30 => 30,
            Retention::Days60 => 60,
        }
    }
}

impl TryFrom<u32> for Retention {
    type Error = SpecError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            0 => Ok(Retention::Indefinite),
            30 => Ok(Retention::Days30),
            60 => Ok(Retention::Days60),
            other => Err(SpecError::InvalidRetention(other.to_string())),
        }
    }
}

impl From<Retention> for u32 {
    fn from(r: Retention) -> u32 {
        r.days()
    }
}

/// Config files carry retention either as a number or as a numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum RetentionValue {
    Days(u32),
    Text(String),
}

impl TryFrom<RetentionValue> for Retention {
    type Error = SpecError;

    fn try_from(v: RetentionValue) -> Result<Self, Self::Error> {
        match v {
            RetentionValue::Days(d) => Retention::try_from(d),
            RetentionValue::Text(s) => {
                let days: u32 = s
                    .trim()
                    .parse()
                    .map_err(|_| SpecError::InvalidRetention(s.clone()))?;
                Retention::try_from(days)
            }
        }
    }
}

/// What the service does when a scheduled backup is missed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissedBackupAction {
    #[default]
    RunWhenOnline,
}

/// Runs are always triggered by the orchestrator, never by the service schedule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    #[default]
    Manually,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InclusionKind {
    Folder,
    File,
}

/// Lifecycle state of a snapshot run as reported by the service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunState {
    Queued,
    InProgress,
    Preparing,
    StartRequested,
    StartScheduled,
    StopRequested,
    Completed,
    CompletedWithErrors,
    Skipped,
    Missed,
    Stopped,
    Failed,
    /// Anything the service sends that we do not recognize.
    Other(String),
}

/// Coarse classification driving the poll loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateClass {
    Pending,
    Succeeded,
    Failed,
}

impl RunState {
    pub fn parse(s: &str) -> RunState {
        match s.trim() {
            "Queued" => RunState::Queued,
            "InProgress" => RunState::InProgress,
            "Preparing" => RunState::Preparing,
            "StartRequested" => RunState::StartRequested,
            "StartScheduled" => RunState::StartScheduled,
            "StopRequested" => RunState::StopRequested,
            "Completed" => RunState::Completed,
            "CompletedWithErrors" => RunState::CompletedWithErrors,
            "Skipped" => RunState::Skipped,
            "Missed" => RunState::Missed,
            "Stopped" => RunState::Stopped,
            "Failed" => RunState::Failed,
            other => RunState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RunState::Queued => "Queued",
            RunState::InProgress => "InProgress",
            RunState::Preparing => "Preparing",
            RunState::StartRequested => "StartRequested",
            RunState::StartScheduled => "StartScheduled",
            RunState::StopRequested => "StopRequested",
            RunState::Completed => "Completed",
            RunState::CompletedWithErrors => "CompletedWithErrors",
            RunState::Skipped => "Skipped",
            RunState::Missed => "Missed",
            RunState::Stopped => "Stopped",
            RunState::Failed => "Failed",
            RunState::Other(s) => s,
        }
    }

    /// Unrecognized states keep the poller waiting.
    pub fn class(&self) -> StateClass {
        match self {
            RunState::Completed | RunState::CompletedWithErrors => StateClass::Succeeded,
            RunState::Skipped | RunState::Missed | RunState::Stopped | RunState::Failed => StateClass::Failed,
            RunState::Queued
            | RunState::InProgress
            | RunState::Preparing
            | RunState::StartRequested
            | RunState::StartScheduled
            | RunState::StopRequested
            | RunState::Other(_) => StateClass::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.class() != StateClass::Pending
    }
}

impl From<String> for RunState {
    fn from(s: String) -> Self {
        RunState::parse(&s)
    }
}

impl From<RunState> for String {
    fn from(s: RunState) -> String {
        s.as_str().to_string()
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
