use serde::{Deserialize, Serialize};

use crate::{deserialize_flag, ids::*, model::*, PathInput, SpecError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipients: String,
    pub on_success: bool,
    pub on_failure: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inclusion {
    pub path: String,
    pub kind: InclusionKind,
}

/// User-facing description of a backup job, before the service has seen it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationSpec {
    pub name: String,
    pub retention: Retention,
    #[serde(default)]
    pub notify_email: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub notify_success: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub notify_failure: bool,
    #[serde(default)]
    pub folders: PathInput,
    #[serde(default)]
    pub files: PathInput,
}

impl ConfigurationSpec {
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.name.trim().is_empty() {
            return Err(SpecError::EmptyName);
        }
        Ok(())
    }
}

/// A backup job template as held by the service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupConfiguration {
    pub configuration_id: ConfigurationId,
    pub name: String,
    pub agent_id: AgentId,
    pub retention: Retention,
    pub missed_backup_action: MissedBackupAction,
    pub frequency: Frequency,
    pub notification: Notification,
    pub inclusions: Vec<Inclusion>,
}

impl BackupConfiguration {
    /// Build a new, not yet submitted configuration owned by `agent_id`.
    pub fn from_spec(spec: &ConfigurationSpec, agent_id: AgentId) -> Self {
        let mut conf = Self {
            configuration_id: ConfigurationId::UNASSIGNED,
            name: spec.name.clone(),
            agent_id,
            retention: spec.retention,
            missed_backup_action: MissedBackupAction::default(),
            frequency: Frequency::Manually,
            notification: Notification {
                recipients: spec.notify_email.clone(),
                on_success: spec.notify_success,
                on_failure: spec.notify_failure,
            },
            inclusions: vec![],
        };

        let folders = spec.folders.normalize();
        if !folders.is_empty() {
            conf.add_folders(&folders);
        }
        let files = spec.files.normalize();
        if !files.is_empty() {
            conf.add_files(&files);
        }
        conf
    }

    pub fn add_folders(&mut self, paths: &[String]) {
        self.add(paths, InclusionKind::Folder);
    }

    pub fn add_files(&mut self, paths: &[String]) {
        self.add(paths, InclusionKind::File);
    }

    fn add(&mut self, paths: &[String], kind: InclusionKind) {
        self.inclusions
            .extend(paths.iter().map(|p| Inclusion { path: p.clone(), kind }));
    }

    pub fn paths_of(&self, kind: InclusionKind) -> Vec<&str> {
        self.inclusions
            .iter()
            .filter(|i| i.kind == kind)
            .map(|i| i.path.as_str())
            .collect()
    }
}

/// The live or most recent backup execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotRun {
    pub snapshot_id: SnapshotId,
    pub state: RunState,
    pub configuration_id: ConfigurationId,
}

/// One progress observation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub run_id: i64,
    pub configuration_id: ConfigurationId,
    pub state: RunState,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDetail {
    #[serde(default)]
    pub outcome: String,
    #[serde(default)]
    pub files_backed_up: u64,
    #[serde(default)]
    pub bytes_backed_up: u64,
    #[serde(default)]
    pub error_count: u32,
    #[serde(default)]
    pub diagnostics: Option<String>,
}

/// Report as returned by the service; may carry the -1 sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReport {
    pub snapshot_id: i64,
    pub configuration_id: i64,
    #[serde(default)]
    pub detail: ReportDetail,
}

/// Structurally valid final report of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupReport {
    pub snapshot_id: SnapshotId,
    pub configuration_id: ConfigurationId,
    pub detail: ReportDetail,
}

impl RawReport {
    pub fn validate(self) -> Option<BackupReport> {
        let snapshot_id = SnapshotId::from_raw(Some(self.snapshot_id))?;
        Some(BackupReport {
            snapshot_id,
            configuration_id: ConfigurationId(self.configuration_id),
            detail: self.detail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(folders: PathInput, files: PathInput) -> ConfigurationSpec {
        ConfigurationSpec {
            name: "nightly".into(),
            retention: Retention::Days30,
            notify_email: "ops@example.com".into(),
            notify_success: false,
            notify_failure: true,
            folders,
            files,
        }
    }

    #[test]
    fn from_spec_fills_derived_defaults() {
        let conf = BackupConfiguration::from_spec(&spec("/etc /srv".into(), PathInput::default()), AgentId(7));
        assert_eq!(conf.configuration_id, ConfigurationId::UNASSIGNED);
        assert_eq!(conf.agent_id, AgentId(7));
        assert_eq!(conf.frequency, Frequency::Manually);
        assert_eq!(conf.missed_backup_action, MissedBackupAction::RunWhenOnline);
        assert_eq!(conf.paths_of(InclusionKind::Folder), vec!["/etc", "/srv"]);
        assert!(conf.paths_of(InclusionKind::File).is_empty());
        assert!(conf.notification.on_failure);
    }

    #[test]
    fn zero_paths_is_a_valid_configuration() {
        let conf = BackupConfiguration::from_spec(&spec("".into(), PathInput::List(vec![])), AgentId(1));
        assert!(conf.inclusions.is_empty());
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut s = spec(PathInput::default(), PathInput::default());
        s.name = "  ".into();
        assert_eq!(s.validate(), Err(SpecError::EmptyName));
    }

    #[test]
    fn sentinel_report_is_invalid() {
        let raw = RawReport { snapshot_id: -1, configuration_id: 3, detail: ReportDetail::default() };
        assert!(raw.validate().is_none());
        let raw = RawReport { snapshot_id: 9, configuration_id: 3, detail: ReportDetail::default() };
        let report = raw.validate().unwrap();
        assert_eq!(report.snapshot_id, SnapshotId(9));
        assert_eq!(report.configuration_id, ConfigurationId(3));
    }
}
