use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use bkm_core::{deserialize_flag, ConfigurationId, ConfigurationSpec, LifecyclePolicy, PathInput, Retention};

use crate::hooks::HookCommand;
use crate::util::expand_path;

pub const CONFIG_FILENAME: &str = "bkm.toml";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub backup: BackupConfig,
    #[serde(default)]
    pub lifecycle: LifecyclePolicy,
    #[serde(default)]
    pub state: StateConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Agent bootstrap JSON (AgentId, ApiHostName).
    pub bootstrap: String,
    /// Scripted service responses to run against instead of a live endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixture: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Empty means stderr.
    #[serde(default)]
    pub file: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file: String::new() }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackupConfig {
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
    /// Run after the agent is awake and before the backup starts.
    #[serde(default)]
    pub prescript: HookCommand,
    /// Run once the backup has finished.
    #[serde(default)]
    pub postscript: HookCommand,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StateConfig {
    /// Written back after the service creates a configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_id: Option<i64>,
}

impl BackupConfig {
    pub fn spec(&self) -> ConfigurationSpec {
        ConfigurationSpec {
            name: self.name.clone(),
            retention: self.retention,
            notify_email: self.notify_email.clone(),
            notify_success: self.notify_success,
            notify_failure: self.notify_failure,
            folders: self.folders.clone(),
            files: self.files.clone(),
        }
    }
}

impl Config {
    pub fn default_template() -> Self {
        Self {
            service: ServiceConfig {
                bootstrap: "/etc/driveclient/bootstrap.json".to_string(),
                fixture: None,
            },
            logging: LoggingConfig::default(),
            backup: BackupConfig {
                name: "bkm-managed".to_string(),
                retention: Retention::Days30,
                notify_email: String::new(),
                notify_success: false,
                notify_failure: true,
                folders: PathInput::Delimited("/etc".to_string()),
                files: PathInput::default(),
                prescript: HookCommand::default(),
                postscript: HookCommand::default(),
            },
            lifecycle: LifecyclePolicy::default(),
            state: StateConfig::default(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        cfg.validate().with_context(|| format!("validate {}", path.display()))?;
        Ok(cfg)
    }

    /// Checks serde cannot express: lifecycle timings and hook command syntax.
    pub fn validate(&self) -> Result<()> {
        self.lifecycle.validate().context("[lifecycle]")?;
        self.backup.prescript.argv().context("[backup] prescript")?;
        self.backup.postscript.argv().context("[backup] postscript")?;
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    /// Search order: /etc/bkm, ~/.bkm, current directory.
    pub fn candidate_paths() -> Vec<PathBuf> {
        vec![
            Path::new("/etc/bkm").join(CONFIG_FILENAME),
            expand_path("~/.bkm").join(CONFIG_FILENAME),
            PathBuf::from(CONFIG_FILENAME),
        ]
    }

    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(p) = explicit {
            return Ok(p.to_path_buf());
        }
        let candidates = Self::candidate_paths();
        candidates
            .iter()
            .find(|p| p.exists())
            .cloned()
            .ok_or_else(|| anyhow!("no config file found; looked in {:?} (run `bkm init`)", candidates))
    }

    pub fn bootstrap_path(&self) -> PathBuf {
        expand_path(&self.service.bootstrap)
    }

    pub fn fixture_path(&self) -> Option<PathBuf> {
        self.service.fixture.as_deref().filter(|s| !s.is_empty()).map(expand_path)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        let f = self.logging.file.trim();
        if f.is_empty() {
            None
        } else {
            Some(expand_path(f))
        }
    }

    pub fn configuration_id(&self) -> Option<ConfigurationId> {
        self.state.configuration_id.map(ConfigurationId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[service]
bootstrap = "/etc/driveclient/bootstrap.json"

[logging]
level = "debug"
file = ""

[backup]
name = "web01"
retention = "60"
notify_email = "ops@example.com"
notify_success = "True"
notify_failure = "1"
folders = "/etc /var/www"
files = ["/root/.my.cnf"]
prescript = ["/usr/local/bin/dump-db", "--all"]

[lifecycle]
poll_timeout_secs = 7200
"#;

    #[test]
    fn parses_loose_values() {
        let cfg: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.backup.retention, Retention::Days60);
        assert!(cfg.backup.notify_success);
        assert!(cfg.backup.notify_failure);
        assert_eq!(cfg.backup.spec().folders.normalize(), vec!["/etc", "/var/www"]);
        assert_eq!(cfg.backup.prescript.argv().unwrap(), vec!["/usr/local/bin/dump-db", "--all"]);
        assert!(cfg.backup.postscript.argv().unwrap().is_empty());
        assert_eq!(cfg.lifecycle.poll_timeout_secs, 7200);
        assert_eq!(cfg.lifecycle.start_retries, 20);
        assert_eq!(cfg.log_file(), None);
        assert_eq!(cfg.configuration_id(), None);
        assert_eq!(cfg.fixture_path(), None);
    }

    #[test]
    fn hook_accepts_a_command_line() {
        let line = SAMPLE.replace(
            r#"prescript = ["/usr/local/bin/dump-db", "--all"]"#,
            r#"prescript = "/usr/local/bin/dump-db --all"
postscript = "/usr/local/bin/notify 'backup done'""#,
        );
        let cfg: Config = toml::from_str(&line).unwrap();
        assert_eq!(cfg.backup.prescript, HookCommand::Line("/usr/local/bin/dump-db --all".into()));
        assert_eq!(cfg.backup.prescript.argv().unwrap(), vec!["/usr/local/bin/dump-db", "--all"]);
        assert_eq!(cfg.backup.postscript.argv().unwrap(), vec!["/usr/local/bin/notify", "backup done"]);
    }

    #[test]
    fn load_rejects_unbalanced_hook_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        let bad = SAMPLE.replace(
            r#"prescript = ["/usr/local/bin/dump-db", "--all"]"#,
            r#"prescript = "/usr/local/bin/dump-db 'all""#,
        );
        std::fs::write(&path, bad).unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("prescript"), "{err:#}");
    }

    #[test]
    fn load_rejects_zero_poll_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, SAMPLE.replace("poll_timeout_secs = 7200", "poll_interval_secs = 0")).unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("poll interval"), "{err:#}");
    }

    #[test]
    fn save_reports_unwritable_parent() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let err = Config::default_template().save_to(&blocker.join(CONFIG_FILENAME)).unwrap_err();
        assert!(err.to_string().starts_with("create "), "{err:#}");
    }

    #[test]
    fn rejects_unknown_retention() {
        let bad = SAMPLE.replace(r#"retention = "60""#, "retention = 14");
        assert!(toml::from_str::<Config>(&bad).is_err());
    }

    #[test]
    fn state_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILENAME);
        let mut cfg: Config = toml::from_str(SAMPLE).unwrap();
        cfg.state.configuration_id = Some(1234);
        cfg.save_to(&path).unwrap();

        let back = Config::load_from(&path).unwrap();
        assert_eq!(back.configuration_id(), Some(ConfigurationId(1234)));
        assert_eq!(back.backup.retention, Retention::Days60);
        assert_eq!(back.backup.folders, PathInput::Delimited("/etc /var/www".into()));
    }

    #[test]
    fn template_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        Config::default_template().save_to(&path).unwrap();
        let back = Config::load_from(&path).unwrap();
        assert_eq!(back.backup.name, "bkm-managed");
        assert_eq!(back.lifecycle, LifecyclePolicy::default());
    }

    #[test]
    fn explicit_path_wins() {
        let p = Path::new("/tmp/custom.toml");
        assert_eq!(Config::locate(Some(p)).unwrap(), p);
    }
}
