use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use bkm_core::{BackupConfiguration, LifecycleOutcome};
use bkm_engine::{ConfigSource, Orchestrator};
use bkm_service::{BackupService, Clock, ScriptedService, ServiceScript, SystemClock};
use tracing::info;

use crate::{Bootstrap, Config, SessionHooks};

/// One configured backup session: config file, agent identity, backend.
pub struct Runner {
    pub cfg_path: PathBuf,
    pub cfg: Config,
    pub bootstrap: Bootstrap,
}

impl Runner {
    pub fn open(cfg_path: PathBuf) -> Result<Self> {
        let cfg = Config::load_from(&cfg_path)?;
        let bootstrap = Bootstrap::load(&cfg.bootstrap_path())?;
        info!(
            agent_id = bootstrap.agent_id,
            api_host = %bootstrap.api_host_name,
            config = %cfg_path.display(),
            "session opened"
        );
        Ok(Self { cfg_path, cfg, bootstrap })
    }

    /// Write the default config unless one exists. Returns whether a file was written.
    pub fn init(cfg_path: &Path) -> Result<bool> {
        if cfg_path.exists() {
            return Ok(false);
        }
        Config::default_template().save_to(cfg_path)?;
        Ok(true)
    }

    /// The configuration this session would submit, validated and normalized.
    pub fn preview(&self) -> Result<BackupConfiguration> {
        let spec = self.cfg.backup.spec();
        spec.validate().context("invalid [backup] section")?;
        let mut conf = BackupConfiguration::from_spec(&spec, self.bootstrap.agent());
        if let Some(id) = self.cfg.configuration_id() {
            conf.configuration_id = id;
        }
        Ok(conf)
    }

    /// Backend configured for this session.
    pub fn service(&self) -> Result<ScriptedService> {
        let path = self
            .cfg
            .fixture_path()
            .ok_or_else(|| anyhow!("no backup service backend configured (set service.fixture)"))?;
        let s = std::fs::read_to_string(&path).with_context(|| format!("read fixture {}", path.display()))?;
        let script: ServiceScript =
            serde_yaml::from_str(&s).with_context(|| format!("parse fixture {}", path.display()))?;
        Ok(ScriptedService::from_script(script))
    }

    pub fn run(&mut self) -> Result<LifecycleOutcome> {
        let service = self.service()?;
        self.run_with(service, SystemClock::new())
    }

    /// Full lifecycle against `service`, persisting a newly created
    /// configuration id and running the configured hooks.
    pub fn run_with<S: BackupService, C: Clock>(&mut self, service: S, clock: C) -> Result<LifecycleOutcome> {
        let source = ConfigSource {
            existing_id: self.cfg.configuration_id(),
            spec: self.cfg.backup.spec(),
        };
        let policy = self.cfg.lifecycle.clone();
        let mut orchestrator = Orchestrator::new(service, clock, self.bootstrap.agent(), policy);
        let mut hooks = SessionHooks::new(&mut self.cfg, self.cfg_path.clone());
        let outcome = orchestrator.run_lifecycle(&source, &mut hooks)?;
        Ok(outcome)
    }
}
