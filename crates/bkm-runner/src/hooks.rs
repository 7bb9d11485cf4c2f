use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use bkm_core::{ConfigurationId, LifecycleOutcome};
use bkm_engine::LifecycleHooks;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::util::is_executable;
use crate::Config;

/// Hook command as written in config: an argv list, or one command line
/// split with POSIX shell quoting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HookCommand {
    Argv(Vec<String>),
    Line(String),
}

impl Default for HookCommand {
    fn default() -> Self {
        HookCommand::Argv(Vec::new())
    }
}

impl HookCommand {
    /// Unbalanced quotes in a command line are an error.
    pub fn argv(&self) -> Result<Vec<String>> {
        match self {
            HookCommand::Argv(argv) => Ok(argv.clone()),
            HookCommand::Line(line) => {
                shlex::split(line).ok_or_else(|| anyhow!("cannot split hook command {line:?}: unbalanced quotes"))
            }
        }
    }
}

impl From<&str> for HookCommand {
    fn from(line: &str) -> Self {
        HookCommand::Line(line.to_string())
    }
}

impl From<Vec<String>> for HookCommand {
    fn from(argv: Vec<String>) -> Self {
        HookCommand::Argv(argv)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HookStatus {
    /// argv empty, or argv[0] is not an executable file.
    Skipped,
    /// `None` when the process was killed by a signal.
    Exited(Option<i32>),
}

/// Run a user hook. Only a failure to spawn it is an error; its exit code is just reported.
pub fn run_hook(name: &str, argv: &[String]) -> Result<HookStatus> {
    let Some(program) = argv.first() else {
        debug!(hook = name, "no hook configured");
        return Ok(HookStatus::Skipped);
    };
    if !is_executable(Path::new(program)) {
        debug!(hook = name, program = %program, "hook is not an executable file; skipping");
        return Ok(HookStatus::Skipped);
    }

    info!(hook = name, argv = ?argv, "running hook");
    let status = Command::new(program)
        .args(&argv[1..])
        .status()
        .with_context(|| format!("run {name} {:?}", argv))?;
    info!(hook = name, code = ?status.code(), "hook complete");
    Ok(HookStatus::Exited(status.code()))
}

/// Lifecycle hooks of a configured session: persist the resolved
/// configuration id and run the pre/post scripts.
pub struct SessionHooks<'a> {
    cfg: &'a mut Config,
    cfg_path: PathBuf,
}

impl<'a> SessionHooks<'a> {
    pub fn new(cfg: &'a mut Config, cfg_path: impl Into<PathBuf>) -> Self {
        Self { cfg, cfg_path: cfg_path.into() }
    }
}

impl LifecycleHooks for SessionHooks<'_> {
    fn configuration_resolved(&mut self, id: ConfigurationId, created: bool) -> Result<()> {
        if self.cfg.configuration_id() == Some(id) {
            return Ok(());
        }
        self.cfg.state.configuration_id = Some(id.get());
        self.cfg
            .save_to(&self.cfg_path)
            .with_context(|| format!("persist configuration id {id}"))?;
        info!(configuration_id = %id, created, path = %self.cfg_path.display(), "saved configuration id");
        Ok(())
    }

    fn before_start(&mut self, _id: ConfigurationId) -> Result<()> {
        let argv = self.cfg.backup.prescript.argv()?;
        run_hook("prescript", &argv)?;
        Ok(())
    }

    fn after_run(&mut self, _outcome: &LifecycleOutcome) {
        let result = self
            .cfg
            .backup
            .postscript
            .argv()
            .and_then(|argv| run_hook("postscript", &argv));
        if let Err(e) = result {
            error!(error = %format!("{e:#}"), "postscript failed to run");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_is_split_like_a_shell() {
        let cmd = HookCommand::from(r#"/usr/local/bin/dump-db --all --label "nightly run""#);
        assert_eq!(cmd.argv().unwrap(), vec!["/usr/local/bin/dump-db", "--all", "--label", "nightly run"]);
        assert!(HookCommand::from("").argv().unwrap().is_empty());
    }

    #[test]
    fn argv_list_is_kept_verbatim() {
        let cmd = HookCommand::from(vec!["/opt/hook".to_string(), "two words".to_string()]);
        assert_eq!(cmd.argv().unwrap(), vec!["/opt/hook", "two words"]);
        assert!(HookCommand::default().argv().unwrap().is_empty());
    }

    #[test]
    fn unbalanced_quotes_are_an_error() {
        let err = HookCommand::from(r#"/opt/hook "unterminated"#).argv().unwrap_err();
        assert!(err.to_string().contains("unbalanced quotes"));
    }

    #[test]
    fn empty_argv_is_skipped() {
        assert_eq!(run_hook("prescript", &[]).unwrap(), HookStatus::Skipped);
    }

    #[test]
    fn missing_program_is_skipped() {
        let argv = vec!["/no/such/hook".to_string(), "--flag".to_string()];
        assert_eq!(run_hook("prescript", &argv).unwrap(), HookStatus::Skipped);
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("hook.sh");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        let argv = vec![script.display().to_string()];
        assert_eq!(run_hook("postscript", &argv).unwrap(), HookStatus::Skipped);
    }

    #[cfg(unix)]
    #[test]
    fn executable_hook_reports_exit_code() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("hook.sh");
        std::fs::write(&script, "#!/bin/sh\nexit 3\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let argv = vec![script.display().to_string()];
        assert_eq!(run_hook("prescript", &argv).unwrap(), HookStatus::Exited(Some(3)));
    }
}
