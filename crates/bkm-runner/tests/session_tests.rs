use std::path::{Path, PathBuf};

use bkm_core::{ConfigurationId, LifecyclePolicy};
use bkm_runner::{Config, Runner, CONFIG_FILENAME};
use bkm_service::ManualClock;
use tempfile::TempDir;

const FIXTURE: &str = r#"
start:
  - { kind: snapshot, id: 42 }
progress:
  - { kind: state, state: Completed }
report:
  - { kind: report, snapshot_id: 42, detail: { outcome: Completed, files_backed_up: 12 } }
"#;

struct Session {
    dir: TempDir,
    cfg_path: PathBuf,
}

fn session(configure: impl FnOnce(&mut Config, &Path)) -> Session {
    let dir = tempfile::tempdir().unwrap();
    let bootstrap = dir.path().join("bootstrap.json");
    std::fs::write(&bootstrap, r#"{"AgentId": 314, "ApiHostName": "api.example.com"}"#).unwrap();
    let fixture = dir.path().join("service.yaml");
    std::fs::write(&fixture, FIXTURE).unwrap();

    let mut cfg = Config::default_template();
    cfg.service.bootstrap = bootstrap.display().to_string();
    cfg.service.fixture = Some(fixture.display().to_string());
    cfg.lifecycle = LifecyclePolicy { poll_interval_secs: 5, ..LifecyclePolicy::default() };
    configure(&mut cfg, dir.path());

    let cfg_path = dir.path().join(CONFIG_FILENAME);
    cfg.save_to(&cfg_path).unwrap();
    Session { dir, cfg_path }
}

#[test]
fn created_configuration_id_is_written_back() {
    let s = session(|_, _| {});
    let mut runner = Runner::open(s.cfg_path.clone()).unwrap();
    let service = runner.service().unwrap();
    let clock = ManualClock::new();

    let outcome = runner.run_with(service, clock).unwrap();
    assert!(outcome.succeeded());
    assert!(outcome.created_configuration);
    assert_eq!(outcome.configuration_id, ConfigurationId(1000));
    assert_eq!(outcome.report.unwrap().detail.files_backed_up, 12);

    let saved = Config::load_from(&s.cfg_path).unwrap();
    assert_eq!(saved.configuration_id(), Some(ConfigurationId(1000)));
    assert_eq!(saved.backup.name, "bkm-managed");
}

#[test]
fn stale_configuration_id_is_replaced() {
    let s = session(|cfg, _| cfg.state.configuration_id = Some(77));
    let mut runner = Runner::open(s.cfg_path.clone()).unwrap();
    let service = runner.service().unwrap();

    let outcome = runner.run_with(service, ManualClock::new()).unwrap();
    assert!(outcome.created_configuration);

    let saved = Config::load_from(&s.cfg_path).unwrap();
    assert_eq!(saved.configuration_id(), Some(ConfigurationId(1000)));
}

#[test]
fn missing_fixture_is_reported() {
    let s = session(|cfg, _| cfg.service.fixture = None);
    let runner = Runner::open(s.cfg_path.clone()).unwrap();
    let err = runner.service().err().unwrap();
    assert!(err.to_string().contains("no backup service backend configured"));
}

#[test]
fn preview_uses_bootstrap_agent_and_stored_id() {
    let s = session(|cfg, _| cfg.state.configuration_id = Some(55));
    let runner = Runner::open(s.cfg_path.clone()).unwrap();
    let conf = runner.preview().unwrap();
    assert_eq!(conf.agent_id.get(), 314);
    assert_eq!(conf.configuration_id, ConfigurationId(55));
    assert_eq!(conf.paths_of(bkm_core::InclusionKind::Folder), vec!["/etc"]);
}

#[test]
fn init_does_not_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILENAME);
    assert!(Runner::init(&path).unwrap());
    std::fs::write(&path, "# edited\n").unwrap();
    assert!(!Runner::init(&path).unwrap());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited\n");
}

#[cfg(unix)]
#[test]
fn hooks_run_around_the_backup() {
    use std::os::unix::fs::PermissionsExt;

    let s = session(|cfg, dir| {
        let script = dir.join("hook.sh");
        std::fs::write(&script, "#!/bin/sh\necho \"$1\" >> \"$2\"\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let log = dir.join("hooks.log").display().to_string();
        let script = script.display().to_string();
        cfg.backup.prescript = vec![script.clone(), "pre".into(), log.clone()].into();
        cfg.backup.postscript = format!("{script} post '{log}'").as_str().into();
    });
    let mut runner = Runner::open(s.cfg_path.clone()).unwrap();
    let service = runner.service().unwrap();
    runner.run_with(service, ManualClock::new()).unwrap();

    let log = std::fs::read_to_string(s.dir.path().join("hooks.log")).unwrap();
    assert_eq!(log, "pre\npost\n");
}
