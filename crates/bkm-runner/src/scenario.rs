use std::path::Path;

use anyhow::{anyhow, Context, Result};
use bkm_core::{AgentId, ConfigurationId, ConfigurationSpec, LifecycleOutcome, LifecyclePolicy};
use bkm_engine::{ConfigSource, NoHooks, Orchestrator};
use bkm_service::{Clock, ManualClock, ScriptedService, ServiceScript};
use serde::{Deserialize, Serialize};

/// Input of a fixture scenario (`scenario.yaml`).
#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub agent_id: i64,
    #[serde(default)]
    pub configuration_id: Option<i64>,
    pub backup: ConfigurationSpec,
    #[serde(default)]
    pub lifecycle: LifecyclePolicy,
    #[serde(default)]
    pub service: ServiceScript,
}

/// Expected result of a fixture scenario (`expected.yaml`). Omitted fields are not checked.
#[derive(Debug, Deserialize)]
pub struct ScenarioExpected {
    pub scenario_id: String,
    pub result: ExpectedResult,
    #[serde(default)]
    pub configuration_id: Option<i64>,
    #[serde(default)]
    pub created_configuration: Option<bool>,
    #[serde(default)]
    pub snapshot_id: Option<i64>,
    #[serde(default)]
    pub report: Option<bool>,
    #[serde(default)]
    pub start_calls: Option<usize>,
    #[serde(default)]
    pub progress_calls: Option<usize>,
    #[serde(default)]
    pub report_calls: Option<usize>,
    #[serde(default)]
    pub elapsed_secs: Option<u64>,
    #[serde(default)]
    pub error_contains: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedResult {
    Succeeded,
    Failed,
    Error,
}

#[derive(Debug, Serialize)]
pub struct ScenarioResult {
    pub outcome: Option<LifecycleOutcome>,
    pub error: Option<String>,
    pub created_configurations: usize,
    pub wake_calls: usize,
    pub start_calls: usize,
    pub progress_calls: usize,
    pub report_calls: usize,
    pub elapsed_secs: u64,
}

impl ScenarioResult {
    pub fn result(&self) -> ExpectedResult {
        match &self.outcome {
            Some(o) if o.succeeded() => ExpectedResult::Succeeded,
            Some(_) => ExpectedResult::Failed,
            None => ExpectedResult::Error,
        }
    }
}

pub fn load_scenario(dir: &Path) -> Result<Scenario> {
    let p = dir.join("scenario.yaml");
    let s = std::fs::read_to_string(&p).with_context(|| format!("read scenario.yaml: {}", p.display()))?;
    let sc: Scenario = serde_yaml::from_str(&s).with_context(|| format!("parse {}", p.display()))?;
    sc.lifecycle.validate().with_context(|| format!("{}: [lifecycle]", p.display()))?;
    Ok(sc)
}

pub fn load_expected(dir: &Path) -> Result<ScenarioExpected> {
    let p = dir.join("expected.yaml");
    let s = std::fs::read_to_string(&p).with_context(|| format!("read expected.yaml: {}", p.display()))?;
    let exp: ScenarioExpected = serde_yaml::from_str(&s).with_context(|| "parse expected.yaml")?;
    Ok(exp)
}

/// Fixture-mode simulation: the scripted service plays the remote side and a
/// manual clock absorbs every sleep. Hooks are not run and nothing is persisted.
pub fn simulate(dir: &Path) -> Result<ScenarioResult> {
    let sc = load_scenario(dir)?;
    let service = ScriptedService::from_script(sc.service);
    let mut orchestrator = Orchestrator::new(service, ManualClock::new(), AgentId(sc.agent_id), sc.lifecycle);
    let source = ConfigSource {
        existing_id: sc.configuration_id.map(ConfigurationId),
        spec: sc.backup,
    };

    let (outcome, error) = match orchestrator.run_lifecycle(&source, &mut NoHooks) {
        Ok(o) => (Some(o), None),
        Err(e) => (None, Some(e.to_string())),
    };

    let calls = orchestrator.service().calls();
    Ok(ScenarioResult {
        outcome,
        error,
        created_configurations: calls.created.len(),
        wake_calls: calls.wake.len(),
        start_calls: calls.start.len(),
        progress_calls: calls.progress.len(),
        report_calls: calls.report.len(),
        elapsed_secs: orchestrator.clock().now().as_secs(),
    })
}

impl ScenarioExpected {
    /// Compare against a simulation result, listing every mismatch.
    pub fn verify(&self, res: &ScenarioResult) -> Result<()> {
        let mut mismatches = Vec::new();
        let mut check = |what: &str, expected: String, actual: String| {
            if expected != actual {
                mismatches.push(format!("{what}: expected {expected}, got {actual}"));
            }
        };

        check("result", format!("{:?}", self.result), format!("{:?}", res.result()));
        let o = res.outcome.as_ref();
        if let Some(v) = self.configuration_id {
            check("configuration_id", v.to_string(), fmt_opt(o.map(|o| o.configuration_id.get())));
        }
        if let Some(v) = self.created_configuration {
            check("created_configuration", v.to_string(), fmt_opt(o.map(|o| o.created_configuration)));
        }
        if let Some(v) = self.snapshot_id {
            check("snapshot_id", v.to_string(), fmt_opt(o.map(|o| o.snapshot_id.get())));
        }
        if let Some(v) = self.report {
            check("report", v.to_string(), o.map(|o| o.report.is_some()).unwrap_or(false).to_string());
        }
        if let Some(v) = self.start_calls {
            check("start_calls", v.to_string(), res.start_calls.to_string());
        }
        if let Some(v) = self.progress_calls {
            check("progress_calls", v.to_string(), res.progress_calls.to_string());
        }
        if let Some(v) = self.report_calls {
            check("report_calls", v.to_string(), res.report_calls.to_string());
        }
        if let Some(v) = self.elapsed_secs {
            check("elapsed_secs", v.to_string(), res.elapsed_secs.to_string());
        }
        if let Some(needle) = &self.error_contains {
            let err = res.error.clone().unwrap_or_default();
            if !err.contains(needle.as_str()) {
                mismatches.push(format!("error: expected to contain {needle:?}, got {err:?}"));
            }
        }

        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("{}: {}", self.scenario_id, mismatches.join("; ")))
        }
    }
}

fn fmt_opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string())
}
