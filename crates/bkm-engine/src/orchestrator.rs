use std::time::Duration;

use bkm_core::{
    decide_poll, decide_report, decide_start, AgentId, BackupConfiguration, BackupReport, ConfigurationId,
    ConfigurationSpec, LifecycleOutcome, LifecyclePolicy, PollDecision, PollOutcome, ReportDecision, RunState,
    ServiceError, SessionId, SnapshotId, SnapshotRun, SpecError, StartDecision,
};
use bkm_service::{BackupService, Clock, WakeRequest};
use tracing::{debug, error, info, info_span, warn, Span};

use crate::{LifecycleHooks, OrchestratorError};

/// Where the session's configuration comes from: a previously persisted id,
/// falling back to creating one from `spec`.
#[derive(Clone, Debug)]
pub struct ConfigSource {
    pub existing_id: Option<ConfigurationId>,
    pub spec: ConfigurationSpec,
}

/// Stateful session bound to one agent and one backup service.
///
/// Holds at most one configuration and one run at a time. Every call blocks;
/// the only suspension points are the start backoff and the poll interval,
/// both taken through `clock`.
pub struct Orchestrator<S, C> {
    service: S,
    clock: C,
    agent_id: AgentId,
    policy: LifecyclePolicy,
    span: Span,
    configuration: Option<BackupConfiguration>,
    active_run: Option<SnapshotRun>,
    start_attempts: u32,
}

impl<S: BackupService, C: Clock> Orchestrator<S, C> {
    pub fn new(service: S, clock: C, agent_id: AgentId, policy: LifecyclePolicy) -> Self {
        let session = SessionId::new();
        let span = info_span!("backup_session", session = %session, agent_id = %agent_id);
        Self {
            service,
            clock,
            agent_id,
            policy,
            span,
            configuration: None,
            active_run: None,
            start_attempts: 0,
        }
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn configuration(&self) -> Option<&BackupConfiguration> {
        self.configuration.as_ref()
    }

    pub fn active_run(&self) -> Option<&SnapshotRun> {
        self.active_run.as_ref()
    }

    /// Attempts made by the most recent `start_run`.
    pub fn start_attempts(&self) -> u32 {
        self.start_attempts
    }

    /// Load an existing configuration. `Ok(false)` means the service does not know `id`.
    pub fn load_configuration(&mut self, id: ConfigurationId) -> Result<bool, ServiceError> {
        let span = self.span.clone();
        let _enter = span.enter();

        match self.service.retrieve_configuration(id) {
            Ok(conf) => {
                debug!(configuration = ?conf, "found configuration");
                self.configuration = Some(conf);
                Ok(true)
            }
            Err(ServiceError::NotFound(_)) => {
                debug!(configuration_id = %id, "configuration not found");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Create a configuration from `spec`. Returns the service-assigned id, or
    /// `None` (with the active configuration cleared) when the service refused.
    pub fn create_configuration(&mut self, spec: &ConfigurationSpec) -> Result<Option<ConfigurationId>, SpecError> {
        let span = self.span.clone();
        let _enter = span.enter();

        spec.validate()?;
        let mut conf = BackupConfiguration::from_spec(spec, self.agent_id);
        debug!(configuration = ?conf, "submitting backup configuration");

        match self.service.create_configuration(&mut conf) {
            Ok(true) if conf.configuration_id.is_assigned() => {
                let id = conf.configuration_id;
                info!(configuration_id = %id, name = %conf.name, "backup configuration created");
                self.configuration = Some(conf);
                Ok(Some(id))
            }
            Ok(true) => {
                warn!("service accepted the configuration but assigned no id");
                self.configuration = None;
                Ok(None)
            }
            Ok(false) => {
                warn!("service rejected the backup configuration");
                self.configuration = None;
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "creating backup configuration failed");
                self.configuration = None;
                Ok(None)
            }
        }
    }

    /// Load `source.existing_id` if the service knows it, otherwise create from
    /// `source.spec`. Returns the active id and whether it was just created.
    pub fn resolve_configuration(&mut self, source: &ConfigSource) -> Result<(ConfigurationId, bool), OrchestratorError> {
        if let Some(id) = source.existing_id {
            if self.load_configuration(id)? {
                return Ok((id, false));
            }
            info!(configuration_id = %id, "stored configuration is gone; creating a new one");
        }

        match self.create_configuration(&source.spec)? {
            Some(id) => Ok((id, true)),
            None => Err(OrchestratorError::ConfigurationUnavailable),
        }
    }

    pub fn wake_agent(&mut self) -> bool {
        let span = self.span.clone();
        let _enter = span.enter();

        let request = WakeRequest {
            agent_id: self.agent_id,
            timeout: self.policy.wake_timeout(),
            keep_awake: false,
        };
        match self.service.wake_agent(&request) {
            Ok(true) => {
                debug!("agent is awake");
                true
            }
            Ok(false) => {
                warn!("agent did not respond to wake request");
                false
            }
            Err(e) => {
                warn!(error = %e, "wake request failed");
                false
            }
        }
    }

    /// Try up to `retries` times to start a run for `config_id`.
    ///
    /// Transport errors are retried at once; a call that returns no usable id
    /// waits the start backoff before the next attempt. The first valid id
    /// becomes the active run. `None` means no run was started.
    pub fn start_run(&mut self, config_id: ConfigurationId, retries: u32) -> Option<SnapshotId> {
        let span = self.span.clone();
        let _enter = span.enter();

        self.active_run = None;
        self.start_attempts = 0;

        for attempt in 1..=retries {
            self.start_attempts = attempt;
            let result = self.service.start_run(config_id);
            match decide_start(&result) {
                StartDecision::Accept(snapshot_id) => {
                    info!(attempt, snapshot_id = %snapshot_id, configuration_id = %config_id, "backup started");
                    self.active_run = Some(SnapshotRun {
                        snapshot_id,
                        state: RunState::StartRequested,
                        configuration_id: config_id,
                    });
                    return Some(snapshot_id);
                }
                StartDecision::RetryNow => {
                    if let Err(e) = &result {
                        warn!(attempt, error = %e, "start attempt failed");
                    }
                }
                StartDecision::RetryAfterBackoff => {
                    warn!(attempt, response = ?result, "start returned no usable snapshot id");
                    if attempt < retries {
                        self.clock.sleep(self.policy.start_backoff());
                    }
                }
                StartDecision::Abort => {
                    if let Err(e) = &result {
                        error!(attempt, error = %e, "start refused; giving up");
                    }
                    break;
                }
            }
        }

        error!(configuration_id = %config_id, attempts = self.start_attempts, "backup could not be started");
        None
    }

    /// Poll `snapshot` (or the active run) until it reaches a terminal state or
    /// `timeout` elapses. The first check happens one poll interval after the call.
    pub fn wait_for_completion(
        &mut self,
        snapshot: Option<SnapshotId>,
        timeout: Duration,
    ) -> Result<PollOutcome, OrchestratorError> {
        let span = self.span.clone();
        let _enter = span.enter();

        self.policy.validate()?;
        let snapshot_id = self.known_snapshot(snapshot)?;
        let interval = self.policy.poll_interval();
        let deadline = self.clock.now() + timeout;
        let mut checks: u32 = 0;

        loop {
            self.clock.sleep(interval);
            checks += 1;

            let observation = self.service.fetch_progress(snapshot_id);
            match &observation {
                Ok(p) => {
                    debug!(check = checks, snapshot_id = %snapshot_id, state = %p.state, "progress");
                    self.record_state(snapshot_id, &p.state);
                }
                Err(e) => warn!(check = checks, snapshot_id = %snapshot_id, error = %e, "progress check failed"),
            }

            let deadline_passed = self.clock.now() >= deadline;
            if let PollDecision::Finish(outcome) = decide_poll(&observation, checks, deadline_passed) {
                match &outcome {
                    PollOutcome::Succeeded { state, .. } => {
                        info!(snapshot_id = %snapshot_id, state = %state, checks, "backup finished")
                    }
                    PollOutcome::Failed { cause } => {
                        error!(snapshot_id = %snapshot_id, cause = ?cause, checks, "backup did not complete")
                    }
                }
                return Ok(outcome);
            }
        }
    }

    /// Fetch the final report of `snapshot` (or the active run), retrying up to
    /// `retries` times without delay. `Ok(None)` means no valid report arrived.
    pub fn fetch_report(
        &mut self,
        snapshot: Option<SnapshotId>,
        retries: u32,
    ) -> Result<Option<BackupReport>, OrchestratorError> {
        let span = self.span.clone();
        let _enter = span.enter();

        let snapshot_id = self.known_snapshot(snapshot)?;
        for attempt in 1..=retries {
            let result = self.service.fetch_report(snapshot_id);
            if let Err(e) = &result {
                warn!(attempt, snapshot_id = %snapshot_id, error = %e, "report fetch failed");
            }
            match decide_report(result) {
                ReportDecision::Accept(report) => {
                    info!(attempt, snapshot_id = %snapshot_id, outcome = %report.detail.outcome, "report retrieved");
                    return Ok(Some(report));
                }
                ReportDecision::Retry => debug!(attempt, snapshot_id = %snapshot_id, "report not available yet"),
                ReportDecision::Abort => break,
            }
        }

        warn!(snapshot_id = %snapshot_id, "no report available");
        Ok(None)
    }

    /// resolve -> wake -> start -> poll -> report, with `hooks` in between.
    pub fn run_lifecycle(
        &mut self,
        source: &ConfigSource,
        hooks: &mut dyn LifecycleHooks,
    ) -> Result<LifecycleOutcome, OrchestratorError> {
        self.policy.validate()?;
        let (configuration_id, created) = self.resolve_configuration(source)?;
        hooks
            .configuration_resolved(configuration_id, created)
            .map_err(OrchestratorError::Hook)?;

        if !self.wake_agent() {
            return Err(OrchestratorError::AgentUnreachable(self.agent_id));
        }
        hooks.before_start(configuration_id).map_err(OrchestratorError::Hook)?;

        let snapshot_id = self
            .start_run(configuration_id, self.policy.start_retries)
            .ok_or(OrchestratorError::StartExhausted { attempts: self.start_attempts })?;
        let poll = self.wait_for_completion(Some(snapshot_id), self.policy.poll_timeout())?;
        let report = self.fetch_report(Some(snapshot_id), self.policy.report_retries)?;

        let outcome = LifecycleOutcome {
            configuration_id,
            created_configuration: created,
            snapshot_id,
            poll,
            report,
        };
        hooks.after_run(&outcome);
        Ok(outcome)
    }

    fn known_snapshot(&self, snapshot: Option<SnapshotId>) -> Result<SnapshotId, OrchestratorError> {
        snapshot
            .or_else(|| self.active_run.as_ref().map(|r| r.snapshot_id))
            .ok_or(OrchestratorError::NoSnapshot)
    }

    fn record_state(&mut self, snapshot_id: SnapshotId, state: &RunState) {
        if let Some(run) = self.active_run.as_mut() {
            if run.snapshot_id == snapshot_id {
                run.state = state.clone();
            }
        }
    }
}
