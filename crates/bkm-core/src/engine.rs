//! Pure retry/poll decisions. The orchestrator performs the I/O and sleeps;
//! these functions only look at one result and say what happens next.

use crate::{
    BackupReport, FailureCause, PollOutcome, Progress, RawReport, ServiceError, SnapshotId, StateClass,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartDecision {
    Accept(SnapshotId),
    /// Transport/service hiccup: try again without waiting.
    RetryNow,
    /// Call succeeded but produced no usable id: wait out the backoff first.
    RetryAfterBackoff,
    Abort,
}

pub fn decide_start(result: &Result<Option<i64>, ServiceError>) -> StartDecision {
    match result {
        Ok(raw) => match SnapshotId::from_raw(*raw) {
            Some(id) => StartDecision::Accept(id),
            None => StartDecision::RetryAfterBackoff,
        },
        Err(e) if e.is_retryable() => StartDecision::RetryNow,
        Err(_) => StartDecision::Abort,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportDecision {
    Accept(BackupReport),
    Retry,
    Abort,
}

pub fn decide_report(result: Result<RawReport, ServiceError>) -> ReportDecision {
    match result {
        Ok(raw) => match raw.validate() {
            Some(report) => ReportDecision::Accept(report),
            None => ReportDecision::Retry,
        },
        Err(e) if e.is_retryable() => ReportDecision::Retry,
        Err(_) => ReportDecision::Abort,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollDecision {
    Finish(PollOutcome),
    Continue,
}

/// Decide after the `checks`-th observation. `deadline_passed` is evaluated
/// after the observation, so a terminal state seen right at the deadline still counts.
pub fn decide_poll(observation: &Result<Progress, ServiceError>, checks: u32, deadline_passed: bool) -> PollDecision {
    match observation {
        Ok(p) => match p.state.class() {
            StateClass::Succeeded => {
                return PollDecision::Finish(PollOutcome::Succeeded { state: p.state.clone(), checks });
            }
            StateClass::Failed => {
                return PollDecision::Finish(PollOutcome::Failed {
                    cause: FailureCause::Remote { state: p.state.clone() },
                });
            }
            StateClass::Pending => {}
        },
        Err(e) if e.is_retryable() => {}
        Err(e) => {
            return PollDecision::Finish(PollOutcome::Failed {
                cause: FailureCause::Service { message: e.to_string() },
            });
        }
    }

    if deadline_passed {
        PollDecision::Finish(PollOutcome::Failed { cause: FailureCause::TimedOut { checks } })
    } else {
        PollDecision::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigurationId, ReportDetail, RunState};

    fn progress(state: &str) -> Result<Progress, ServiceError> {
        Ok(Progress { run_id: 1, configuration_id: ConfigurationId(2), state: RunState::parse(state) })
    }

    #[test]
    fn start_decisions() {
        assert_eq!(decide_start(&Ok(Some(42))), StartDecision::Accept(SnapshotId(42)));
        assert_eq!(decide_start(&Ok(Some(-1))), StartDecision::RetryAfterBackoff);
        assert_eq!(decide_start(&Ok(None)), StartDecision::RetryAfterBackoff);
        assert_eq!(decide_start(&Err(ServiceError::Transient("503".into()))), StartDecision::RetryNow);
        assert_eq!(decide_start(&Err(ServiceError::Fatal("401".into()))), StartDecision::Abort);
        assert_eq!(decide_start(&Err(ServiceError::NotFound("cfg".into()))), StartDecision::Abort);
    }

    #[test]
    fn report_decisions() {
        let valid = RawReport { snapshot_id: 5, configuration_id: 1, detail: ReportDetail::default() };
        assert!(matches!(decide_report(Ok(valid)), ReportDecision::Accept(r) if r.snapshot_id == SnapshotId(5)));
        let sentinel = RawReport { snapshot_id: -1, configuration_id: 1, detail: ReportDetail::default() };
        assert_eq!(decide_report(Ok(sentinel)), ReportDecision::Retry);
        assert_eq!(decide_report(Err(ServiceError::Transient("x".into()))), ReportDecision::Retry);
        assert_eq!(decide_report(Err(ServiceError::Fatal("x".into()))), ReportDecision::Abort);
    }

    #[test]
    fn terminal_states_finish_even_at_deadline() {
        let d = decide_poll(&progress("Completed"), 3, true);
        assert_eq!(d, PollDecision::Finish(PollOutcome::Succeeded { state: RunState::Completed, checks: 3 }));
        let d = decide_poll(&progress("Missed"), 1, false);
        assert_eq!(
            d,
            PollDecision::Finish(PollOutcome::Failed { cause: FailureCause::Remote { state: RunState::Missed } })
        );
    }

    #[test]
    fn pending_and_transient_continue_until_deadline() {
        assert_eq!(decide_poll(&progress("InProgress"), 1, false), PollDecision::Continue);
        assert_eq!(decide_poll(&Err(ServiceError::Transient("t".into())), 1, false), PollDecision::Continue);
        assert_eq!(
            decide_poll(&progress("Queued"), 2, true),
            PollDecision::Finish(PollOutcome::Failed { cause: FailureCause::TimedOut { checks: 2 } })
        );
    }

    #[test]
    fn fatal_progress_error_fails_immediately() {
        let d = decide_poll(&Err(ServiceError::NotFound("snapshot 9".into())), 1, false);
        assert!(matches!(d, PollDecision::Finish(PollOutcome::Failed { cause: FailureCause::Service { .. } })));
    }
}
