use bkm_core::{AgentId, ServiceError, SpecError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no snapshot id known: start a run first or pass one explicitly")]
    NoSnapshot,
    #[error("invalid configuration: {0}")]
    InvalidSpec(#[from] SpecError),
    #[error("backup configuration could not be loaded or created")]
    ConfigurationUnavailable,
    #[error("loading backup configuration failed: {0}")]
    Service(#[from] ServiceError),
    #[error("agent {0} did not wake up")]
    AgentUnreachable(AgentId),
    #[error("backup did not start after {attempts} attempt(s)")]
    StartExhausted { attempts: u32 },
    #[error("lifecycle hook failed: {0:#}")]
    Hook(anyhow::Error),
}
