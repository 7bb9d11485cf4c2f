use thiserror::Error;

/// Result tag every backup service call resolves to.
/// Retry loops branch on the variant instead of catching anything.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("transient service error: {0}")]
    Transient(String),
    #[error("fatal service error: {0}")]
    Fatal(String),
}

impl ServiceError {
    /// Worth another attempt within the caller's retry bound.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Transient(_))
    }
}

/// Rejected configuration input, caught at the config boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("retention must be one of 0, 30 or 60 days (got {0:?})")]
    InvalidRetention(String),
    #[error("unrecognized boolean token {0:?}")]
    InvalidFlag(String),
    #[error("configuration name cannot be empty")]
    EmptyName,
    #[error("poll interval must be at least one second")]
    ZeroPollInterval,
}
