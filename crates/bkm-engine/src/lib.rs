//! The backup lifecycle engine: one stateful session per agent driving
//! configuration resolution, agent wake-up, start-with-retry, bounded polling
//! and report retrieval against a [`bkm_service::BackupService`].

pub mod error;
pub mod hooks;
pub mod orchestrator;

pub use error::*;
pub use hooks::*;
pub use orchestrator::*;
