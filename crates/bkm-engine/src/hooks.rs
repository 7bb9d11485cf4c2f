use bkm_core::{ConfigurationId, LifecycleOutcome};

/// Extension points around the linear lifecycle. All methods default to no-ops.
pub trait LifecycleHooks {
    /// Called once the active configuration is known.
    fn configuration_resolved(&mut self, _id: ConfigurationId, _created: bool) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after the agent is awake, before the first start attempt.
    /// An error aborts the lifecycle without starting a run.
    fn before_start(&mut self, _id: ConfigurationId) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once a started run has been watched and its report fetched.
    fn after_run(&mut self, _outcome: &LifecycleOutcome) {}
}

/// Hooks that do nothing.
pub struct NoHooks;

impl LifecycleHooks for NoHooks {}
