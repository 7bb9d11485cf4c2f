use std::path::Path;

use anyhow::{Context, Result};
use bkm_core::AgentId;
use serde::{Deserialize, Serialize};

/// Agent registration written by the backup agent installer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bootstrap {
    pub agent_id: i64,
    pub api_host_name: String,
}

impl Bootstrap {
    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read bootstrap {}", path.display()))?;
        let b: Bootstrap = serde_json::from_str(&s).with_context(|| format!("parse bootstrap {}", path.display()))?;
        Ok(b)
    }

    pub fn agent(&self) -> AgentId {
        AgentId(self.agent_id)
    }
}
