use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Value the backup service uses for "no snapshot" / "no report".
pub const SNAPSHOT_SENTINEL: i64 = -1;

macro_rules! numeric_id {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                Self(v)
            }
        }
    };
}

numeric_id!(ConfigurationId);
numeric_id!(SnapshotId);
numeric_id!(AgentId);

impl ConfigurationId {
    /// Placeholder carried by a configuration until the service assigns one.
    pub const UNASSIGNED: ConfigurationId = ConfigurationId(0);

    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl SnapshotId {
    /// Validate a raw snapshot id as returned by the service.
    /// Absent values and the -1 sentinel both mean "no run".
    pub fn from_raw(raw: Option<i64>) -> Option<SnapshotId> {
        match raw {
            Some(v) if v != SNAPSHOT_SENTINEL => Some(SnapshotId(v)),
            _ => None,
        }
    }
}

/// Identifies one orchestrator session in logs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_and_absent_snapshot_ids_are_rejected() {
        assert_eq!(SnapshotId::from_raw(None), None);
        assert_eq!(SnapshotId::from_raw(Some(-1)), None);
        assert_eq!(SnapshotId::from_raw(Some(42)), Some(SnapshotId(42)));
        assert_eq!(SnapshotId::from_raw(Some(0)), Some(SnapshotId(0)));
    }

    #[test]
    fn unassigned_configuration_id() {
        assert!(!ConfigurationId::UNASSIGNED.is_assigned());
        assert!(ConfigurationId(17).is_assigned());
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
