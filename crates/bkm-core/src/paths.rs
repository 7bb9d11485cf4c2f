use serde::{Deserialize, Serialize};

/// Folder/file input as it arrives from configuration: either an explicit
/// list or one whitespace-delimited string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathInput {
    List(Vec<String>),
    Delimited(String),
}

impl Default for PathInput {
    fn default() -> Self {
        PathInput::List(Vec::new())
    }
}

impl PathInput {
    /// Canonical list form. Lists pass through unchanged; strings are split on whitespace.
    pub fn normalize(&self) -> Vec<String> {
        match self {
            PathInput::List(items) => items.clone(),
            PathInput::Delimited(s) => s.split_whitespace().map(str::to_string).collect(),
        }
    }
}

impl From<&str> for PathInput {
    fn from(s: &str) -> Self {
        PathInput::Delimited(s.to_string())
    }
}

impl From<Vec<String>> for PathInput {
    fn from(v: Vec<String>) -> Self {
        PathInput::List(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimited_string_is_split() {
        assert_eq!(PathInput::from("a b c").normalize(), vec!["a", "b", "c"]);
        assert_eq!(PathInput::from("  /etc\t/var/www\n").normalize(), vec!["/etc", "/var/www"]);
    }

    #[test]
    fn empty_inputs_normalize_to_nothing() {
        assert!(PathInput::from("").normalize().is_empty());
        assert!(PathInput::from("   ").normalize().is_empty());
        assert!(PathInput::List(vec![]).normalize().is_empty());
    }

    #[test]
    fn lists_pass_through() {
        assert_eq!(PathInput::List(vec!["x".into()]).normalize(), vec!["x"]);
        // list entries are not re-split
        assert_eq!(PathInput::List(vec!["my docs".into()]).normalize(), vec!["my docs"]);
    }
}
