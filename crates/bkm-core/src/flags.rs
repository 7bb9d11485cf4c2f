//! Boolean tokens accepted for notification flags in configuration files.
//!
//! | value                                   | meaning |
//! |-----------------------------------------|---------|
//! | `true` `True` `TRUE` `1` `yes` `Yes` `YES` `on` `On` `ON` | true |
//! | `false` `False` `FALSE` `0` `no` `No` `NO` `off` `Off` `OFF` and the empty string | false |
//!
//! Native TOML/YAML booleans and the integers 0/1 are accepted as well.
//! Any other token is rejected rather than guessed.

use serde::{Deserialize, Deserializer};

use crate::SpecError;

const TRUE_TOKENS: &[&str] = &["true", "True", "TRUE", "1", "yes", "Yes", "YES", "on", "On", "ON"];
const FALSE_TOKENS: &[&str] = &["false", "False", "FALSE", "0", "no", "No", "NO", "off", "Off", "OFF", ""];

pub fn parse_flag(token: &str) -> Result<bool, SpecError> {
    let t = token.trim();
    if TRUE_TOKENS.contains(&t) {
        Ok(true)
    } else if FALSE_TOKENS.contains(&t) {
        Ok(false)
    } else {
        Err(SpecError::InvalidFlag(token.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// `#[serde(deserialize_with = "bkm_core::deserialize_flag")]`
pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match FlagValue::deserialize(deserializer)? {
        FlagValue::Bool(b) => Ok(b),
        FlagValue::Int(0) => Ok(false),
        FlagValue::Int(1) => Ok(true),
        FlagValue::Int(other) => Err(serde::de::Error::custom(SpecError::InvalidFlag(other.to_string()))),
        FlagValue::Text(s) => parse_flag(&s).map_err(serde::de::Error::custom),
    }
}
