//! Evaluation options.
//!
//! Options are plain data with serde defaults so they can be loaded from a
//! YAML file or built in code:
//!
//! ```yaml
//! max_days_old: 90
//! malformed_input: reject
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default staleness threshold in days.
pub const DEFAULT_MAX_DAYS_OLD: u32 = 180;

/// Errors that can occur when loading options or lookup data.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// What to do with a field value that is present but cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedInputPolicy {
    /// Surface the fault as a `MalformedInput` finding and keep evaluating.
    #[default]
    Report,

    /// Fail the whole record with `EvaluationError::MalformedInput`.
    Reject,
}

/// Knobs for a single evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    /// Transactions older than this many days raise a staleness error
    pub max_days_old: u32,

    /// Handling of unreadable field values
    pub malformed_input: MalformedInputPolicy,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            max_days_old: DEFAULT_MAX_DAYS_OLD,
            malformed_input: MalformedInputPolicy::Report,
        }
    }
}

impl EvaluationOptions {
    /// Override the staleness threshold.
    pub fn with_max_days_old(mut self, days: u32) -> Self {
        self.max_days_old = days;
        self
    }

    /// Override the malformed-input policy.
    pub fn with_malformed_input(mut self, policy: MalformedInputPolicy) -> Self {
        self.malformed_input = policy;
        self
    }

    /// Check the options are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_days_old == 0 {
            return Err(ConfigError::Invalid(
                "max_days_old must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse options from a YAML string. Missing keys take defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_yaml::from_str(yaml)?;
        options.validate()?;
        Ok(options)
    }

    /// Parse options from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EvaluationOptions::default();
        assert_eq!(options.max_days_old, 180);
        assert_eq!(options.malformed_input, MalformedInputPolicy::Report);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let options = EvaluationOptions::from_yaml("max_days_old: 90\n").unwrap();
        assert_eq!(options.max_days_old, 90);
        assert_eq!(options.malformed_input, MalformedInputPolicy::Report);
    }

    #[test]
    fn test_reject_policy_from_yaml() {
        let options = EvaluationOptions::from_yaml("malformed_input: reject\n").unwrap();
        assert_eq!(options.malformed_input, MalformedInputPolicy::Reject);
    }

    #[test]
    fn test_zero_threshold_is_invalid() {
        let result = EvaluationOptions::from_yaml("max_days_old: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
        assert!(EvaluationOptions::default().validate().is_ok());
    }

    #[test]
    fn test_unknown_policy_fails() {
        let result = EvaluationOptions::from_yaml("malformed_input: ignore\n");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }
}
