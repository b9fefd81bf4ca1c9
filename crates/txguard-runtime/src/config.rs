//! Runtime configuration.
//!
//! Loaded from YAML. Every section has defaults, so an empty file is a valid
//! configuration. Durations use humantime syntax (`15s`, `500ms`, `1h`).
//!
//! ```yaml
//! concurrency: 8
//! explain_timeout: 15s
//! cache:
//!   max_entries: 10000
//!   ttl: 1h
//! circuit_breaker:
//!   failure_threshold: 3
//!   recovery_timeout: 30s
//!   success_threshold: 2
//! budget:
//!   max_tokens: 50000
//! retry:
//!   max_retries: 2
//!   min_delay: 200ms
//! provider:
//!   type: anthropic
//!   model: claude-sonnet-4-5-20250514
//!   max_tokens: 300
//!   settings:
//!     base_url: https://api.anthropic.com/v1
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::providers::CompletionConfig;
use crate::resilience::CircuitBreakerConfig;
use crate::RuntimeError;

/// Default number of records processed concurrently.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Top-level runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Records processed concurrently in a batch
    pub concurrency: usize,

    /// Upper bound on one explanation call, retries included
    #[serde(with = "duration_str")]
    pub explain_timeout: Duration,

    pub cache: CacheConfig,

    pub circuit_breaker: CircuitBreakerConfig,

    pub budget: BudgetConfig,

    pub retry: RetryConfig,

    pub provider: ProviderConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            explain_timeout: Duration::from_secs(15),
            cache: CacheConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            budget: BudgetConfig::default(),
            retry: RetryConfig::default(),
            provider: ProviderConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Parse from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, RuntimeError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| RuntimeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RuntimeError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&contents)
    }

    /// Reject values that would stall or disable the runtime.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.concurrency == 0 {
            return Err(RuntimeError::Config("concurrency must be at least 1".into()));
        }
        if self.explain_timeout.is_zero() {
            return Err(RuntimeError::Config("explain_timeout must be positive".into()));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(RuntimeError::Config(
                "circuit_breaker.failure_threshold must be at least 1".into(),
            ));
        }
        if self.provider.provider_type.trim().is_empty() {
            return Err(RuntimeError::Config("provider.type must not be empty".into()));
        }
        Ok(())
    }

    /// Completion settings for one explanation request.
    pub fn completion(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.provider.model.clone(),
            max_tokens: self.provider.max_tokens,
            temperature: self.provider.temperature,
            timeout: self.explain_timeout,
        }
    }
}

/// Explanation cache sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached explanations
    pub max_entries: u64,

    /// How long an explanation stays cached
    #[serde(with = "duration_str")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Token ceiling for explanation calls in one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    pub max_tokens: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self { max_tokens: 50_000 }
    }
}

/// Retry policy for transient provider errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: usize,

    /// First backoff delay; later delays grow exponentially
    #[serde(with = "duration_str")]
    pub min_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            min_delay: Duration::from_millis(200),
        }
    }
}

/// Which LLM backend to use and how to call it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Registered provider type (e.g. "anthropic")
    #[serde(rename = "type")]
    pub provider_type: String,

    pub model: String,

    /// Maximum tokens per explanation
    pub max_tokens: u32,

    pub temperature: f32,

    /// Provider-specific settings passed to the factory
    pub settings: serde_json::Value,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let completion = CompletionConfig::default();
        Self {
            provider_type: "anthropic".to_string(),
            model: completion.model,
            max_tokens: completion.max_tokens,
            temperature: completion.temperature,
            settings: serde_json::json!({}),
        }
    }
}

/// Serde adapter for humantime duration strings.
pub(crate) mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
