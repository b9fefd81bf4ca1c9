//! Credential handling for LLM providers.
//!
//! API keys are wrapped in [`ApiCredential`] as soon as they are read. The
//! wrapper redacts itself in `Debug` and `Display`, zeroes its memory on drop,
//! and only yields the raw value through [`ApiCredential::expose`].
//!
//! ```ignore
//! let cred = ApiCredential::from_config_or_env(&settings, "api_key", "ANTHROPIC_API_KEY", "Anthropic API key")?;
//! request.header("x-api-key", cred.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Provider settings in the runtime config
    Config,
    /// Environment variable
    Environment,
    /// Passed in by the caller
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely stored API credential.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Wrap a raw value.
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load from an environment variable.
    pub fn from_env(env_var: &str, name: &'static str) -> Result<Self, ProviderError> {
        std::env::var(env_var)
            .map(|v| Self::new(v, CredentialSource::Environment, name))
            .map_err(|_| {
                ProviderError::NotConfigured(format!(
                    "{} not set: configure '{}' environment variable",
                    name, env_var
                ))
            })
    }

    /// Load from provider settings, falling back to an environment variable.
    ///
    /// # Arguments
    /// * `settings` - Provider settings object
    /// * `config_key` - Key to look for in the settings (e.g. "api_key")
    /// * `env_var` - Fallback environment variable (e.g. "ANTHROPIC_API_KEY")
    /// * `name` - Human-readable name for error messages
    pub fn from_config_or_env(
        settings: &JsonValue,
        config_key: &str,
        env_var: &str,
        name: &'static str,
    ) -> Result<Self, ProviderError> {
        if let Some(value) = settings[config_key].as_str() {
            return Ok(Self::new(value, CredentialSource::Config, name));
        }

        if let Ok(value) = std::env::var(env_var) {
            return Ok(Self::new(value, CredentialSource::Environment, name));
        }

        Err(ProviderError::NotConfigured(format!(
            "{} required: set '{}' in provider settings or {} environment variable",
            name, config_key, env_var
        )))
    }

    /// Whether a credential could be loaded, without loading it.
    pub fn is_available(settings: &JsonValue, config_key: &str, env_var: &str) -> bool {
        settings[config_key].as_str().is_some() || std::env::var(env_var).is_ok()
    }

    /// The raw value. Call only where the credential is sent.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "sk-test-secret-0001";

    #[test]
    fn test_redacted_in_debug_and_display() {
        let cred = ApiCredential::new(SECRET, CredentialSource::Config, "Test API key");

        let debug = format!("{:?}", cred);
        let display = format!("{}", cred);

        assert!(!debug.contains(SECRET));
        assert!(!display.contains(SECRET));
        assert!(debug.contains("[REDACTED]"));
        assert!(display.contains("Test API key from config"));
    }

    #[test]
    fn test_expose() {
        let cred = ApiCredential::new(SECRET, CredentialSource::Programmatic, "Test API key");
        assert_eq!(cred.expose(), SECRET);
        assert!(!cred.is_empty());
        assert!(ApiCredential::new("", CredentialSource::Programmatic, "Empty").is_empty());
    }

    #[test]
    fn test_settings_take_precedence_over_env() {
        std::env::set_var("TXGUARD_TEST_KEY_PRIORITY", "env-key");
        let settings = serde_json::json!({ "api_key": "config-key" });

        let cred = ApiCredential::from_config_or_env(
            &settings,
            "api_key",
            "TXGUARD_TEST_KEY_PRIORITY",
            "Test key",
        )
        .unwrap();

        assert_eq!(cred.expose(), "config-key");
        assert_eq!(cred.source(), CredentialSource::Config);
        std::env::remove_var("TXGUARD_TEST_KEY_PRIORITY");
    }

    #[test]
    fn test_falls_back_to_env() {
        std::env::set_var("TXGUARD_TEST_KEY_FALLBACK", "env-key");

        let cred = ApiCredential::from_config_or_env(
            &serde_json::json!({}),
            "api_key",
            "TXGUARD_TEST_KEY_FALLBACK",
            "Test key",
        )
        .unwrap();

        assert_eq!(cred.expose(), "env-key");
        assert_eq!(cred.source(), CredentialSource::Environment);
        std::env::remove_var("TXGUARD_TEST_KEY_FALLBACK");
    }

    #[test]
    fn test_missing_credential_names_both_sources() {
        let err = ApiCredential::from_config_or_env(
            &serde_json::json!({}),
            "api_key",
            "TXGUARD_TEST_KEY_MISSING",
            "Test key",
        )
        .unwrap_err()
        .to_string();

        assert!(err.contains("Test key"));
        assert!(err.contains("api_key"));
        assert!(err.contains("TXGUARD_TEST_KEY_MISSING"));
    }

    #[test]
    fn test_is_available() {
        let settings = serde_json::json!({ "api_key": "value" });
        assert!(ApiCredential::is_available(&settings, "api_key", "TXGUARD_TEST_UNSET"));
        assert!(!ApiCredential::is_available(
            &serde_json::json!({}),
            "api_key",
            "TXGUARD_TEST_UNSET"
        ));
    }
}
