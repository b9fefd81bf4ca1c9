//! Natural-language explanations for rule errors.
//!
//! An [`ExplanationProvider`] turns one error message into a short
//! explanation. Explanations are advisory: the batch orchestrator appends
//! them next to a verdict and never lets them change it.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cache::ExplanationCache;
use crate::config::{RetryConfig, RuntimeConfig};
use crate::prompts::{explanation_messages, explanation_prompt, EXPLANATION_SYSTEM_PROMPT};
use crate::providers::{
    CompletionConfig, CompletionResponse, LlmProvider, ProviderError, ProviderRegistry,
};
use crate::resilience::{BudgetTracker, CircuitBreaker, CircuitState, LlmUsage};
use crate::RuntimeError;

/// Why an explanation could not be produced.
#[derive(Error, Debug)]
pub enum ExplainError {
    #[error("Circuit open for provider '{0}'")]
    CircuitOpen(String),

    #[error("Token budget exhausted ({remaining} tokens left)")]
    BudgetExhausted { remaining: u32 },

    #[error("Explanation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Provider returned an empty explanation")]
    Empty,

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Produces an explanation for one error message.
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    async fn explain(&self, error: &str) -> Result<String, ExplainError>;

    /// Name for logs.
    fn name(&self) -> &str;
}

/// Explanations from an [`LlmProvider`], with caching, a circuit breaker,
/// a token budget and retry on transient errors.
pub struct LlmExplanationProvider {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    retry: RetryConfig,
    cache: ExplanationCache,
    circuit_breaker: CircuitBreaker,
    budget: BudgetTracker,
}

impl LlmExplanationProvider {
    /// Wrap a provider using the resilience settings in `config`.
    pub fn new(provider: Arc<dyn LlmProvider>, config: &RuntimeConfig) -> Self {
        Self {
            provider,
            completion: config.completion(),
            retry: config.retry.clone(),
            cache: ExplanationCache::from_config(&config.cache),
            circuit_breaker: CircuitBreaker::new(config.circuit_breaker.clone()),
            budget: BudgetTracker::new(config.budget.max_tokens),
        }
    }

    /// Create the configured provider through `registry` and wrap it.
    pub fn from_config(
        config: &RuntimeConfig,
        registry: &ProviderRegistry,
    ) -> Result<Self, RuntimeError> {
        let provider = registry.create(&config.provider.provider_type, &config.provider.settings)?;
        Ok(Self::new(provider, config))
    }

    /// Usage so far.
    pub fn usage(&self) -> LlmUsage {
        self.budget.usage()
    }

    /// Whether the wrapped provider reports itself usable.
    pub async fn health_check(&self) -> bool {
        self.provider.health_check().await
    }

    /// Circuit state of the wrapped provider.
    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state(self.provider.name())
    }

    fn estimate_tokens(&self, error: &str) -> u32 {
        self.provider
            .estimate_tokens(EXPLANATION_SYSTEM_PROMPT)
            .saturating_add(self.provider.estimate_tokens(&explanation_prompt(error)))
            .saturating_add(self.completion.max_tokens)
    }

    async fn call_provider(&self, error: &str) -> Result<CompletionResponse, ProviderError> {
        let messages = &explanation_messages(error);
        let provider = &self.provider;
        let completion = &self.completion;

        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.retry.min_delay)
            .with_max_times(self.retry.max_retries);

        (|| async move { provider.complete(messages.clone(), completion).await })
            .retry(backoff)
            .when(|e: &ProviderError| e.is_transient())
            .notify(|e: &ProviderError, delay: Duration| {
                tracing::debug!(
                    provider = provider.name(),
                    error = %e,
                    delay = ?delay,
                    "Retrying explanation call"
                );
            })
            .await
    }
}

#[async_trait]
impl ExplanationProvider for LlmExplanationProvider {
    async fn explain(&self, error: &str) -> Result<String, ExplainError> {
        if let Some(cached) = self.cache.get(error).await {
            self.budget.record_cache_hit();
            return Ok(cached);
        }

        let name = self.provider.name();

        if self.circuit_breaker.is_open(name) {
            return Err(ExplainError::CircuitOpen(name.to_string()));
        }

        let estimated = self.estimate_tokens(error);
        if !self.budget.try_reserve(estimated) {
            let remaining = self.budget.remaining();
            tracing::warn!(provider = name, estimated, remaining, "Explanation budget exhausted");
            return Err(ExplainError::BudgetExhausted { remaining });
        }

        let timeout = self.completion.timeout;
        let response = match tokio::time::timeout(timeout, self.call_provider(error)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                self.budget.release(estimated);
                self.circuit_breaker.record_failure(name);
                return Err(e.into());
            }
            Err(_) => {
                self.budget.release(estimated);
                self.circuit_breaker.record_failure(name);
                return Err(ExplainError::Timeout(timeout));
            }
        };

        self.circuit_breaker.record_success(name);
        self.budget.record_usage(estimated, &response.usage);

        let text = response.content.trim();
        if text.is_empty() {
            return Err(ExplainError::Empty);
        }

        self.cache.insert(error, text).await;
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::providers::{ChatMessage, TokenUsage};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// What the scripted provider does on each call.
    #[derive(Clone, Copy)]
    pub enum Script {
        Answer,
        Fail,
        FailTransientOnce,
        Hang,
        /// Answers after a short delay
        Slow,
        Blank,
    }

    pub struct ScriptedProvider {
        script: Script,
        pub calls: AtomicU32,
    }

    impl ScriptedProvider {
        pub fn new(script: Script) -> Self {
            Self {
                script,
                calls: AtomicU32::new(0),
            }
        }

        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let answer = |content: String| CompletionResponse {
                content,
                usage: TokenUsage {
                    prompt_tokens: 40,
                    completion_tokens: 10,
                },
                model: config.model.clone(),
                stop_reason: Some("end_turn".to_string()),
            };

            match self.script {
                Script::Answer => {
                    let error = messages
                        .last()
                        .and_then(|m| m.content.rsplit(": ").next())
                        .unwrap_or_default();
                    Ok(answer(format!("Likely cause of '{}'.", error)))
                }
                Script::Fail => Err(ProviderError::AuthError),
                Script::FailTransientOnce if call == 0 => {
                    Err(ProviderError::HttpError("connection reset".into()))
                }
                Script::FailTransientOnce => Ok(answer("Recovered.".into())),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(answer("too late".into()))
                }
                Script::Slow => {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok(answer("Eventually.".into()))
                }
                Script::Blank => Ok(answer("   ".into())),
            }
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    pub fn test_config() -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.explain_timeout = Duration::from_secs(1);
        config.retry.min_delay = Duration::from_millis(1);
        config.circuit_breaker.failure_threshold = 2;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{test_config, Script, ScriptedProvider};
    use super::*;

    fn explainer(script: Script, config: &RuntimeConfig) -> (Arc<ScriptedProvider>, LlmExplanationProvider) {
        let provider = Arc::new(ScriptedProvider::new(script));
        let explainer = LlmExplanationProvider::new(provider.clone(), config);
        (provider, explainer)
    }

    #[tokio::test]
    async fn test_explains_and_caches() {
        let (provider, explainer) = explainer(Script::Answer, &test_config());

        let first = explainer.explain("Reported Amount is required").await.unwrap();
        let second = explainer.explain("Reported Amount is required").await.unwrap();

        assert_eq!(first, "Likely cause of 'Reported Amount is required'.");
        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);

        let usage = explainer.usage();
        assert_eq!(usage.llm_calls, 1);
        assert_eq!(usage.cache_hits, 1);
        assert_eq!(usage.total_tokens, 50);
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let (provider, explainer) = explainer(Script::FailTransientOnce, &test_config());

        let text = explainer.explain("Currency should be valid").await.unwrap();
        assert_eq!(text, "Recovered.");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_permanent_errors_open_the_circuit() {
        let (provider, explainer) = explainer(Script::Fail, &test_config());

        for error in ["a", "b"] {
            let result = explainer.explain(error).await;
            assert!(matches!(result, Err(ExplainError::Provider(ProviderError::AuthError))));
        }

        let result = explainer.explain("c").await;
        assert!(matches!(result, Err(ExplainError::CircuitOpen(_))));
        assert!(matches!(explainer.circuit_state(), CircuitState::Open { .. }));
        // Auth errors are not retried and the open circuit skips the call.
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let (_, explainer) = explainer(Script::Hang, &test_config());

        let result = explainer.explain("slow").await;
        assert!(matches!(result, Err(ExplainError::Timeout(d)) if d == Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_budget_exhausted() {
        let mut config = test_config();
        config.budget.max_tokens = 10;
        let (provider, explainer) = explainer(Script::Answer, &config);

        let result = explainer.explain("Reported Amount is required").await;
        assert!(matches!(result, Err(ExplainError::BudgetExhausted { remaining: 10 })));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_calls_cannot_overshoot_budget() {
        let estimate = explainer(Script::Slow, &test_config()).1.estimate_tokens("a");

        let mut config = test_config();
        config.budget.max_tokens = estimate + estimate / 2;
        let (provider, explainer) = explainer(Script::Slow, &config);

        let (first, second) = tokio::join!(explainer.explain("a"), explainer.explain("b"));

        assert_eq!(first.unwrap(), "Eventually.");
        assert!(matches!(second, Err(ExplainError::BudgetExhausted { .. })));
        assert_eq!(provider.calls(), 1);

        // The reservation settles to the 50 tokens actually used.
        assert_eq!(explainer.budget.remaining(), config.budget.max_tokens - 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_calls_release_their_reservation() {
        let mut config = test_config();
        config.budget.max_tokens = 1_000;
        let (_, explainer) = explainer(Script::Hang, &config);

        assert!(matches!(explainer.explain("slow").await, Err(ExplainError::Timeout(_))));
        assert_eq!(explainer.budget.remaining(), 1_000);
    }

    #[tokio::test]
    async fn test_health_check_delegates_to_provider() {
        let (_, explainer) = explainer(Script::Answer, &test_config());
        assert!(explainer.health_check().await);
    }

    #[tokio::test]
    async fn test_blank_answer_is_an_error() {
        let (_, explainer) = explainer(Script::Blank, &test_config());
        assert!(matches!(explainer.explain("x").await, Err(ExplainError::Empty)));
    }
}
