//! # txguard-runtime
//!
//! Batch evaluation and optional LLM explanations for txguard.
//!
//! ## Important
//!
//! The rule engine in `txguard-core` is fully deterministic and never calls a
//! model. This crate runs it over batches and can attach a natural-language
//! explanation to each error. Explanations are advisory: a failed, slow or
//! skipped explanation never changes a verdict.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use txguard_runtime::{BatchOrchestrator, LlmExplanationProvider, ProviderRegistry, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_yaml_file("runtime.yaml")?;
//! let explainer = LlmExplanationProvider::from_config(&config, &ProviderRegistry::with_defaults())?;
//!
//! let orchestrator = BatchOrchestrator::builder()
//!     .history(history)
//!     .config(config)
//!     .explainer(Arc::new(explainer))
//!     .build()?;
//!
//! let report = orchestrator.evaluate_batch(&records).await;
//! println!("{} flagged of {}", report.summary.flagged, report.summary.records);
//! ```

pub mod cache;
pub mod config;
pub mod explainer;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod resilience;

pub use cache::ExplanationCache;
pub use config::{
    BudgetConfig, CacheConfig, ProviderConfig, RetryConfig, RuntimeConfig, DEFAULT_CONCURRENCY,
};
pub use explainer::{ExplainError, ExplanationProvider, LlmExplanationProvider};
pub use orchestrator::{
    BatchOrchestrator, BatchOrchestratorBuilder, BatchReport, BatchSummary, ExplainedVerdict,
    Explanation, RecordOutcome, SkippedExplanation,
};
pub use providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    ProviderFactory, ProviderRegistry, TokenUsage,
};
pub use resilience::{BudgetTracker, CircuitBreaker, CircuitBreakerConfig, CircuitState, LlmUsage};

use thiserror::Error;

/// Errors from setting up the runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Invalid runtime configuration: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_type_surfaces_as_runtime_error() {
        let mut config = RuntimeConfig::default();
        config.provider.provider_type = "nonexistent".to_string();

        let result = LlmExplanationProvider::from_config(&config, &ProviderRegistry::new());
        match result {
            Err(RuntimeError::Provider(ProviderError::NotConfigured(msg))) => {
                assert!(msg.contains("nonexistent"));
            }
            _ => panic!("expected provider error"),
        }
    }
}
