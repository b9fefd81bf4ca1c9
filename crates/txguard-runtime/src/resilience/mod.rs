//! Resilience for explanation calls.
//!
//! - Circuit breaker per provider, so a failing backend is skipped quickly
//! - Token budget, so a large batch cannot run up unbounded cost

mod budget;
mod circuit_breaker;

pub use budget::{BudgetTracker, LlmUsage, TokenBudget};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
