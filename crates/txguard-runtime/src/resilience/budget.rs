//! Token budget for explanation calls.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::providers::TokenUsage;

/// A token ceiling with an atomic usage counter.
///
/// Calls reserve their estimated cost up front and settle to the actual
/// usage afterwards, so concurrent calls cannot overshoot the ceiling
/// between check and record.
pub struct TokenBudget {
    /// Maximum tokens allowed
    pub max_tokens: u32,

    used: AtomicU32,
}

impl TokenBudget {
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            used: AtomicU32::new(0),
        }
    }

    /// Reserve `tokens` if they fit. Returns false, reserving nothing, if not.
    pub fn try_reserve(&self, tokens: u32) -> bool {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                used.checked_add(tokens).filter(|&total| total <= self.max_tokens)
            })
            .is_ok()
    }

    /// Replace a reservation with the tokens actually used.
    pub fn settle(&self, reserved: u32, actual: u32) {
        let _ = self
            .used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                Some(used.saturating_sub(reserved).saturating_add(actual))
            });
    }

    /// Give back a reservation whose call never completed.
    pub fn release(&self, reserved: u32) {
        self.settle(reserved, 0);
    }

    pub fn remaining(&self) -> u32 {
        self.max_tokens.saturating_sub(self.used())
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }
}

/// Accumulated LLM usage for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmUsage {
    pub total_tokens: u32,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,

    /// Provider calls that returned a response
    pub llm_calls: u32,

    /// Explanations served from cache
    pub cache_hits: u32,
}

impl LlmUsage {
    /// Add usage from one provider response.
    pub fn add(&mut self, usage: &TokenUsage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(usage.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(usage.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(usage.total());
        self.llm_calls += 1;
    }
}

/// Budget and usage tracking shared by all explanation calls of a run.
pub struct BudgetTracker {
    budget: TokenBudget,
    usage: RwLock<LlmUsage>,
}

impl BudgetTracker {
    pub fn new(max_tokens: u32) -> Self {
        Self {
            budget: TokenBudget::new(max_tokens),
            usage: RwLock::new(LlmUsage::default()),
        }
    }

    /// Reserve budget for a call estimated at `estimated_tokens`.
    pub fn try_reserve(&self, estimated_tokens: u32) -> bool {
        self.budget.try_reserve(estimated_tokens)
    }

    /// Settle a reservation against a completed call.
    pub fn record_usage(&self, reserved: u32, usage: &TokenUsage) {
        self.budget.settle(reserved, usage.total());
        self.usage.write().add(usage);
    }

    /// Return a reservation for a call that failed or timed out.
    pub fn release(&self, reserved: u32) {
        self.budget.release(reserved);
    }

    /// Record an explanation served from cache.
    pub fn record_cache_hit(&self) {
        self.usage.write().cache_hits += 1;
    }

    pub fn usage(&self) -> LlmUsage {
        self.usage.read().clone()
    }

    pub fn remaining(&self) -> u32 {
        self.budget.remaining()
    }
}

impl Default for BudgetTracker {
    fn default() -> Self {
        Self::new(50_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn test_reserve_and_settle() {
        let budget = TokenBudget::new(100);

        assert!(!budget.try_reserve(101));
        assert_eq!(budget.used(), 0);

        assert!(budget.try_reserve(60));
        assert_eq!(budget.remaining(), 40);
        assert!(!budget.try_reserve(50));

        // The call used less than estimated.
        budget.settle(60, 25);
        assert_eq!(budget.remaining(), 75);

        assert!(budget.try_reserve(75));
        budget.release(75);
        assert_eq!(budget.used(), 25);
    }

    #[test]
    fn test_settle_may_exceed_the_ceiling() {
        let budget = TokenBudget::new(100);
        assert!(budget.try_reserve(50));
        budget.settle(50, 130);

        assert_eq!(budget.remaining(), 0);
        assert!(!budget.try_reserve(1));
    }

    #[test]
    fn test_concurrent_reservations_never_overshoot() {
        let budget = TokenBudget::new(100);
        let granted = AtomicUsize::new(0);

        thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    if budget.try_reserve(30) {
                        granted.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(granted.load(Ordering::SeqCst), 3);
        assert_eq!(budget.used(), 90);
    }

    #[test]
    fn test_tracker_accumulates_usage() {
        let tracker = BudgetTracker::new(500);
        let usage = TokenUsage {
            prompt_tokens: 30,
            completion_tokens: 20,
        };

        for _ in 0..2 {
            assert!(tracker.try_reserve(80));
            tracker.record_usage(80, &usage);
        }
        tracker.record_cache_hit();

        assert!(tracker.try_reserve(200));
        tracker.release(200);

        assert_eq!(tracker.remaining(), 400);
        let totals = tracker.usage();
        assert_eq!(totals.total_tokens, 100);
        assert_eq!(totals.llm_calls, 2);
        assert_eq!(totals.cache_hits, 1);
    }
}
