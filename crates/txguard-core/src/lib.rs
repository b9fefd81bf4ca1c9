//! # txguard-core
//!
//! Deterministic transaction rule evaluation and risk scoring engine.
//!
//! This crate answers, for one financial transaction record:
//! - Which integrity rules does it break?
//! - What should an operator do about each one?
//! - How risky is it overall?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same record, history and processing date always
//!    produce the same verdict
//! 2. **No I/O**: Evaluation never reads files, the network or the wall clock
//!    (the date comes from a [`Clock`])
//! 3. **Additive**: The risk score is exactly the sum of the fired findings'
//!    deltas
//! 4. **Parallel-safe**: [`Evaluator`] is `Send + Sync` and keeps no state
//!    between calls
//!
//! ## Example
//!
//! ```rust,ignore
//! use txguard_core::{evaluate_with_history, HistoricalViolations, Record};
//!
//! let history = HistoricalViolations::from_file("history.yaml")?;
//! let record = Record::from_json(r#"{"Customer_ID": "1234567890", "Currency": "USD"}"#)?;
//! let verdict = evaluate_with_history(&record, &history, None)?;
//!
//! for (error, action) in verdict.errors.iter().zip(&verdict.remediation_actions) {
//!     println!("{error}: {action}");
//! }
//! println!("score {} ({})", verdict.risk_score, verdict.risk_level());
//! ```

pub mod clock;
pub mod evaluator;
pub mod options;
pub mod record;
pub mod rules;
pub mod types;
pub mod verdict;

// Re-export main types at crate root
pub use clock::{Clock, FixedClock, SystemClock};
pub use evaluator::Evaluator;
pub use options::{ConfigError, EvaluationOptions, MalformedInputPolicy, DEFAULT_MAX_DAYS_OLD};
pub use record::{fields, FieldError, FieldValue, HistoricalViolations, Record, RecordError};
pub use rules::{
    default_rules, is_valid_currency, AmountMatchRule, BalanceRule, CrossBorderLimitRule,
    CurrencyRule, HistoricalAdjustment, Rule, RuleContext, TransactionDateRule,
};
pub use types::{FindingKind, RiskLevel, RuleFinding, RuleId, VerdictResult};
pub use verdict::VerdictBuilder;

use thiserror::Error;

/// Errors that can occur during evaluation
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Malformed input: {0}")]
    MalformedInput(FieldError),

    #[error("Invalid options: {0}")]
    InvalidOptions(#[from] ConfigError),
}

impl From<FieldError> for EvaluationError {
    fn from(error: FieldError) -> Self {
        Self::MalformedInput(error)
    }
}

/// Evaluate one record with default options and no prior history.
///
/// This is the main entry point for one-off checks. The processing date is
/// the local date.
pub fn evaluate(record: &Record) -> Result<VerdictResult, EvaluationError> {
    Evaluator::default().evaluate(record, None)
}

/// Evaluate one record against a prior-violation lookup.
///
/// # Arguments
///
/// * `record` - The transaction record
/// * `history` - Prior-violation counts keyed by customer id
/// * `max_days_old` - Staleness threshold in days; `None` means 180
pub fn evaluate_with_history(
    record: &Record,
    history: &HistoricalViolations,
    max_days_old: Option<u32>,
) -> Result<VerdictResult, EvaluationError> {
    let options = EvaluationOptions::default()
        .with_max_days_old(max_days_old.unwrap_or(DEFAULT_MAX_DAYS_OLD));
    options.validate()?;

    Evaluator::new(options).evaluate(record, Some(history))
}
