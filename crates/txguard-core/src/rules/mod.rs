//! The rule set.
//!
//! Each rule is an independent, stateless check over one record. Rules are
//! run in a fixed order by the [`Evaluator`](crate::Evaluator) and never
//! short-circuit one another: every applicable rule always runs so one record
//! can accumulate several findings and an additive score.
//!
//! | Order | Rule | Max delta |
//! |-------|------|-----------|
//! | 1 | [`AmountMatchRule`] | 3 |
//! | 2 | [`BalanceRule`] | 4 |
//! | 3 | [`TransactionDateRule`] | 6 |
//! | 4 | [`CurrencyRule`] | 2 |
//! | 5 | [`CrossBorderLimitRule`] | 5 |
//! | 6 | [`HistoricalAdjustment`] | prior count |

mod amount;
mod balance;
mod cross_border;
mod currency;
mod date;
mod history;

pub use amount::{AmountMatchRule, CROSS_CURRENCY_TOLERANCE};
pub use balance::{BalanceRule, OVERDRAFT_FLAG};
pub use cross_border::{CrossBorderLimitRule, CROSS_BORDER_LIMIT};
pub use currency::{is_valid_currency, CurrencyRule};
pub use date::TransactionDateRule;
pub use history::HistoricalAdjustment;

use chrono::NaiveDate;

use crate::options::EvaluationOptions;
use crate::record::{FieldError, HistoricalViolations, Record};
use crate::types::{FindingKind, RuleFinding, RuleId};

/// Score added when a field is present but unreadable.
///
/// Same weight as the field being absent, since the value is unusable.
pub const MALFORMED_INPUT_DELTA: u32 = 2;

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// The record under evaluation
    pub record: &'a Record,

    /// Caller-owned prior-violation counts
    pub history: &'a HistoricalViolations,

    /// Processing date
    pub as_of: NaiveDate,

    /// Evaluation options
    pub options: &'a EvaluationOptions,
}

/// A single independent check.
///
/// Implementations must be pure: the same context always yields the same
/// findings, and nothing outside the context is read.
pub trait Rule: Send + Sync {
    /// Which rule this is.
    fn id(&self) -> RuleId;

    /// One-line statement of what the rule checks.
    fn description(&self) -> &'static str;

    /// Evaluate the rule.
    ///
    /// Returns zero or more findings, or the first field value that could not
    /// be read. The evaluator decides how to surface that fault.
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleFinding>, FieldError>;
}

/// The standard rule set in evaluation order.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(AmountMatchRule::new()),
        Box::new(BalanceRule::new()),
        Box::new(TransactionDateRule::new()),
        Box::new(CurrencyRule::new()),
        Box::new(CrossBorderLimitRule::new()),
        Box::new(HistoricalAdjustment::new()),
    ]
}

/// Turn an unreadable field into a finding.
pub fn malformed_finding(rule: RuleId, error: &FieldError) -> RuleFinding {
    RuleFinding {
        rule,
        kind: FindingKind::MalformedInput,
        message: format!("Malformed input: {}", error),
        remediation: format!(
            "Action: Correct the '{}' value in the source record.",
            error.field
        ),
        score_delta: MALFORMED_INPUT_DELTA,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule_order() {
        let ids: Vec<RuleId> = default_rules().iter().map(|r| r.id()).collect();
        assert_eq!(
            ids,
            vec![
                RuleId::AmountMatch,
                RuleId::AccountBalance,
                RuleId::TransactionDate,
                RuleId::Currency,
                RuleId::CrossBorderLimit,
                RuleId::HistoricalViolations,
            ]
        );
    }

    #[test]
    fn test_malformed_finding_text() {
        let error = FieldError {
            field: "Transaction_Date".to_string(),
            value: "invalid-date".to_string(),
            reason: "is not a valid YYYY-MM-DD date".to_string(),
        };
        let finding = malformed_finding(RuleId::TransactionDate, &error);

        assert_eq!(finding.kind, FindingKind::MalformedInput);
        assert_eq!(
            finding.message,
            "Malformed input: Transaction_Date value 'invalid-date' is not a valid YYYY-MM-DD date"
        );
        assert_eq!(finding.score_delta, MALFORMED_INPUT_DELTA);
    }
}
