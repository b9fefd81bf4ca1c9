//! Transaction-date rule.
//!
//! The date must be present, not after the processing date, and not older
//! than the configured threshold. The future and staleness checks are
//! independent and may both fire.

use crate::record::fields::TRANSACTION_DATE;
use crate::record::FieldError;
use crate::types::{RuleFinding, RuleId};

use super::{Rule, RuleContext};

/// The transaction-date rule.
pub struct TransactionDateRule;

impl TransactionDateRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TransactionDateRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for TransactionDateRule {
    fn id(&self) -> RuleId {
        RuleId::TransactionDate
    }

    fn description(&self) -> &'static str {
        "Transaction date is present, not in the future, and not stale"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleFinding>, FieldError> {
        let Some(date) = ctx.record.date(TRANSACTION_DATE)? else {
            return Ok(vec![RuleFinding::violation(
                self.id(),
                "Transaction Date is required",
                "Action: Ensure 'Transaction_Date' is provided.",
                2,
            )]);
        };

        let mut findings = Vec::new();

        if date > ctx.as_of {
            findings.push(RuleFinding::violation(
                self.id(),
                "Transaction Date cannot be in the future",
                "Action: Review the transaction date and correct any future dates.",
                3,
            ));
        }

        let max_days_old = ctx.options.max_days_old;
        let age_days = (ctx.as_of - date).num_days();

        if age_days > i64::from(max_days_old) {
            findings.push(RuleFinding::violation(
                self.id(),
                format!(
                    "Transaction is older than {} days, triggering validation alert",
                    max_days_old
                ),
                format!(
                    "Action: Review the transaction for validity if older than {} days.",
                    max_days_old
                ),
                3,
            ));
        }

        Ok(findings)
    }
}
