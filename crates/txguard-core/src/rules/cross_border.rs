//! Cross-border limit rule.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::record::fields::{IS_CROSS_BORDER, TRANSACTION_AMOUNT};
use crate::record::FieldError;
use crate::types::{RuleFinding, RuleId};

use super::{Rule, RuleContext};

/// Ceiling for a single cross-border transaction. Exactly the limit is allowed.
pub const CROSS_BORDER_LIMIT: Decimal = dec!(5000);

/// The cross-border limit rule.
pub struct CrossBorderLimitRule;

impl CrossBorderLimitRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CrossBorderLimitRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for CrossBorderLimitRule {
    fn id(&self) -> RuleId {
        RuleId::CrossBorderLimit
    }

    fn description(&self) -> &'static str {
        "Cross-border transactions stay within the fixed limit"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleFinding>, FieldError> {
        if !ctx.record.flag(IS_CROSS_BORDER)?.unwrap_or(false) {
            return Ok(vec![]);
        }

        // A missing amount is reported by the amount-match rule.
        let Some(amount) = ctx.record.decimal(TRANSACTION_AMOUNT)? else {
            return Ok(vec![]);
        };

        if amount > CROSS_BORDER_LIMIT {
            return Ok(vec![RuleFinding::violation(
                self.id(),
                "Transaction exceeds cross-border transaction limits",
                "Action: Cross-border transaction limit exceeded. Ensure the transaction \
                 adheres to regulatory limits or obtain necessary approval.",
                5,
            )]);
        }

        Ok(vec![])
    }
}
