//! Amount-match rule.
//!
//! The transaction amount must equal the reported amount. Cross-currency
//! transactions may deviate by up to 1% of the reported amount; only a
//! deviation strictly greater than that fires.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::record::fields::{IS_CROSS_CURRENCY, REPORTED_AMOUNT, TRANSACTION_AMOUNT};
use crate::record::FieldError;
use crate::types::{RuleFinding, RuleId};

use super::{Rule, RuleContext};

/// Allowed relative deviation for cross-currency transactions.
pub const CROSS_CURRENCY_TOLERANCE: Decimal = dec!(0.01);

/// The amount-match rule.
pub struct AmountMatchRule;

impl AmountMatchRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountMatchRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for AmountMatchRule {
    fn id(&self) -> RuleId {
        RuleId::AmountMatch
    }

    fn description(&self) -> &'static str {
        "Transaction amount matches the reported amount"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleFinding>, FieldError> {
        let record = ctx.record;

        let Some(reported) = record.decimal(REPORTED_AMOUNT)? else {
            return Ok(vec![RuleFinding::violation(
                self.id(),
                "Reported Amount is required",
                "Action: Ensure 'Reported_Amount' is provided for comparison.",
                2,
            )]);
        };

        let Some(transaction) = record.decimal(TRANSACTION_AMOUNT)? else {
            return Ok(vec![RuleFinding::violation(
                self.id(),
                "Transaction Amount is required",
                "Action: Ensure 'Transaction_Amount' is provided for comparison.",
                2,
            )]);
        };

        let cross_currency = record.flag(IS_CROSS_CURRENCY)?.unwrap_or(false);

        if cross_currency {
            let allowed = reported.abs() * CROSS_CURRENCY_TOLERANCE;
            // `None` when the difference of opposite-signed extremes overflows.
            let deviation = transaction.checked_sub(reported).map(|d| d.abs());

            if deviation.map_or(true, |d| d > allowed) {
                let deviation = match deviation {
                    Some(d) => d.normalize().to_string(),
                    None => format!("more than {}", Decimal::MAX),
                };
                return Ok(vec![RuleFinding::violation(
                    self.id(),
                    format!(
                        "Transaction Amount deviates from Reported Amount by more than 1% \
                         (Deviation: {}, Allowed deviation: {})",
                        deviation,
                        allowed.normalize()
                    ),
                    "Action: Review the transaction for cross-currency discrepancy. \
                     Adjust the reported amount or validate cross-currency rates.",
                    3,
                )]);
            }
        } else if transaction != reported {
            return Ok(vec![RuleFinding::violation(
                self.id(),
                "Transaction Amount must match Reported Amount",
                "Action: Ensure the transaction amount matches the reported amount.",
                2,
            )]);
        }

        Ok(vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::rules::testing::run;

    fn amounts(transaction: &str, reported: &str) -> Record {
        Record::new()
            .with(TRANSACTION_AMOUNT, transaction)
            .with(REPORTED_AMOUNT, reported)
    }

    #[test]
    fn test_missing_reported_amount() {
        let record = Record::new().with(TRANSACTION_AMOUNT, "100");
        let findings = run(&AmountMatchRule::new(), &record).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Reported Amount is required");
        assert_eq!(findings[0].score_delta, 2);
    }

    #[test]
    fn test_missing_transaction_amount() {
        let record = Record::new().with(REPORTED_AMOUNT, "100");
        let findings = run(&AmountMatchRule::new(), &record).unwrap();

        assert_eq!(findings[0].message, "Transaction Amount is required");
        assert_eq!(findings[0].score_delta, 2);
    }

    #[test]
    fn test_exact_match_passes() {
        // 100 and 100.00 are the same amount
        let findings = run(&AmountMatchRule::new(), &amounts("100", "100.00")).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_mismatch_without_cross_currency() {
        let findings = run(&AmountMatchRule::new(), &amounts("101", "100")).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Transaction Amount must match Reported Amount");
        assert_eq!(findings[0].score_delta, 2);
    }

    #[test]
    fn test_cross_currency_boundary_is_allowed() {
        let record = amounts("101", "100").with(IS_CROSS_CURRENCY, true);
        let findings = run(&AmountMatchRule::new(), &record).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_cross_currency_over_tolerance() {
        let record = amounts("102", "100").with(IS_CROSS_CURRENCY, true);
        let findings = run(&AmountMatchRule::new(), &record).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].score_delta, 3);
        assert!(findings[0].message.contains("Deviation: 2"));
        assert!(findings[0].message.contains("Allowed deviation: 1"));
    }

    #[test]
    fn test_cross_currency_false_requires_exact_match() {
        let record = amounts("101", "100").with(IS_CROSS_CURRENCY, false);
        let findings = run(&AmountMatchRule::new(), &record).unwrap();
        assert_eq!(findings[0].score_delta, 2);
    }

    #[test]
    fn test_cross_currency_overflowing_deviation_fires() {
        let max = Decimal::MAX.to_string();
        let min = Decimal::MIN.to_string();
        let record = amounts(&max, &min).with(IS_CROSS_CURRENCY, true);

        let findings = run(&AmountMatchRule::new(), &record).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].score_delta, 3);
        assert!(findings[0]
            .message
            .contains(&format!("Deviation: more than {}", Decimal::MAX)));
    }

    #[test]
    fn test_extreme_amounts_without_cross_currency() {
        let max = Decimal::MAX.to_string();
        let min = Decimal::MIN.to_string();

        let findings = run(&AmountMatchRule::new(), &amounts(&max, &min)).unwrap();
        assert_eq!(findings[0].score_delta, 2);

        let record = amounts(&max, &max).with(IS_CROSS_CURRENCY, true);
        assert!(run(&AmountMatchRule::new(), &record).unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_amount_is_a_fault() {
        let err = run(&AmountMatchRule::new(), &amounts("abc", "100")).unwrap_err();
        assert_eq!(err.field, TRANSACTION_AMOUNT);
    }
}
