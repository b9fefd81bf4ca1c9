//! Balance rule: a negative balance is only acceptable on an overdraft account.

use rust_decimal::Decimal;

use crate::record::fields::{ACCOUNT_BALANCE, ACCOUNT_FLAG};
use crate::record::FieldError;
use crate::types::{RuleFinding, RuleId};

use super::{Rule, RuleContext};

/// `Account_Flag` value marking an overdraft account.
pub const OVERDRAFT_FLAG: &str = "OD";

/// The balance rule.
pub struct BalanceRule;

impl BalanceRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BalanceRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for BalanceRule {
    fn id(&self) -> RuleId {
        RuleId::AccountBalance
    }

    fn description(&self) -> &'static str {
        "Account balance is non-negative unless flagged as overdraft"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleFinding>, FieldError> {
        let Some(balance) = ctx.record.decimal(ACCOUNT_BALANCE)? else {
            return Ok(vec![]);
        };

        let overdraft = ctx.record.text(ACCOUNT_FLAG) == Some(OVERDRAFT_FLAG);

        if balance < Decimal::ZERO && !overdraft {
            return Ok(vec![RuleFinding::violation(
                self.id(),
                "Account Balance cannot be negative unless flagged as overdraft (OD)",
                "Action: Investigate negative balance. If it's a valid overdraft, \
                 ensure 'Account_Flag' is set to 'OD'.",
                4,
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

    #[test]
    fn test_negative_without_flag() {
        let record = Record::new().with(ACCOUNT_BALANCE, -50i64);
        let findings = run(&BalanceRule::new(), &record).unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].score_delta, 4);
    }

    #[test]
    fn test_negative_with_overdraft_flag() {
        let record = Record::new()
            .with(ACCOUNT_BALANCE, -50i64)
            .with(ACCOUNT_FLAG, "OD");
        assert!(run(&BalanceRule::new(), &record).unwrap().is_empty());
    }

    #[test]
    fn test_negative_with_other_flag() {
        let record = Record::new()
            .with(ACCOUNT_BALANCE, "-0.01")
            .with(ACCOUNT_FLAG, "FROZEN");
        assert_eq!(run(&BalanceRule::new(), &record).unwrap().len(), 1);
    }

    #[test]
    fn test_zero_and_positive_pass() {
        for balance in ["0", "-0", "0.00", "1500.75"] {
            let record = Record::new().with(ACCOUNT_BALANCE, balance);
            assert!(run(&BalanceRule::new(), &record).unwrap().is_empty(), "{}", balance);
        }
    }

    #[test]
    fn test_absent_balance_passes() {
        assert!(run(&BalanceRule::new(), &Record::new()).unwrap().is_empty());
    }
}
