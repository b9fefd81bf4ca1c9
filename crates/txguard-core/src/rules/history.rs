//! Historical adjustment.
//!
//! Runs last. A customer with k > 0 prior violations gets an informational
//! entry and k added to the score, unscaled.

use crate::record::FieldError;
use crate::types::{RuleFinding, RuleId};

use super::{Rule, RuleContext};

/// The historical-violation adjustment.
pub struct HistoricalAdjustment;

impl HistoricalAdjustment {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HistoricalAdjustment {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for HistoricalAdjustment {
    fn id(&self) -> RuleId {
        RuleId::HistoricalViolations
    }

    fn description(&self) -> &'static str {
        "Prior violations for the customer are folded into the score"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleFinding>, FieldError> {
        let Some(customer_id) = ctx.record.customer_id() else {
            return Ok(vec![]);
        };

        match ctx.history.get(&customer_id) {
            Some(count) if count > 0 => Ok(vec![RuleFinding::informational(
                self.id(),
                format!("Customer has {} previous violations.", count),
                "Action: Review the customer's history of violations. Consider manual review.",
                count,
            )]),
            _ => Ok(vec![]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::EvaluationOptions;
    use crate::record::fields::CUSTOMER_ID;
    use crate::record::{HistoricalViolations, Record};
    use crate::rules::testing::run_with;
    use crate::types::FindingKind;

    fn history() -> HistoricalViolations {
        [("1234567890", 3), ("0987654321", 1), ("5555555555", 0)]
            .into_iter()
            .collect()
    }

    fn run_for(customer: Option<&str>) -> Vec<RuleFinding> {
        let mut record = Record::new();
        if let Some(id) = customer {
            record.insert(CUSTOMER_ID, id);
        }
        run_with(
            &HistoricalAdjustment::new(),
            &record,
            &history(),
            &EvaluationOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_known_customer_adds_count() {
        let findings = run_for(Some("1234567890"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Customer has 3 previous violations.");
        assert_eq!(findings[0].score_delta, 3);
        assert_eq!(findings[0].kind, FindingKind::Informational);
    }

    #[test]
    fn test_leading_zero_id_matches() {
        assert_eq!(run_for(Some("0987654321"))[0].score_delta, 1);
    }

    #[test]
    fn test_zero_count_adds_nothing() {
        assert!(run_for(Some("5555555555")).is_empty());
    }

    #[test]
    fn test_unknown_or_missing_customer() {
        assert!(run_for(Some("unknown")).is_empty());
        assert!(run_for(None).is_empty());
    }
}
