//! Core verdict types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a rule in the fixed evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    AmountMatch,
    AccountBalance,
    TransactionDate,
    Currency,
    CrossBorderLimit,
    HistoricalViolations,
}

impl RuleId {
    /// Stable short name, used in logs and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::AmountMatch => "amount_match",
            RuleId::AccountBalance => "account_balance",
            RuleId::TransactionDate => "transaction_date",
            RuleId::Currency => "currency",
            RuleId::CrossBorderLimit => "cross_border_limit",
            RuleId::HistoricalViolations => "historical_violations",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of entry a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A business rule was breached or a required field is missing
    Violation,

    /// A field is present but unreadable
    MalformedInput,

    /// Context carried into the score (prior violations)
    Informational,
}

/// One fired rule: its message, remediation, and score contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFinding {
    /// The rule that produced this finding
    pub rule: RuleId,

    /// Entry kind
    pub kind: FindingKind,

    /// Human-readable error message
    pub message: String,

    /// Imperative corrective action
    pub remediation: String,

    /// Amount added to the risk score
    pub score_delta: u32,
}

impl RuleFinding {
    /// A violation finding.
    pub fn violation(
        rule: RuleId,
        message: impl Into<String>,
        remediation: impl Into<String>,
        score_delta: u32,
    ) -> Self {
        Self {
            rule,
            kind: FindingKind::Violation,
            message: message.into(),
            remediation: remediation.into(),
            score_delta,
        }
    }

    /// An informational finding.
    pub fn informational(
        rule: RuleId,
        message: impl Into<String>,
        remediation: impl Into<String>,
        score_delta: u32,
    ) -> Self {
        Self {
            kind: FindingKind::Informational,
            ..Self::violation(rule, message, remediation, score_delta)
        }
    }
}

/// Coarse banding of a risk score for display and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Band a score: 0 low, 1-4 medium, 5-9 high, 10+ critical.
    pub fn from_score(score: u32) -> Self {
        match score {
            0 => RiskLevel::Low,
            1..=4 => RiskLevel::Medium,
            5..=9 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// The outcome of evaluating one record.
///
/// `errors` and `remediation_actions` are in rule order; `risk_score` is the
/// sum of every finding's `score_delta`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictResult {
    /// Error messages, one per finding
    pub errors: Vec<String>,

    /// Remediation actions, one per finding
    pub remediation_actions: Vec<String>,

    /// Cumulative risk score
    pub risk_score: u32,

    /// The findings the above were built from
    pub findings: Vec<RuleFinding>,

    /// Processing date the record was judged against
    pub evaluated_on: NaiveDate,
}

impl VerdictResult {
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn remediation_actions(&self) -> &[String] {
        &self.remediation_actions
    }

    pub fn risk_score(&self) -> u32 {
        self.risk_score
    }

    /// Split into the `(errors, remediation_actions, risk_score)` triple.
    pub fn into_parts(self) -> (Vec<String>, Vec<String>, u32) {
        (self.errors, self.remediation_actions, self.risk_score)
    }

    /// No finding of any kind.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Whether any field was present but unreadable.
    pub fn has_malformed_input(&self) -> bool {
        self.findings
            .iter()
            .any(|f| f.kind == FindingKind::MalformedInput)
    }

    /// Whether a given rule fired.
    pub fn fired(&self, rule: RuleId) -> bool {
        self.findings.iter().any(|f| f.rule == rule)
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(4), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(5), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(10), RiskLevel::Critical);
        assert!(RiskLevel::High > RiskLevel::Medium);
    }

    #[test]
    fn test_rule_id_serializes_snake_case() {
        let json = serde_json::to_string(&RuleId::CrossBorderLimit).unwrap();
        assert_eq!(json, "\"cross_border_limit\"");
    }
}
