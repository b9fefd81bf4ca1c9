//! Verdict builder: folds rule findings into a [`VerdictResult`].
//!
//! Aggregation policy is fixed:
//! 1. Findings keep rule order.
//! 2. Each finding contributes exactly one error and one remediation entry.
//! 3. The score is the saturating sum of every finding's delta.

use chrono::NaiveDate;

use crate::types::{RuleFinding, VerdictResult};

/// Accumulates findings for one record.
#[derive(Debug)]
pub struct VerdictBuilder {
    evaluated_on: NaiveDate,
    findings: Vec<RuleFinding>,
    risk_score: u32,
}

impl VerdictBuilder {
    pub fn new(evaluated_on: NaiveDate) -> Self {
        Self {
            evaluated_on,
            findings: Vec::new(),
            risk_score: 0,
        }
    }

    /// Add one finding.
    pub fn push(&mut self, finding: RuleFinding) {
        tracing::debug!(
            rule = %finding.rule,
            kind = ?finding.kind,
            delta = finding.score_delta,
            "Rule fired"
        );
        self.risk_score = self.risk_score.saturating_add(finding.score_delta);
        self.findings.push(finding);
    }

    /// Add several findings in order.
    pub fn extend(&mut self, findings: impl IntoIterator<Item = RuleFinding>) {
        for finding in findings {
            self.push(finding);
        }
    }

    /// Running score so far.
    pub fn risk_score(&self) -> u32 {
        self.risk_score
    }

    /// Finish the verdict.
    pub fn build(self) -> VerdictResult {
        let errors = self.findings.iter().map(|f| f.message.clone()).collect();
        let remediation_actions = self
            .findings
            .iter()
            .map(|f| f.remediation.clone())
            .collect();

        VerdictResult {
            errors,
            remediation_actions,
            risk_score: self.risk_score,
            findings: self.findings,
            evaluated_on: self.evaluated_on,
        }
    }
}
