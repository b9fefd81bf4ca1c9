//! The evaluator: runs the rule set over one record.
//!
//! Evaluation is a straight fold over the rules in order. There is no
//! short-circuiting, no shared mutable state, and no I/O; one `Evaluator`
//! can be shared across threads and used on many records at once.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::clock::{Clock, SystemClock};
use crate::options::{EvaluationOptions, MalformedInputPolicy};
use crate::record::{HistoricalViolations, Record};
use crate::rules::{default_rules, malformed_finding, Rule, RuleContext};
use crate::types::VerdictResult;
use crate::verdict::VerdictBuilder;
use crate::EvaluationError;

/// Runs the rule set against records.
pub struct Evaluator {
    rules: Vec<Box<dyn Rule>>,
    options: EvaluationOptions,
    clock: Arc<dyn Clock>,
}

impl Evaluator {
    /// Evaluator with the standard rules, judged against the local date.
    pub fn new(options: EvaluationOptions) -> Self {
        Self::with_clock(options, Arc::new(SystemClock))
    }

    /// Evaluator with an injected clock.
    pub fn with_clock(options: EvaluationOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            rules: default_rules(),
            options,
            clock,
        }
    }

    /// The rules in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Evaluate one record against the clock's current date.
    ///
    /// `history` defaults to an empty lookup.
    pub fn evaluate(
        &self,
        record: &Record,
        history: Option<&HistoricalViolations>,
    ) -> Result<VerdictResult, EvaluationError> {
        self.evaluate_on(record, history, self.clock.today())
    }

    /// Evaluate one record against an explicit processing date.
    pub fn evaluate_on(
        &self,
        record: &Record,
        history: Option<&HistoricalViolations>,
        as_of: NaiveDate,
    ) -> Result<VerdictResult, EvaluationError> {
        let empty = HistoricalViolations::empty();
        let ctx = RuleContext {
            record,
            history: history.unwrap_or(&empty),
            as_of,
            options: &self.options,
        };

        let mut builder = VerdictBuilder::new(as_of);
        let mut faulted_fields = BTreeSet::new();

        for rule in &self.rules {
            match rule.evaluate(&ctx) {
                Ok(findings) => builder.extend(findings),
                Err(fault) => {
                    tracing::warn!(
                        rule = %rule.id(),
                        field = %fault.field,
                        value = %fault.value,
                        "Malformed input"
                    );

                    match self.options.malformed_input {
                        MalformedInputPolicy::Reject => {
                            return Err(EvaluationError::MalformedInput(fault));
                        }
                        MalformedInputPolicy::Report => {
                            // Several rules may read the same bad field; report it once.
                            if faulted_fields.insert(fault.field.clone()) {
                                builder.push(malformed_finding(rule.id(), &fault));
                            }
                        }
                    }
                }
            }
        }

        let verdict = builder.build();

        tracing::debug!(
            customer_id = record.customer_id().as_deref().unwrap_or("-"),
            errors = verdict.errors.len(),
            risk_score = verdict.risk_score,
            "Record evaluated"
        );

        Ok(verdict)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(EvaluationOptions::default())
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("rules", &self.rules.iter().map(|r| r.id()).collect::<Vec<_>>())
            .field("options", &self.options)
            .finish()
    }
}
