//! Batch orchestrator.
//!
//! Runs the core evaluator over many records with bounded concurrency and,
//! when an explanation provider is configured, attaches an explanation to
//! each error. It implements:
//! - Ordered fan-out over records via `futures::stream::buffered`
//! - Per-record results, so one rejected record never aborts the batch
//! - A timeout on every explanation, with failures recorded as skipped
//! - A batch summary

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use txguard_core::{
    Clock, EvaluationError, EvaluationOptions, Evaluator, HistoricalViolations, Record,
    SystemClock, VerdictResult,
};

use crate::config::RuntimeConfig;
use crate::explainer::{ExplainError, ExplanationProvider};
use crate::RuntimeError;

/// An explanation attached to one error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    /// The error message that was explained
    pub error: String,

    /// Explanation text
    pub text: String,
}

/// An error whose explanation could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedExplanation {
    pub error: String,
    pub reason: String,
}

/// A verdict plus any explanations gathered for its errors.
///
/// `verdict` is exactly what the core engine returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplainedVerdict {
    pub verdict: VerdictResult,
    pub explanations: Vec<Explanation>,
    pub skipped: Vec<SkippedExplanation>,
}

impl ExplainedVerdict {
    /// A verdict with no explanations.
    pub fn unexplained(verdict: VerdictResult) -> Self {
        Self {
            verdict,
            explanations: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Remediation actions followed by one `Explanation: ...` entry per
    /// explained error.
    pub fn remediation_actions(&self) -> Vec<String> {
        self.verdict
            .remediation_actions
            .iter()
            .cloned()
            .chain(
                self.explanations
                    .iter()
                    .map(|e| format!("Explanation: {}", e.text)),
            )
            .collect()
    }
}

/// Result for one input record.
#[derive(Debug)]
pub struct RecordOutcome {
    /// Zero-based position in the input
    pub index: usize,

    pub customer_id: Option<String>,

    pub result: Result<ExplainedVerdict, EvaluationError>,
}

impl RecordOutcome {
    /// Customer id, or `Row N` (one-based) when the record has none.
    pub fn label(&self) -> String {
        self.customer_id
            .clone()
            .unwrap_or_else(|| format!("Row {}", self.index + 1))
    }

    pub fn is_rejected(&self) -> bool {
        self.result.is_err()
    }
}

/// Counts over a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub records: usize,

    /// Evaluated with no findings
    pub clean: usize,

    /// Evaluated with at least one finding
    pub flagged: usize,

    /// Failed evaluation (malformed input under the reject policy)
    pub rejected: usize,

    pub total_score: u64,
    pub max_score: u32,

    pub explanations: usize,
    pub explanations_skipped: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[RecordOutcome]) -> Self {
        let mut summary = Self {
            records: outcomes.len(),
            ..Self::default()
        };

        for outcome in outcomes {
            match &outcome.result {
                Ok(explained) => {
                    let verdict = &explained.verdict;
                    if verdict.is_clean() {
                        summary.clean += 1;
                    } else {
                        summary.flagged += 1;
                    }
                    summary.total_score += u64::from(verdict.risk_score);
                    summary.max_score = summary.max_score.max(verdict.risk_score);
                    summary.explanations += explained.explanations.len();
                    summary.explanations_skipped += explained.skipped.len();
                }
                Err(_) => summary.rejected += 1,
            }
        }

        summary
    }
}

/// Outcomes in input order plus their summary.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<RecordOutcome>,
    pub summary: BatchSummary,
}

/// Evaluates batches of records.
pub struct BatchOrchestrator {
    evaluator: Evaluator,
    history: HistoricalViolations,
    explainer: Option<Arc<dyn ExplanationProvider>>,
    concurrency: usize,
    explain_timeout: Duration,
}

impl BatchOrchestrator {
    /// Orchestrator with default runtime settings and no explanations.
    pub fn new(evaluator: Evaluator, history: HistoricalViolations) -> Self {
        let config = RuntimeConfig::default();
        Self {
            evaluator,
            history,
            explainer: None,
            concurrency: config.concurrency,
            explain_timeout: config.explain_timeout,
        }
    }

    pub fn builder() -> BatchOrchestratorBuilder {
        BatchOrchestratorBuilder::new()
    }

    /// Whether explanations will be requested.
    pub fn explains(&self) -> bool {
        self.explainer.is_some()
    }

    /// Evaluate every record, preserving input order.
    pub async fn evaluate_batch(&self, records: &[Record]) -> BatchReport {
        let outcomes: Vec<RecordOutcome> = stream::iter(records.iter().enumerate())
            .map(|(index, record)| self.evaluate_record(index, record))
            .buffered(self.concurrency)
            .collect()
            .await;

        let summary = BatchSummary::from_outcomes(&outcomes);

        tracing::info!(
            records = summary.records,
            clean = summary.clean,
            flagged = summary.flagged,
            rejected = summary.rejected,
            max_score = summary.max_score,
            "Batch evaluated"
        );

        BatchReport { outcomes, summary }
    }

    /// Evaluate one record and explain its errors.
    pub async fn evaluate_record(&self, index: usize, record: &Record) -> RecordOutcome {
        let customer_id = record.customer_id();

        let result = match self.evaluator.evaluate(record, Some(&self.history)) {
            Ok(verdict) => Ok(self.explain(verdict).await),
            Err(e) => {
                tracing::warn!(
                    row = index + 1,
                    customer_id = customer_id.as_deref().unwrap_or("-"),
                    error = %e,
                    "Record rejected"
                );
                Err(e)
            }
        };

        RecordOutcome {
            index,
            customer_id,
            result,
        }
    }

    async fn explain(&self, verdict: VerdictResult) -> ExplainedVerdict {
        let Some(explainer) = &self.explainer else {
            return ExplainedVerdict::unexplained(verdict);
        };

        let attempts = join_all(
            verdict
                .errors
                .iter()
                .map(|error| self.explain_one(explainer.as_ref(), error)),
        )
        .await;

        let mut explained = ExplainedVerdict::unexplained(verdict);
        for attempt in attempts {
            match attempt {
                Ok(explanation) => explained.explanations.push(explanation),
                Err(skipped) => explained.skipped.push(skipped),
            }
        }
        explained
    }

    async fn explain_one(
        &self,
        explainer: &dyn ExplanationProvider,
        error: &str,
    ) -> Result<Explanation, SkippedExplanation> {
        let result = match tokio::time::timeout(self.explain_timeout, explainer.explain(error)).await
        {
            Ok(result) => result,
            Err(_) => Err(ExplainError::Timeout(self.explain_timeout)),
        };

        match result {
            Ok(text) => Ok(Explanation {
                error: error.to_string(),
                text,
            }),
            Err(e) => {
                tracing::warn!(
                    provider = explainer.name(),
                    error_message = error,
                    reason = %e,
                    "Explanation skipped"
                );
                Err(SkippedExplanation {
                    error: error.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Builder for [`BatchOrchestrator`].
pub struct BatchOrchestratorBuilder {
    options: EvaluationOptions,
    clock: Arc<dyn Clock>,
    history: HistoricalViolations,
    explainer: Option<Arc<dyn ExplanationProvider>>,
    config: RuntimeConfig,
}

impl BatchOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            options: EvaluationOptions::default(),
            clock: Arc::new(SystemClock),
            history: HistoricalViolations::empty(),
            explainer: None,
            config: RuntimeConfig::default(),
        }
    }

    pub fn options(mut self, options: EvaluationOptions) -> Self {
        self.options = options;
        self
    }

    /// Date source for the evaluator.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn history(mut self, history: HistoricalViolations) -> Self {
        self.history = history;
        self
    }

    /// Enable explanations.
    pub fn explainer(mut self, explainer: Arc<dyn ExplanationProvider>) -> Self {
        self.explainer = Some(explainer);
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<BatchOrchestrator, RuntimeError> {
        self.config.validate()?;
        self.options
            .validate()
            .map_err(|e| RuntimeError::Config(e.to_string()))?;

        Ok(BatchOrchestrator {
            evaluator: Evaluator::with_clock(self.options, self.clock),
            history: self.history,
            explainer: self.explainer,
            concurrency: self.config.concurrency.max(1),
            explain_timeout: self.config.explain_timeout,
        })
    }
}

impl Default for BatchOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
