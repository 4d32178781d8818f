//! Per-pipeline outcomes and their aggregation over one pass.

use crate::error::EngineError;

/// What a single pipeline did during one reconciliation pass.
///
/// Pure data, produced per pipeline per pass and never persisted.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Observed state already satisfied desired state.
    Unchanged,
    /// The child resource was created.
    Created,
    /// The child resource (or the parent's annotations) was updated.
    Updated,
    /// A precondition was unmet; the pipeline did nothing.
    Skipped(&'static str),
    /// The pipeline failed; the scheduler will retry the whole pass.
    Failed(EngineError),
}

impl PipelineOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// Short label for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Display for PipelineOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
            Self::Failed(err) => write!(f, "failed ({err})"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Outcome of one pipeline, tagged with the pipeline that produced it.
#[derive(Debug)]
pub struct PipelineReport {
    pub pipeline: &'static str,
    pub outcome: PipelineOutcome,
}

/// Ordered collection of pipeline reports for one reconciliation pass.
///
/// "Has failures" is a derived predicate over the reports rather than a
/// distinguished combined-error value, so partial outcomes stay
/// inspectable.
#[derive(Debug, Default)]
pub struct ReconcileResult {
    pub reports: Vec<PipelineReport>,
}

impl ReconcileResult {
    /// An empty success result, used when the parent disappeared between
    /// notification and processing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pipeline: &'static str, outcome: PipelineOutcome) {
        self.reports.push(PipelineReport { pipeline, outcome });
    }

    /// Whether any pipeline failed this pass.
    pub fn has_failures(&self) -> bool {
        self.reports.iter().any(|r| r.outcome.is_failed())
    }

    /// All pipeline errors, in pipeline order. Never just the first.
    pub fn errors(&self) -> Vec<&EngineError> {
        self.reports
            .iter()
            .filter_map(|r| match &r.outcome {
                PipelineOutcome::Failed(err) => Some(err),
                _ => None,
            })
            .collect()
    }

    /// Concatenated error message for the scheduler's failure report, or
    /// `None` when everything succeeded.
    pub fn error_summary(&self) -> Option<String> {
        if !self.has_failures() {
            return None;
        }
        let combined = self
            .reports
            .iter()
            .filter_map(|r| match &r.outcome {
                PipelineOutcome::Failed(err) => Some(format!("{}: {err}", r.pipeline)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("; ");
        Some(combined)
    }

    /// Looks up the outcome of a named pipeline.
    pub fn outcome_of(&self, pipeline: &str) -> Option<&PipelineOutcome> {
        self.reports
            .iter()
            .find(|r| r.pipeline == pipeline)
            .map(|r| &r.outcome)
    }
}
