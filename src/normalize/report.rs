//! Normalized view of an analysis response.

use serde::Serialize;

use super::strategy::ExtractionSource;
use crate::models::CodedFinding;

/// Model name shown when the service does not report one.
pub const DEFAULT_MODEL_LABEL: &str = "gpt-3.5-turbo";

/// Shown in copy/export output when there is nothing else to show.
pub const NO_CODES_FOUND: &str = "No codes found";

/// Outcome of normalizing one analysis response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NormalizedAnalysis {
    /// The service did not report a successful analysis.
    NoResults {
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// The service answered; findings may still be empty.
    Analyzed(AnalysisReport),
}

impl NormalizedAnalysis {
    /// Findings, empty for [`NormalizedAnalysis::NoResults`].
    pub fn findings(&self) -> &[CodedFinding] {
        match self {
            Self::NoResults { .. } => &[],
            Self::Analyzed(report) => &report.findings,
        }
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            Self::NoResults { .. } => None,
            Self::Analyzed(report) => Some(report),
        }
    }

    pub fn is_no_results(&self) -> bool {
        matches!(self, Self::NoResults { .. })
    }
}

/// Findings plus the request metadata shown alongside them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub findings: Vec<CodedFinding>,
    pub source: ExtractionSource,
    pub summary: String,
    pub raw_response: String,
    pub model_used: Option<String>,
    pub text_length: Option<u64>,
}

impl AnalysisReport {
    pub fn model_label(&self) -> &str {
        self.model_used.as_deref().unwrap_or(DEFAULT_MODEL_LABEL)
    }

    /// Text used by copy and export when there are no findings:
    /// raw response, then summary, then [`NO_CODES_FOUND`].
    pub fn fallback_text(&self) -> &str {
        [self.raw_response.as_str(), self.summary.as_str()]
            .into_iter()
            .find(|text| !text.trim().is_empty())
            .unwrap_or(NO_CODES_FOUND)
    }
}
