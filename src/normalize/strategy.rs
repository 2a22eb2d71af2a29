//! Extraction strategy abstraction.
//!
//! Each strategy is one independent way of recovering findings from an
//! analysis payload. The normalizer runs them in order and keeps the first
//! non-empty result; results are never merged across strategies.

use serde::Serialize;

use super::pattern::CodePattern;
use crate::models::{CodedFinding, RawAnalysisResponse};

/// Which strategy produced a set of findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    /// The service returned a code array.
    Structured,
    /// A code array was recovered from JSON embedded in free text.
    EmbeddedJson,
    /// Codes were scraped from prose.
    FreeText,
    /// Nothing was found.
    None,
}

impl ExtractionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::EmbeddedJson => "embedded_json",
            Self::FreeText => "free_text",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a strategy gets to look at.
pub struct ExtractionInput<'a> {
    pub response: &'a RawAnalysisResponse,
    pub pattern: &'a CodePattern,
}

impl<'a> ExtractionInput<'a> {
    pub fn new(response: &'a RawAnalysisResponse, pattern: &'a CodePattern) -> Self {
        Self { response, pattern }
    }

    /// Text scanned by the free-text passes: `raw_response`, or `summary`
    /// when the raw response is empty.
    pub fn free_text(&self) -> &'a str {
        let raw = self.response.raw_response();
        if raw.is_empty() {
            self.response.summary()
        } else {
            raw
        }
    }
}

/// One way of turning an analysis payload into findings.
pub trait ExtractionStrategy: Send + Sync {
    /// Source tag attached to findings from this strategy.
    fn source(&self) -> ExtractionSource;

    /// Extract findings, or `None` when this strategy has nothing to offer.
    /// Must not fail: malformed input yields `None`.
    fn extract(&self, input: &ExtractionInput<'_>) -> Option<Vec<CodedFinding>>;
}
