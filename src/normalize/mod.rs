//! Analysis response normalization.
//!
//! Turns a loosely shaped analysis payload into an ordered, de-duplicated
//! list of [`CodedFinding`]s. Extraction strategies are tried in order and
//! the first one producing findings wins; descriptions left empty are then
//! backfilled from the free text.

mod aliases;
mod free_text;
mod pattern;
mod report;
mod strategy;
mod structured;

pub use aliases::{first_text, DESCRIPTION_FIELDS, STATUS_FIELDS};
pub use free_text::{description_map, scan_lines, sweep_inline, FreeTextStrategy};
pub use pattern::{CodePattern, PatternError, DEFAULT_EXCLUDED_LETTERS, SEPARATORS};
pub use report::{AnalysisReport, NormalizedAnalysis, DEFAULT_MODEL_LABEL, NO_CODES_FOUND};
pub use strategy::{ExtractionInput, ExtractionSource, ExtractionStrategy};
pub use structured::{map_code_entries, parse_embedded_json, EmbeddedJsonStrategy, StructuredStrategy};

use std::collections::HashSet;

use tracing::debug;

use crate::models::{CodedFinding, RawAnalysisResponse};

/// Placeholder for findings whose description could not be resolved.
pub const NO_DESCRIPTION: &str = "(no description)";

/// Strategies in priority order: structured, embedded JSON, free text.
pub fn default_strategies() -> Vec<Box<dyn ExtractionStrategy>> {
    vec![
        Box::new(StructuredStrategy),
        Box::new(EmbeddedJsonStrategy),
        Box::new(FreeTextStrategy),
    ]
}

/// Runs extraction strategies over analysis responses.
pub struct Normalizer {
    pattern: CodePattern,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Normalizer {
    pub fn new(pattern: CodePattern) -> Self {
        Self::with_strategies(pattern, default_strategies())
    }

    /// Use a custom strategy list. Order is priority order.
    pub fn with_strategies(
        pattern: CodePattern,
        strategies: Vec<Box<dyn ExtractionStrategy>>,
    ) -> Self {
        Self {
            pattern,
            strategies,
        }
    }

    pub fn pattern(&self) -> &CodePattern {
        &self.pattern
    }

    /// Extract findings regardless of the success flag.
    ///
    /// Returns the findings of the first strategy with a non-empty result,
    /// de-duplicated by code and with every description resolved.
    pub fn extract(&self, response: &RawAnalysisResponse) -> (Vec<CodedFinding>, ExtractionSource) {
        let input = ExtractionInput::new(response, &self.pattern);

        for strategy in &self.strategies {
            let Some(findings) = strategy.extract(&input) else {
                continue;
            };
            if findings.is_empty() {
                continue;
            }

            let mut findings = dedupe(findings);
            self.backfill(&mut findings, input.free_text());
            debug!(
                "Extracted {} findings via {}",
                findings.len(),
                strategy.source()
            );
            return (findings, strategy.source());
        }

        debug!("No findings extracted");
        (Vec::new(), ExtractionSource::None)
    }

    /// Normalize a response for display and export.
    pub fn normalize(&self, response: &RawAnalysisResponse) -> NormalizedAnalysis {
        if !response.is_success() {
            return NormalizedAnalysis::NoResults {
                error: response.error.clone(),
            };
        }

        let (findings, source) = self.extract(response);
        NormalizedAnalysis::Analyzed(AnalysisReport {
            findings,
            source,
            summary: response.summary().to_string(),
            raw_response: response.raw_response().to_string(),
            model_used: response.model_used.clone(),
            text_length: response.text_length,
        })
    }

    fn backfill(&self, findings: &mut [CodedFinding], text: &str) {
        if findings.iter().all(CodedFinding::has_description) {
            return;
        }

        let descriptions = description_map(text, &self.pattern);
        for finding in findings.iter_mut().filter(|f| !f.has_description()) {
            finding.description = descriptions
                .get(&finding.code)
                .cloned()
                .unwrap_or_else(|| NO_DESCRIPTION.to_string());
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(CodePattern::default())
    }
}

/// Keep the first finding for each code.
fn dedupe(findings: Vec<CodedFinding>) -> Vec<CodedFinding> {
    let mut seen = HashSet::new();
    findings
        .into_iter()
        .filter(|finding| seen.insert(finding.code.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confidence, Status};
    use serde_json::{json, Value};

    fn response(analysis: Value) -> RawAnalysisResponse {
        RawAnalysisResponse::from_value(json!({
            "success": true,
            "model_used": "gpt-4o-mini",
            "text_length": 512,
            "analysis": analysis
        }))
    }

    #[test]
    fn test_structured_wins_over_free_text() {
        let normalizer = Normalizer::default();
        let response = response(json!({
            "icd_codes": [
                {"code": "i10", "description": "Essential hypertension", "status": "historical"},
                {"code": "E11.9", "desc": "Type 2 diabetes", "confidence": "low"}
            ],
            "raw_response": "K21.9: GERD"
        }));
        let (findings, source) = normalizer.extract(&response);
        assert_eq!(source, ExtractionSource::Structured);
        assert_eq!(
            findings,
            vec![
                CodedFinding::new("I10", "Essential hypertension").with_status(Status::Historical),
                CodedFinding::new("E11.9", "Type 2 diabetes").with_confidence(Confidence::Low),
            ]
        );
    }

    #[test]
    fn test_structured_duplicates_keep_first() {
        let normalizer = Normalizer::default();
        let response = response(json!({
            "icd_codes": [
                {"code": "I10", "description": "First"},
                {"code": "i10", "description": "Second"}
            ]
        }));
        let (findings, _) = normalizer.extract(&response);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].description, "First");
    }

    #[test]
    fn test_backfill_from_free_text() {
        let normalizer = Normalizer::default();
        let response = response(json!({
            "icd_codes": [{"code": "I10"}, {"code": "Z79.4"}],
            "raw_response": "I10: Essential hypertension"
        }));
        let (findings, _) = normalizer.extract(&response);
        assert_eq!(findings[0].description, "Essential hypertension");
        assert_eq!(findings[1].description, NO_DESCRIPTION);
    }

    #[test]
    fn test_inline_code_without_description_gets_placeholder() {
        let normalizer = Normalizer::default();
        let response = response(json!({"summary": "Billing code E78.5 applies"}));
        let (findings, source) = normalizer.extract(&response);
        assert_eq!(source, ExtractionSource::FreeText);
        assert_eq!(findings[0].code, "E78.5");
        assert_eq!(findings[0].description, NO_DESCRIPTION);
    }

    #[test]
    fn test_nothing_found_is_analyzed_and_empty() {
        let normalizer = Normalizer::default();
        let analysis = normalizer.normalize(&response(json!({
            "summary": "No billable conditions identified."
        })));
        let report = analysis.report().unwrap();
        assert!(report.findings.is_empty());
        assert_eq!(report.source, ExtractionSource::None);
        assert_eq!(report.model_label(), "gpt-4o-mini");
        assert_eq!(report.text_length, Some(512));
    }

    #[test]
    fn test_failure_is_no_results() {
        let normalizer = Normalizer::default();
        let analysis = normalizer.normalize(&RawAnalysisResponse::from_value(json!({
            "success": false,
            "error": "OpenAI API key not configured"
        })));
        assert_eq!(
            analysis,
            NormalizedAnalysis::NoResults {
                error: Some("OpenAI API key not configured".to_string())
            }
        );
    }

    #[test]
    fn test_custom_strategy_list() {
        let normalizer =
            Normalizer::with_strategies(CodePattern::default(), vec![Box::new(FreeTextStrategy)]);
        let response = response(json!({
            "icd_codes": [{"code": "I10", "description": "Hypertension"}],
            "raw_response": "J45.909: Asthma"
        }));
        let (findings, source) = normalizer.extract(&response);
        assert_eq!(source, ExtractionSource::FreeText);
        assert_eq!(findings[0].code, "J45.909");
    }

    #[test]
    fn test_configured_exclusion_is_honoured() {
        let normalizer = Normalizer::new(CodePattern::new("").unwrap());
        let response = response(json!({"raw_response": "U07.1: COVID-19"}));
        let (findings, _) = normalizer.extract(&response);
        assert_eq!(findings[0].code, "U07.1");

        let (findings, _) = Normalizer::default().extract(&response);
        assert!(findings.is_empty());
    }
}
