//! Structured and embedded-JSON extraction.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::aliases::{
    first_text, CODE_FIELDS, CONFIDENCE_FIELDS, DESCRIPTION_FIELDS, EXPLANATION_FIELDS,
    STATUS_FIELDS,
};
use super::pattern::CodePattern;
use super::strategy::{ExtractionInput, ExtractionSource, ExtractionStrategy};
use crate::models::{code_array_in, CodedFinding, Confidence, Status};

/// Markdown code fence, optionally tagged `json`.
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```(?:json)?\r?\n(.*?)```").unwrap());

/// Map code entries one-to-one onto findings, preserving order.
///
/// Entries without a code, or whose code is not a single token of
/// `pattern`, are skipped. Descriptions may come back empty; the normalizer
/// backfills them.
pub fn map_code_entries(entries: &[Value], pattern: &CodePattern) -> Vec<CodedFinding> {
    entries
        .iter()
        .filter_map(|item| map_code_entry(item, pattern))
        .collect()
}

fn map_code_entry(item: &Value, pattern: &CodePattern) -> Option<CodedFinding> {
    let code = first_text(item, CODE_FIELDS)?;
    let description = first_text(item, DESCRIPTION_FIELDS).unwrap_or("");

    let mut finding = CodedFinding::new(code, description);
    if !pattern.is_code(&finding.code) {
        debug!("Skipping non-matching code entry: {:?}", code);
        return None;
    }
    finding.confidence = first_text(item, CONFIDENCE_FIELDS).and_then(|value| {
        let parsed = Confidence::from_str(value);
        if parsed.is_none() {
            debug!("Dropping unrecognised confidence for {}: {:?}", finding.code, value);
        }
        parsed
    });
    finding.status = first_text(item, STATUS_FIELDS).and_then(Status::from_str);
    finding.explanation = first_text(item, EXPLANATION_FIELDS).map(str::to_string);
    Some(finding)
}

/// Locate and parse a JSON object inside free text.
///
/// Strips a code fence if there is one, then parses the span from the
/// first `{` to the last `}`. Parse failures yield `None`.
pub fn parse_embedded_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = FENCED_BLOCK
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str());

    let slice = match (candidate.find('{'), candidate.rfind('}')) {
        (Some(start), Some(end)) if start <= end => &candidate[start..=end],
        _ => candidate,
    };

    match serde_json::from_str(slice) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("No embedded JSON recovered: {}", e);
            None
        }
    }
}

/// Uses the code array returned by the service.
pub struct StructuredStrategy;

impl ExtractionStrategy for StructuredStrategy {
    fn source(&self) -> ExtractionSource {
        ExtractionSource::Structured
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> Option<Vec<CodedFinding>> {
        let entries = input.response.code_array()?;
        Some(map_code_entries(entries, input.pattern)).filter(|findings| !findings.is_empty())
    }
}

/// Recovers a code array from JSON embedded in `raw_response`, then
/// `summary`. The first text carrying a code array is the source, even if
/// that array turns out to be empty.
pub struct EmbeddedJsonStrategy;

impl ExtractionStrategy for EmbeddedJsonStrategy {
    fn source(&self) -> ExtractionSource {
        ExtractionSource::EmbeddedJson
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> Option<Vec<CodedFinding>> {
        let response = input.response;
        let findings = [response.raw_response(), response.summary()]
            .into_iter()
            .filter_map(parse_embedded_json)
            .find_map(|parsed| {
                code_array_in(&parsed).map(|entries| map_code_entries(entries, input.pattern))
            })?;
        Some(findings).filter(|findings| !findings.is_empty())
    }
}
