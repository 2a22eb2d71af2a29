//! OCR service payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single recognised text region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub bbox: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_region: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Parsed response from `POST /ocr`.
///
/// The raw JSON is retained so it can be exported verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrResult {
    pub success: bool,
    pub results: Vec<OcrLine>,
    pub file_type: Option<String>,
    pub processing_time: Option<f64>,
    pub error: Option<String>,
    raw: Value,
}

/// Summary figures shown alongside extracted text.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrStats {
    pub file_type: String,
    pub line_count: usize,
    pub char_count: usize,
    pub processing_time: Option<f64>,
}

impl OcrResult {
    /// Build from the service's JSON body. Malformed entries in `results`
    /// are skipped rather than failing the whole response.
    pub fn from_value(value: Value) -> Self {
        let success = value
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let results = value
            .get("results")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();
        let file_type = value
            .get("file_type")
            .and_then(Value::as_str)
            .map(str::to_string);
        let processing_time = value.get("processing_time").and_then(Value::as_f64);
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            success,
            results,
            file_type,
            processing_time,
            error,
            raw: value,
        }
    }

    /// The response exactly as received.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Non-blank text lines joined with newlines.
    pub fn all_text(&self) -> String {
        self.results
            .iter()
            .map(|line| line.text.as_str())
            .filter(|text| !text.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Pages present in the result, in first-seen order.
    pub fn pages(&self) -> Vec<u32> {
        let mut pages = Vec::new();
        for page in self.results.iter().filter_map(|line| line.page) {
            if !pages.contains(&page) {
                pages.push(page);
            }
        }
        pages
    }

    pub fn stats(&self) -> OcrStats {
        OcrStats {
            file_type: self
                .file_type
                .as_deref()
                .map(str::to_uppercase)
                .unwrap_or_else(|| "Unknown".to_string()),
            line_count: self.results.len(),
            char_count: self.all_text().chars().count(),
            processing_time: self.processing_time,
        }
    }
}
