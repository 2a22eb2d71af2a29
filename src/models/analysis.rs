//! Analysis service payloads.
//!
//! The analysis endpoint returns loosely shaped JSON: the nested `analysis`
//! object may carry `icd_codes` or `icdCodes`, and `summary`/`raw_response`
//! may hold prose, markdown, or stringified JSON. The payload is kept as a
//! `serde_json::Value` and read through tolerant accessors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field names under which the code array may appear, in priority order.
pub const CODE_ARRAY_FIELDS: &[&str] = &["icd_codes", "icdCodes"];

/// Untyped response from `POST /analyze-openai`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAnalysisResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RawAnalysisResponse {
    /// Parse a response from arbitrary JSON, tolerating unexpected field types.
    pub fn from_value(value: Value) -> Self {
        let success = value.get("success").and_then(Value::as_bool);
        let model_used = value
            .get("model_used")
            .and_then(Value::as_str)
            .map(str::to_string);
        let text_length = value.get("text_length").and_then(Value::as_u64);
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string);
        let analysis = value.get("analysis").cloned().filter(|a| !a.is_null());

        Self {
            success,
            model_used,
            text_length,
            analysis,
            error,
        }
    }

    /// Whether the service reported success and returned an analysis object.
    pub fn is_success(&self) -> bool {
        self.success == Some(true) && self.analysis.is_some()
    }

    /// Free-text summary, or empty.
    pub fn summary(&self) -> &str {
        self.analysis_str("summary")
    }

    /// Unparsed model output, or empty.
    pub fn raw_response(&self) -> &str {
        self.analysis_str("raw_response")
    }

    /// The structured code array, if present under any known alias.
    pub fn code_array(&self) -> Option<&[Value]> {
        self.analysis.as_ref().and_then(code_array_in)
    }

    fn analysis_str(&self, key: &str) -> &str {
        self.analysis
            .as_ref()
            .and_then(|a| a.get(key))
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

/// Find the first non-null code array in a JSON object.
///
/// Aliases are checked in order; an alias holding an empty array still wins
/// over later aliases, matching how the service shapes its payloads.
pub fn code_array_in(object: &Value) -> Option<&[Value]> {
    CODE_ARRAY_FIELDS
        .iter()
        .find_map(|field| object.get(*field).and_then(Value::as_array))
        .map(Vec::as_slice)
}

/// Response from `POST /reinit`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReinitResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_reads_fields() {
        let response = RawAnalysisResponse::from_value(json!({
            "success": true,
            "model_used": "gpt-4o",
            "text_length": 120,
            "analysis": {"summary": "Diabetes", "raw_response": "E11.9: Type 2"}
        }));
        assert!(response.is_success());
        assert_eq!(response.model_used.as_deref(), Some("gpt-4o"));
        assert_eq!(response.text_length, Some(120));
        assert_eq!(response.summary(), "Diabetes");
        assert_eq!(response.raw_response(), "E11.9: Type 2");
    }

    #[test]
    fn test_tolerates_wrong_types() {
        let response = RawAnalysisResponse::from_value(json!({
            "success": "yes",
            "analysis": {"summary": 42, "icd_codes": "none"}
        }));
        assert!(!response.is_success());
        assert_eq!(response.summary(), "");
        assert!(response.code_array().is_none());
    }

    #[test]
    fn test_code_array_alias() {
        let response = RawAnalysisResponse::from_value(json!({
            "success": true,
            "analysis": {"icdCodes": [{"code": "I10"}]}
        }));
        assert_eq!(response.code_array().map(|a| a.len()), Some(1));
    }

    #[test]
    fn test_missing_analysis_is_not_success() {
        let response = RawAnalysisResponse::from_value(json!({"success": true}));
        assert!(!response.is_success());
    }
}
