//! Coded findings produced by response normalization.

use serde::{Deserialize, Serialize};

/// Confidence reported for a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Title-cased label used in copy and export output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" | "med" | "moderate" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Clinical status of a coded condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Review,
    Historical,
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Review => "review",
            Self::Historical => "historical",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable label. `historical` renders as "History".
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Review => "Review",
            Self::Historical => "History",
            Self::Unknown => "Unknown",
        }
    }

    /// Parse an upstream status value. Unrecognised non-empty values map to
    /// `Unknown`; empty values yield `None`.
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        let status = match normalized.as_str() {
            "active" | "current" | "chronic" => Self::Active,
            "review" | "need review" | "needs review" | "needs_review" | "need_review"
            | "pending review" => Self::Review,
            "historical" | "history" | "resolved" | "past" => Self::Historical,
            _ => Self::Unknown,
        };
        Some(status)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One coded diagnosis or condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodedFinding {
    /// Uppercased code, e.g. `E11.9`.
    pub code: String,
    /// Resolved description; never empty once normalization completes.
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl CodedFinding {
    /// Create a finding with just a code and description.
    ///
    /// Runs of whitespace in the description, newlines included, collapse to
    /// single spaces so each finding serializes onto one line.
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into().trim().to_uppercase(),
            description: description
                .into()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
            confidence: None,
            status: None,
            explanation: None,
        }
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Whether the description still needs to be resolved.
    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_parsing() {
        assert_eq!(Confidence::from_str("HIGH"), Some(Confidence::High));
        assert_eq!(Confidence::from_str(" medium "), Some(Confidence::Medium));
        assert_eq!(Confidence::from_str("low"), Some(Confidence::Low));
        assert_eq!(Confidence::from_str("certain"), None);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(Status::from_str("Active"), Some(Status::Active));
        assert_eq!(Status::from_str("need review"), Some(Status::Review));
        assert_eq!(Status::from_str("historical"), Some(Status::Historical));
        assert_eq!(Status::from_str("ruled out"), Some(Status::Unknown));
        assert_eq!(Status::from_str("  "), None);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(Status::Historical.label(), "History");
        assert_eq!(Status::Review.label(), "Review");
        assert_eq!(Status::Active.label(), "Active");
    }

    #[test]
    fn test_new_uppercases_code() {
        let finding = CodedFinding::new(" e11.9 ", " Type 2 diabetes ");
        assert_eq!(finding.code, "E11.9");
        assert_eq!(finding.description, "Type 2 diabetes");
        assert!(finding.has_description());
    }

    #[test]
    fn test_new_flattens_multiline_description() {
        let finding = CodedFinding::new("I10", "Hypertension\nE11.9 diabetes\r\n\tnoted ");
        assert_eq!(finding.description, "Hypertension E11.9 diabetes noted");
    }
}
