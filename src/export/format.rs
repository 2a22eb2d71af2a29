//! Text serializations of a finding list.
//!
//! Each target has its own defaults for missing confidence and status.

use crate::models::CodedFinding;

/// Shown in structured export for a missing status or confidence.
pub const NO_DATA: &str = "No Data";

/// `CODE: description`, one per line.
pub fn plain(findings: &[CodedFinding]) -> String {
    findings
        .iter()
        .map(|f| format!("{}: {}", f.code, f.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Copy format: code line, optional explanation, confidence (default
/// Medium). Blocks are separated by `---`.
pub fn detailed(findings: &[CodedFinding]) -> String {
    findings
        .iter()
        .map(|f| {
            let mut lines = vec![format!("{}: {}", f.code, f.description)];
            if let Some(explanation) = &f.explanation {
                lines.push(format!("Explanation: {}", explanation));
            }
            let confidence = f.confidence.map_or("Medium", |c| c.label());
            lines.push(format!("Confidence: {}", confidence));
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// Numbered export blocks separated by a blank line.
pub fn structured(findings: &[CodedFinding]) -> String {
    findings
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let mut lines = vec![
                format!("{}. Diagnosis: {}", i + 1, f.description),
                format!("Code: {}", f.code),
                format!("Status: {}", f.status.map_or(NO_DATA, |s| s.label())),
                format!("Confidence: {}", f.confidence.map_or(NO_DATA, |c| c.label())),
            ];
            if let Some(explanation) = &f.explanation {
                lines.push(format!("Explanation: {}", explanation));
            }
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
