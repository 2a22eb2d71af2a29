//! Terminal rendering of session state.

use crate::models::{CodedFinding, OcrResult};
use crate::normalize::{AnalysisReport, NormalizedAnalysis};

use super::state::{NotificationLevel, SessionState, ViewMode};

const NO_CODES: &str = "No ICD-10 codes found";

/// Render the whole session view.
pub fn render(state: &SessionState) -> String {
    let mut out = Vec::new();

    if let Some(path) = &state.selected_file {
        out.push(format!("File: {}", path.display()));
    }
    if let Some(status) = &state.connection {
        let label = if status.success {
            "connected"
        } else {
            "disconnected"
        };
        out.push(format!("Service: {} ({})", label, status.message));
    }
    if let Some(kind) = state.pending {
        out.push(format!("{}...", kind.label()));
    }
    if let Some(note) = &state.notification {
        let prefix = match note.level {
            NotificationLevel::Info => "",
            NotificationLevel::Error => "Error: ",
        };
        out.push(format!("{}{}", prefix, note.message));
    }

    if let Some(ocr) = &state.ocr {
        out.push(String::new());
        out.push(render_ocr(ocr, state.text_only));
    }

    if let Some(analysis) = &state.analysis {
        out.push(String::new());
        out.push(render_analysis(analysis, state.view_mode));
    }

    out.join("\n")
}

/// OCR stats followed by either the joined text or per-line detail.
pub fn render_ocr(ocr: &OcrResult, text_only: bool) -> String {
    if !ocr.success {
        return "No results to display".to_string();
    }

    let stats = ocr.stats();
    let mut out = vec![format!(
        "Type: {} | Lines: {} | Characters: {}{}",
        stats.file_type,
        stats.line_count,
        stats.char_count,
        stats
            .processing_time
            .map(|t| format!(" | Time: {:.2}s", t))
            .unwrap_or_default()
    )];

    if text_only {
        out.push(ocr.all_text());
    } else {
        for line in &ocr.results {
            let confidence = line
                .confidence
                .map(|c| format!("{:>5.1}%", c * 100.0))
                .unwrap_or_else(|| "    - ".to_string());
            match line.page {
                Some(page) => out.push(format!("{} p{} {}", confidence, page, line.text)),
                None => out.push(format!("{} {}", confidence, line.text)),
            }
        }
    }

    out.join("\n")
}

/// Analysis metadata, summary and findings in the chosen layout.
pub fn render_analysis(analysis: &NormalizedAnalysis, view: ViewMode) -> String {
    match analysis {
        NormalizedAnalysis::NoResults { error } => match error {
            Some(error) => format!("No analysis results: {}", error),
            None => "No analysis results".to_string(),
        },
        NormalizedAnalysis::Analyzed(report) => render_report(report, view),
    }
}

fn render_report(report: &AnalysisReport, view: ViewMode) -> String {
    let text_length = report
        .text_length
        .map_or_else(|| "Unknown".to_string(), |n| n.to_string());
    let mut out = vec![format!(
        "Codes: {} | Model: {} | Text length: {} chars",
        report.findings.len(),
        report.model_label(),
        text_length
    )];

    if !report.summary.trim().is_empty() {
        out.push(format!("Summary: {}", report.summary.trim()));
    }
    out.push(String::new());
    out.push(render_findings(&report.findings, view));
    out.join("\n")
}

pub fn render_findings(findings: &[CodedFinding], view: ViewMode) -> String {
    if findings.is_empty() {
        return NO_CODES.to_string();
    }
    match view {
        ViewMode::List => render_list(findings),
        ViewMode::Table => render_table(findings),
    }
}

/// One card per finding.
pub fn render_list(findings: &[CodedFinding]) -> String {
    findings
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let mut card = vec![format!("{}. {}  {}", i + 1, f.code, f.description)];

            let mut tags = Vec::new();
            if let Some(status) = f.status {
                tags.push(format!("Status: {}", status.label()));
            }
            if let Some(confidence) = f.confidence {
                tags.push(format!("Confidence: {}", confidence.label()));
            }
            if !tags.is_empty() {
                card.push(format!("   {}", tags.join(" | ")));
            }
            if let Some(explanation) = &f.explanation {
                card.push(format!("   {}", explanation));
            }
            card.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Aligned columns: code, description, status, confidence.
pub fn render_table(findings: &[CodedFinding]) -> String {
    let header = ["Code", "Description", "Status", "Confidence"];
    let rows: Vec<[String; 4]> = findings
        .iter()
        .map(|f| {
            [
                f.code.clone(),
                f.description.clone(),
                f.status.map_or("-", |s| s.label()).to_string(),
                f.confidence.map_or("-", |c| c.label()).to_string(),
            ]
        })
        .collect();

    let mut widths = header.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: [&str; 4]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![format_row(header)];
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &rows {
        out.push(format_row(row.each_ref().map(String::as_str)));
    }
    out.join("\n")
}
