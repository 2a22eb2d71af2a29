//! Copy text and file artifacts for analysis and OCR results.

pub mod format;

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, Utc};
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::models::OcrResult;
use crate::normalize::AnalysisReport;

/// Errors writing export artifacts.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize OCR results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Serialization used for a code list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeFormat {
    Plain,
    Detailed,
    Structured,
}

impl CodeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Detailed => "detailed",
            Self::Structured => "export",
        }
    }
}

impl std::fmt::Display for CodeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialize the report's findings, or fall back to its raw/summary text
/// when there are none.
pub fn codes_text(report: &AnalysisReport, format: CodeFormat) -> String {
    if report.findings.is_empty() {
        return report.fallback_text().to_string();
    }
    match format {
        CodeFormat::Plain => format::plain(&report.findings),
        CodeFormat::Detailed => format::detailed(&report.findings),
        CodeFormat::Structured => format::structured(&report.findings),
    }
}

/// `icd10_codes.txt`, or `icd10_codes_<YYYY-MM-DD>.txt` with a date.
pub fn codes_filename(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => format!("icd10_codes_{}.txt", date.format("%Y-%m-%d")),
        None => "icd10_codes.txt".to_string(),
    }
}

pub fn ocr_results_filename(timestamp_millis: i64) -> String {
    format!("paddleocr-results-{}.json", timestamp_millis)
}

/// `<stem>.txt` for the source document, or `extracted_text.txt`.
pub fn text_filename(source: Option<&Path>) -> String {
    source
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(|stem| format!("{}.txt", stem))
        .unwrap_or_else(|| "extracted_text.txt".to_string())
}

/// Writes artifacts into one output directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
    date_stamp: bool,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>, date_stamp: bool) -> Self {
        Self {
            dir: dir.into(),
            date_stamp,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.output_dir(), config.export.date_stamp)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the code list.
    pub fn write_codes(
        &self,
        report: &AnalysisReport,
        format: CodeFormat,
    ) -> Result<PathBuf, ExportError> {
        let date = self.date_stamp.then(|| Local::now().date_naive());
        self.write(&codes_filename(date), &codes_text(report, format))
    }

    /// Write the raw OCR response, pretty-printed.
    pub fn write_ocr_json(&self, ocr: &OcrResult) -> Result<PathBuf, ExportError> {
        let json = serde_json::to_string_pretty(ocr.raw())?;
        self.write(&ocr_results_filename(Utc::now().timestamp_millis()), &json)
    }

    /// Write the OCR plain text.
    pub fn write_text(&self, ocr: &OcrResult, source: Option<&Path>) -> Result<PathBuf, ExportError> {
        self.write(&text_filename(source), &ocr.all_text())
    }

    fn write(&self, filename: &str, contents: &str) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(filename);
        let io_error = |source| ExportError::Io {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(io_error)?;
        std::fs::write(&path, contents).map_err(io_error)?;
        info!("Wrote {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CodedFinding;
    use crate::normalize::ExtractionSource;
    use serde_json::json;

    fn report(findings: Vec<CodedFinding>) -> AnalysisReport {
        AnalysisReport {
            findings,
            source: ExtractionSource::FreeText,
            summary: "Patient with hypertension".to_string(),
            raw_response: String::new(),
            model_used: None,
            text_length: Some(40),
        }
    }

    #[test]
    fn test_filenames() {
        assert_eq!(codes_filename(None), "icd10_codes.txt");
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(codes_filename(Some(date)), "icd10_codes_2024-03-09.txt");
        assert_eq!(
            ocr_results_filename(1_700_000_000_123),
            "paddleocr-results-1700000000123.json"
        );
        assert_eq!(text_filename(Some(Path::new("/scans/intake.pdf"))), "intake.txt");
        assert_eq!(text_filename(None), "extracted_text.txt");
    }

    #[test]
    fn test_codes_text_falls_back_when_empty() {
        let report = report(Vec::new());
        assert_eq!(codes_text(&report, CodeFormat::Structured), "Patient with hypertension");
    }

    #[test]
    fn test_write_codes() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("out"), false);
        let report = report(vec![CodedFinding::new("I10", "Essential hypertension")]);

        let path = exporter.write_codes(&report, CodeFormat::Plain).unwrap();
        assert_eq!(path.file_name().unwrap(), "icd10_codes.txt");
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "I10: Essential hypertension"
        );
    }

    #[test]
    fn test_write_codes_date_stamped() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path(), true);
        let path = exporter
            .write_codes(&report(Vec::new()), CodeFormat::Plain)
            .unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("icd10_codes_"));
        assert_eq!(name.len(), "icd10_codes_2024-01-01.txt".len());
    }

    #[test]
    fn test_write_ocr_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path(), false);
        let ocr = OcrResult::from_value(json!({
            "success": true,
            "results": [
                {"text": "Chief complaint", "confidence": 0.98, "bbox": []},
                {"text": "Hypertension", "confidence": 0.95, "bbox": []}
            ]
        }));

        let json_path = exporter.write_ocr_json(&ocr).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(&written, ocr.raw());

        let text_path = exporter
            .write_text(&ocr, Some(Path::new("visit.png")))
            .unwrap();
        assert_eq!(text_path.file_name().unwrap(), "visit.txt");
        assert_eq!(
            std::fs::read_to_string(text_path).unwrap(),
            "Chief complaint\nHypertension"
        );
    }
}
