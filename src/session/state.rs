//! Session state and its transitions.

use std::path::PathBuf;

use crate::http_client::HealthStatus;
use crate::models::OcrResult;
use crate::normalize::NormalizedAnalysis;

/// Layout for the findings view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ViewMode {
    /// One card per finding.
    #[default]
    List,
    /// Aligned columns.
    Table,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Table => "table",
        }
    }
}

impl std::fmt::Display for ViewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request the session is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Extraction,
    Analysis,
}

impl RequestKind {
    /// Progress label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Extraction => "Extracting text",
            Self::Analysis => "Analyzing text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Things that happen to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    HealthChecked(HealthStatus),
    /// A new document was chosen. Previous results and toggles are dropped.
    FileSelected(PathBuf),
    RequestStarted(RequestKind),
    ExtractionCompleted(OcrResult),
    AnalysisCompleted(NormalizedAnalysis),
    RequestFailed(String),
    ViewModeChanged(ViewMode),
    TextOnlyToggled,
}

/// Everything the view is rendered from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub selected_file: Option<PathBuf>,
    pub connection: Option<HealthStatus>,
    pub ocr: Option<OcrResult>,
    pub analysis: Option<NormalizedAnalysis>,
    pub view_mode: ViewMode,
    /// Show only the joined OCR text instead of per-line detail.
    pub text_only: bool,
    pub pending: Option<RequestKind>,
    pub notification: Option<Notification>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event, producing the next state.
    pub fn apply(self, event: SessionEvent) -> Self {
        match event {
            SessionEvent::HealthChecked(status) => Self {
                connection: Some(status),
                ..self
            },
            SessionEvent::FileSelected(path) => Self {
                selected_file: Some(path),
                connection: self.connection,
                ..Self::default()
            },
            SessionEvent::RequestStarted(kind) => {
                if !self.can_submit() {
                    return self;
                }
                Self {
                    pending: Some(kind),
                    notification: None,
                    ..self
                }
            }
            SessionEvent::ExtractionCompleted(ocr) => {
                let notification = if ocr.success {
                    Notification::info(format!("Extracted {} text lines", ocr.results.len()))
                } else {
                    Notification::error(
                        ocr.error
                            .clone()
                            .unwrap_or_else(|| "No results to display".to_string()),
                    )
                };
                Self {
                    ocr: Some(ocr),
                    analysis: None,
                    pending: None,
                    notification: Some(notification),
                    ..self
                }
            }
            SessionEvent::AnalysisCompleted(analysis) => {
                let notification = match &analysis {
                    NormalizedAnalysis::NoResults { error } => Notification::error(
                        error
                            .clone()
                            .unwrap_or_else(|| "No analysis results".to_string()),
                    ),
                    NormalizedAnalysis::Analyzed(report) => {
                        Notification::info(format!("Found {} codes", report.findings.len()))
                    }
                };
                Self {
                    analysis: Some(analysis),
                    pending: None,
                    notification: Some(notification),
                    ..self
                }
            }
            SessionEvent::RequestFailed(message) => Self {
                pending: None,
                notification: Some(Notification::error(message)),
                ..self
            },
            SessionEvent::ViewModeChanged(view_mode) => Self { view_mode, ..self },
            SessionEvent::TextOnlyToggled => Self {
                text_only: !self.text_only,
                ..self
            },
        }
    }

    /// Whether a new request may start.
    pub fn can_submit(&self) -> bool {
        self.selected_file.is_some() && self.pending.is_none()
    }

    /// Text available for analysis, if extraction produced any.
    pub fn extracted_text(&self) -> Option<String> {
        self.ocr
            .as_ref()
            .filter(|ocr| ocr.success)
            .map(OcrResult::all_text)
            .filter(|text| !text.trim().is_empty())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(|c| c.success)
    }
}
