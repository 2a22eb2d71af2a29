//! Scan workflow: health probe, OCR, then analysis.

use std::path::Path;

use tracing::{info, warn};

use super::state::{RequestKind, SessionEvent, SessionState};
use crate::http_client::DocumentService;
use crate::normalize::Normalizer;

/// Run a full scan of `path`, threading every step through the session
/// state. `observe` sees each intermediate state, e.g. to update progress.
///
/// Failures end the workflow early and are recorded as notifications.
pub async fn scan_document<S>(
    service: &S,
    normalizer: &Normalizer,
    path: &Path,
    state: SessionState,
    mut observe: impl FnMut(&SessionState),
) -> SessionState
where
    S: DocumentService + ?Sized,
{
    let mut state = state.apply(SessionEvent::FileSelected(path.to_path_buf()));

    let health = service.check_health().await;
    if !health.success {
        warn!("{}", health.message);
    }
    state = state.apply(SessionEvent::HealthChecked(health));

    state = state.apply(SessionEvent::RequestStarted(RequestKind::Extraction));
    observe(&state);
    state = match service.extract_text(path).await {
        Ok(ocr) => state.apply(SessionEvent::ExtractionCompleted(ocr)),
        Err(e) => return state.apply(SessionEvent::RequestFailed(e.to_string())),
    };
    observe(&state);

    let Some(text) = state.extracted_text() else {
        info!("No text extracted from {}; skipping analysis", path.display());
        return state;
    };

    state = state.apply(SessionEvent::RequestStarted(RequestKind::Analysis));
    observe(&state);
    state = match service.analyze_text(&text).await {
        Ok(raw) => state.apply(SessionEvent::AnalysisCompleted(normalizer.normalize(&raw))),
        Err(e) => state.apply(SessionEvent::RequestFailed(e.to_string())),
    };
    observe(&state);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HealthStatus, ServiceError};
    use crate::models::{OcrResult, RawAnalysisResponse};
    use crate::session::NotificationLevel;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    struct MockService {
        ocr: Value,
        analysis: Option<Value>,
        analyzed: Mutex<Vec<String>>,
    }

    impl MockService {
        fn new(ocr: Value, analysis: Option<Value>) -> Self {
            Self {
                ocr,
                analysis,
                analyzed: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DocumentService for MockService {
        async fn check_health(&self) -> HealthStatus {
            HealthStatus {
                success: true,
                message: "Service is running".to_string(),
            }
        }

        async fn extract_text(&self, _path: &Path) -> Result<OcrResult, ServiceError> {
            Ok(OcrResult::from_value(self.ocr.clone()))
        }

        async fn analyze_text(&self, text: &str) -> Result<RawAnalysisResponse, ServiceError> {
            self.analyzed.lock().unwrap().push(text.to_string());
            match &self.analysis {
                Some(body) => Ok(RawAnalysisResponse::from_value(body.clone())),
                None => Err(ServiceError::Server {
                    status: 500,
                    message: "OpenAI API key not configured".to_string(),
                }),
            }
        }
    }

    fn ocr_body() -> Value {
        json!({
            "success": true,
            "results": [
                {"text": "Assessment:", "confidence": 0.99, "bbox": []},
                {"text": "I10 hypertension, E11.9 diabetes", "confidence": 0.95, "bbox": []}
            ]
        })
    }

    #[tokio::test]
    async fn test_scan_runs_ocr_then_analysis() {
        let service = MockService::new(
            ocr_body(),
            Some(json!({
                "success": true,
                "analysis": {"icd_codes": [{"code": "I10", "description": "Essential hypertension"}]}
            })),
        );
        let mut seen = Vec::new();
        let state = scan_document(
            &service,
            &Normalizer::default(),
            Path::new("visit.png"),
            SessionState::new(),
            |s| seen.push(s.pending),
        )
        .await;

        assert!(state.is_connected());
        assert!(state.pending.is_none());
        assert_eq!(state.analysis.as_ref().unwrap().findings().len(), 1);
        assert_eq!(
            service.analyzed.lock().unwrap().as_slice(),
            ["Assessment:\nI10 hypertension, E11.9 diabetes"]
        );
        assert_eq!(
            seen,
            vec![
                Some(RequestKind::Extraction),
                None,
                Some(RequestKind::Analysis),
                None
            ]
        );
    }

    #[tokio::test]
    async fn test_scan_skips_analysis_without_text() {
        let service = MockService::new(json!({"success": false, "error": "bad image"}), None);
        let state = scan_document(
            &service,
            &Normalizer::default(),
            Path::new("blank.png"),
            SessionState::new(),
            |_| {},
        )
        .await;

        assert!(service.analyzed.lock().unwrap().is_empty());
        assert!(state.analysis.is_none());
        assert_eq!(state.notification.unwrap().message, "bad image");
    }

    #[tokio::test]
    async fn test_scan_records_analysis_failure() {
        let service = MockService::new(ocr_body(), None);
        let state = scan_document(
            &service,
            &Normalizer::default(),
            Path::new("visit.png"),
            SessionState::new(),
            |_| {},
        )
        .await;

        let note = state.notification.unwrap();
        assert_eq!(note.level, NotificationLevel::Error);
        assert_eq!(
            note.message,
            "Server error: 500 - OpenAI API key not configured"
        );
        assert!(state.ocr.is_some());
    }
}
