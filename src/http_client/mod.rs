//! HTTP client for the OCR and analysis service.
//!
//! Every call is a single independent request: no retries, no caching.

mod error;

pub use error::ServiceError;

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::models::{OcrResult, RawAnalysisResponse, ReinitResponse};

/// Outcome of a health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub success: bool,
    pub message: String,
}

/// Operations the session workflow needs from the service.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Probe the service. Never fails.
    async fn check_health(&self) -> HealthStatus;

    /// OCR a document on disk.
    async fn extract_text(&self, path: &Path) -> Result<OcrResult, ServiceError>;

    /// Ask the analysis endpoint for codes.
    async fn analyze_text(&self, text: &str) -> Result<RawAnalysisResponse, ServiceError>;
}

/// Client for one service endpoint.
#[derive(Clone)]
pub struct ServiceClient {
    client: Client,
    endpoint: String,
}

impl ServiceClient {
    /// Create a client for the configured endpoint.
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        let endpoint = config.endpoint.trim().trim_end_matches('/').to_string();
        Url::parse(&endpoint)
            .map_err(|e| ServiceError::request(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ServiceError::request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    /// Base endpoint without a trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    /// OCR a document on disk.
    pub async fn extract_text(&self, path: &Path) -> Result<OcrResult, ServiceError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ServiceError::request(format!("Failed to read {}: {}", path.display(), e))
        })?;
        info!("Extracting text from {} ({} bytes)", path.display(), bytes.len());
        self.extract_bytes(&bytes).await
    }

    /// OCR an in-memory document. The raw bytes are base64-encoded with no
    /// `data:` prefix.
    pub async fn extract_bytes(&self, bytes: &[u8]) -> Result<OcrResult, ServiceError> {
        match infer::get(bytes) {
            Some(kind) if is_supported_mime(kind.mime_type()) => {
                debug!("Detected document type {}", kind.mime_type());
            }
            Some(kind) => warn!(
                "Document type {} is neither an image nor a PDF; the service may reject it",
                kind.mime_type()
            ),
            None => warn!("Could not detect document type; sending anyway"),
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let body = self.post_json("ocr", &json!({ "file": encoded })).await?;
        let result = OcrResult::from_value(body);
        debug!("OCR returned {} lines", result.results.len());
        Ok(result)
    }

    /// Submit text for code analysis. Blank text is rejected locally.
    pub async fn analyze_text(&self, text: &str) -> Result<RawAnalysisResponse, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::request("No text to analyze"));
        }

        info!("Analyzing {} characters of text", text.chars().count());
        let body = self.post_json("analyze-openai", &json!({ "text": text })).await?;
        Ok(RawAnalysisResponse::from_value(body))
    }

    /// Ask the service to reinitialize its OCR engine.
    pub async fn reinitialize(&self) -> Result<ReinitResponse, ServiceError> {
        let body = self.post_json("reinit", &json!({})).await?;
        Ok(ReinitResponse {
            success: body.get("success").and_then(Value::as_bool).unwrap_or(false),
            message: body
                .get("message")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// Probe `/health`. Any 2xx counts as connected.
    pub async fn check_health(&self) -> HealthStatus {
        match self.client.get(self.url("health")).send().await {
            Ok(resp) if resp.status().is_success() => HealthStatus {
                success: true,
                message: "Service is running".to_string(),
            },
            Ok(resp) => {
                let status = resp.status().as_u16();
                let body = resp.bytes().await.unwrap_or_default();
                HealthStatus {
                    success: false,
                    message: format!(
                        "Connection test failed: {}",
                        ServiceError::from_status(status, &body)
                    ),
                }
            }
            Err(e) if e.is_connect() => {
                debug!("Health probe could not connect: {}", e);
                HealthStatus {
                    success: false,
                    message: format!(
                        "Cannot connect to OCR service. Please ensure it's running on {}",
                        self.endpoint
                    ),
                }
            }
            Err(e) => HealthStatus {
                success: false,
                message: format!("Connection test failed: {}", e),
            },
        }
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ServiceError> {
        let url = self.url(path);
        debug!("POST {}", url);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("Request to {} failed: {}", url, e);
                ServiceError::from_transport(&e, &self.endpoint)
            })?;
        self.read_json(resp).await
    }

    async fn read_json(&self, resp: Response) -> Result<Value, ServiceError> {
        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ServiceError::from_transport(&e, &self.endpoint))?;

        if !status.is_success() {
            return Err(ServiceError::from_status(status.as_u16(), &body));
        }

        serde_json::from_slice(&body).map_err(|e| ServiceError::Server {
            status: status.as_u16(),
            message: format!("malformed response body: {}", e),
        })
    }
}

fn is_supported_mime(mime: &str) -> bool {
    mime.starts_with("image/") || mime == "application/pdf"
}

#[async_trait]
impl DocumentService for ServiceClient {
    async fn check_health(&self) -> HealthStatus {
        ServiceClient::check_health(self).await
    }

    async fn extract_text(&self, path: &Path) -> Result<OcrResult, ServiceError> {
        ServiceClient::extract_text(self, path).await
    }

    async fn analyze_text(&self, text: &str) -> Result<RawAnalysisResponse, ServiceError> {
        ServiceClient::analyze_text(self, text).await
    }
}
