//! Service call errors.

use serde_json::Value;
use thiserror::Error;

/// Errors from OCR and analysis service calls.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service responded with a non-2xx status or an unusable body.
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    /// No response was received.
    #[error("No response from server. Please check if the OCR service is running on {endpoint}")]
    Unreachable { endpoint: String },

    /// The request could not be built or sent.
    #[error("Request error: {message}")]
    Request { message: String },
}

impl ServiceError {
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    /// Classify a transport error. Builder failures are local; everything
    /// else means no usable response arrived.
    pub fn from_transport(err: &reqwest::Error, endpoint: &str) -> Self {
        if err.is_builder() {
            Self::request(err.to_string())
        } else {
            Self::Unreachable {
                endpoint: endpoint.to_string(),
            }
        }
    }

    /// Error for a non-2xx response, using the body's `error` field when
    /// there is one.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "Unknown error".to_string());
        Self::Server { status, message }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}
