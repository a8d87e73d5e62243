//! Structured errors for calls against the summarization backend.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Categories of API errors for consistent error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Request exceeded the configured timeout
    Timeout,
    /// Could not reach the backend
    Connect,
    /// Failed to parse a response body or stream payload
    Parse,
    /// The progress stream broke mid-flight
    Stream,
    /// A local file could not be read or written
    Io,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Connect => write!(f, "connect"),
            ApiErrorKind::Parse => write!(f, "parse"),
            ApiErrorKind::Stream => write!(f, "stream"),
            ApiErrorKind::Io => write!(f, "io"),
        }
    }
}

/// Structured error from the backend with kind and details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
    /// HTTP status, when the backend answered at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            status: None,
        }
    }

    /// Creates an HTTP status error.
    ///
    /// The backend answers failures with `{"detail": "..."}`; when present
    /// that text becomes the message so it can be shown to the user as is.
    pub fn http_status(status: u16, body: &str) -> Self {
        let details = (!body.is_empty()).then(|| body.to_string());
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| json.get("detail").and_then(detail_text))
            .unwrap_or_else(|| format!("HTTP {status}"));

        Self {
            kind: ApiErrorKind::HttpStatus,
            message,
            details,
            status: Some(status),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Parse, message)
    }

    pub fn stream(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Stream, message)
    }

    /// True when the backend answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

/// FastAPI validation errors carry a list under `detail`; plain errors a string.
fn detail_text(detail: &Value) -> Option<String> {
    match detail {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<&reqwest::Error> for ApiError {
    fn from(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::new(ApiErrorKind::Timeout, format!("Request timed out: {e}"))
        } else if e.is_connect() {
            ApiError::new(ApiErrorKind::Connect, format!("Connection failed: {e}"))
        } else if e.is_decode() {
            ApiError::parse(format!("Invalid response body: {e}"))
        } else {
            ApiError::new(ApiErrorKind::Connect, format!("Network error: {e}"))
        }
    }
}

/// Result type for backend operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_prefers_detail_field() {
        let err = ApiError::http_status(400, r#"{"detail":"Arquivo inválido"}"#);
        assert_eq!(err.kind, ApiErrorKind::HttpStatus);
        assert_eq!(err.message, "Arquivo inválido");
        assert_eq!(err.status, Some(400));
        assert!(err.details.is_some());
    }

    #[test]
    fn http_status_joins_validation_messages() {
        let body = r#"{"detail":[{"msg":"field required"},{"msg":"bad value"}]}"#;
        let err = ApiError::http_status(422, body);
        assert_eq!(err.message, "field required; bad value");
    }

    #[test]
    fn http_status_without_json_uses_status_line() {
        let err = ApiError::http_status(502, "Bad Gateway");
        assert_eq!(err.message, "HTTP 502");
        assert_eq!(err.details.as_deref(), Some("Bad Gateway"));

        let empty = ApiError::http_status(500, "");
        assert_eq!(empty.details, None);
    }

    #[test]
    fn not_found_is_detected_from_status() {
        assert!(ApiError::http_status(404, "").is_not_found());
        assert!(!ApiError::parse("x").is_not_found());
    }
}
