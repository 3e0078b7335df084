//! Transit codec error types.
//!
//! The taxonomy separates fatal startup failures (`Config`, `Transport`)
//! from per-request failures (`Transform`, `Kms`, `Authorization`,
//! `Routing`). Per-request errors never take the process down and never
//! affect other in-flight requests; they map to an HTTP status via the
//! [`IntoResponse`] impl at the bottom of this module.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Transit codec errors.
#[derive(Error, Debug)]
pub enum TransitError {
    /// Invalid combination of startup inputs. Fatal before serving.
    #[error("Config error: {0}")]
    Config(String),

    /// Stage-level transform failure (serialization, metadata, stream).
    #[error("Transform error: {0}")]
    Transform(String),

    /// Key-management service call failed or returned an unusable response.
    #[error("KMS error: {0}")]
    Kms(String),

    /// Credential missing, invalid, or insufficient for the namespace.
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Unknown namespace or missing routing header.
    #[error("Routing error: {0}")]
    Routing(String),

    /// The listener itself failed. Fatal at serve time.
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for transit codec operations
pub type Result<T> = std::result::Result<T, TransitError>;

impl TransitError {
    /// HTTP status this error surfaces as.
    ///
    /// Authorization failures are 401, routing failures 404, everything
    /// else is an internal transform failure (500). Fatal variants never
    /// reach a response in practice but map to 500 for completeness.
    pub fn status(&self) -> StatusCode {
        match self {
            TransitError::Authorization(_) => StatusCode::UNAUTHORIZED,
            TransitError::Routing(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for TransitError {
    fn from(err: reqwest::Error) -> Self {
        TransitError::Kms(err.to_string())
    }
}

impl From<base64::DecodeError> for TransitError {
    fn from(err: base64::DecodeError) -> Self {
        TransitError::Transform(format!("Base64 decode error: {err}"))
    }
}

impl IntoResponse for TransitError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            TransitError::Authorization("no token".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            TransitError::Routing("unknown namespace".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            TransitError::Transform("bad stream".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            TransitError::Kms("connection refused".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
