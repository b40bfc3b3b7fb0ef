//! Relay failure taxonomy and its single HTTP translation layer.
//!
//! Every failure past payload validation is one of these kinds, and this
//! `IntoResponse` impl is the only place a kind becomes a status code and
//! body. Validation failures never reach the enum; axum's Json extractor
//! rejects them before the handler runs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

/// Everything that can go wrong after a payload passes validation.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Network-level failure or non-2xx status from the completion API.
    /// No side effects have happened yet.
    #[error("failed to contact upstream completion API: {0}")]
    Upstream(String),

    /// Upstream returned success but the body lacks a required field.
    /// Nothing has been persisted.
    #[error("unexpected upstream response structure: missing `{missing}`")]
    ResponseShape { missing: &'static str },

    /// The response log write failed after a successful upstream call.
    /// The generated content is not returned in this case.
    #[error("failed to record response: {0}")]
    Persistence(String),
}

impl RelayError {
    /// HTTP status for this failure kind. All kinds are 500-class;
    /// upstream faults surface as Bad Gateway.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Upstream(_) | RelayError::ResponseShape { .. } => StatusCode::BAD_GATEWAY,
            RelayError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(status = %status.as_u16(), error = %self, "relay call failed");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_maps_to_bad_gateway() {
        let err = RelayError::Upstream("connection refused".to_string());
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn shape_error_names_the_missing_key() {
        let err = RelayError::ResponseShape { missing: "choices" };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("`choices`"));
    }

    #[test]
    fn persistence_maps_to_internal_error() {
        let err = RelayError::Persistence("disk I/O error".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.status().is_server_error());
    }

    #[test]
    fn every_kind_is_500_class() {
        let kinds = [
            RelayError::Upstream(String::new()),
            RelayError::ResponseShape { missing: "content" },
            RelayError::Persistence(String::new()),
        ];
        for err in kinds {
            assert!(err.status().is_server_error());
        }
    }
}
