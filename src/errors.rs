use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::time::Duration;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Machine-readable error category (e.g. "not_found", "timeout")
    pub kind: String,
}

/// Every way a weather request can fail.
///
/// All variants are terminal for the current request. Nothing here is
/// retried internally and none of them are ever cached.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeatherError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid API key. Check that the weather provider key is valid and activated.")]
    Auth,

    #[error("Location \"{0}\" not found. Check the location and try again.")]
    NotFound(String),

    #[error("Weather provider rate limit exceeded. Wait a moment and try again.")]
    UpstreamRateLimit,

    #[error("Weather provider did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Failed to reach weather provider: {0}")]
    Connection(String),

    #[error("Weather provider returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Unexpected weather provider response format: {0}")]
    MalformedResponse(String),
}

impl WeatherError {
    /// Snake-case category name used in the JSON error body.
    pub fn kind(&self) -> &'static str {
        match self {
            WeatherError::Config(_) => "config_error",
            WeatherError::Validation(_) => "validation_error",
            WeatherError::Auth => "auth_error",
            WeatherError::NotFound(_) => "not_found",
            WeatherError::UpstreamRateLimit => "upstream_rate_limit",
            WeatherError::Timeout(_) => "timeout",
            WeatherError::Connection(_) => "connection_error",
            WeatherError::Upstream { .. } => "upstream_error",
            WeatherError::MalformedResponse(_) => "malformed_response",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WeatherError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WeatherError::Validation(_) => StatusCode::BAD_REQUEST,
            WeatherError::NotFound(_) => StatusCode::NOT_FOUND,
            WeatherError::UpstreamRateLimit => StatusCode::SERVICE_UNAVAILABLE,
            WeatherError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            WeatherError::Auth
            | WeatherError::Connection(_)
            | WeatherError::Upstream { .. }
            | WeatherError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn to_response_body(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            kind: self.kind().to_string(),
        }
    }
}

impl IntoResponse for WeatherError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!("Request failed ({}): {}", self.kind(), self);
        }
        (status, axum::Json(self.to_response_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            WeatherError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WeatherError::NotFound("Atlantis".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WeatherError::Timeout(Duration::from_secs(10)).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(WeatherError::Auth.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            WeatherError::UpstreamRateLimit.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_timeout_message_keeps_sub_second_precision() {
        assert_eq!(
            WeatherError::Timeout(Duration::from_millis(250)).to_string(),
            "Weather provider did not respond within 250ms"
        );
        assert_eq!(
            WeatherError::Timeout(Duration::from_secs(10)).to_string(),
            "Weather provider did not respond within 10s"
        );
    }

    #[test]
    fn test_response_body_carries_kind_and_message() {
        let body = WeatherError::NotFound("Atlantis".into()).to_response_body();
        assert_eq!(body.kind, "not_found");
        assert!(body.error.contains("Atlantis"));
    }

    #[test]
    fn test_upstream_error_message_includes_status() {
        let err = WeatherError::Upstream {
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "Weather provider returned HTTP 500: boom");
        assert_eq!(err.kind(), "upstream_error");
    }
}
