//! Error types and handling for the relay server.
//!
//! [`ProviderError`] covers everything the upstream model provider can raise.
//! [`AppError`] is what handlers return; it implements [`IntoResponse`] so the
//! status code and body shape are decided in one place.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Text returned to callers when the provider fails. The real cause is only
/// logged.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "AI error. Check API key or quota.";

/// Message used when the chat request carries no usable `message`.
pub const MESSAGE_REQUIRED: &str = "Message is required";

const ERROR_TYPE_INVALID_REQUEST: &str = "invalid_request_error";
const ERROR_TYPE_API: &str = "api_error";

/// Failures surfaced by the generative model provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Transport-level failure (connect, timeout, broken body stream)
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Provider payload could not be decoded
    #[error("Malformed provider payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Prompt or candidate was blocked by the provider's safety filters
    #[error("Response blocked: {0}")]
    Blocked(String),

    /// Anything else reported by a provider implementation
    #[error("{0}")]
    Other(String),
}

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Client provided invalid data
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The upstream provider failed before the response was committed
    #[error("Upstream provider error: {0}")]
    Upstream(#[from] ProviderError),

    /// Generic internal server errors with custom message
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ERROR_TYPE_INVALID_REQUEST, msg)
            }
            // Logged where it happened; callers only ever see the generic text.
            AppError::Upstream(_) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    UPSTREAM_FAILURE_MESSAGE,
                )
                    .into_response();
            }
            AppError::Config(e) => (StatusCode::INTERNAL_SERVER_ERROR, ERROR_TYPE_API, e.to_string()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, ERROR_TYPE_API, msg),
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "type": error_type,
                "code": status.as_u16()
            }
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results using [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_error_display() {
        let err = AppError::BadRequest(MESSAGE_REQUIRED.to_string());
        assert_eq!(err.to_string(), "Bad request: Message is required");

        let err = AppError::Internal("test error".to_string());
        assert_eq!(err.to_string(), "Internal server error: test error");

        let err = ProviderError::Status {
            status: 403,
            body: "denied".to_string(),
        };
        assert_eq!(err.to_string(), "Provider returned status 403: denied");
    }

    #[tokio::test]
    async fn test_bad_request_response_is_structured() {
        let response = AppError::BadRequest(MESSAGE_REQUIRED.to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"]["message"], MESSAGE_REQUIRED);
        assert_eq!(json["error"]["code"], 400);
    }

    #[tokio::test]
    async fn test_upstream_response_hides_cause() {
        let err = AppError::from(ProviderError::Other("quota exhausted for key abc".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );

        let body = body_string(response).await;
        assert_eq!(body, UPSTREAM_FAILURE_MESSAGE);
        assert!(!body.contains("abc"));
    }

    #[test]
    fn test_internal_error_response() {
        let response = AppError::Internal("custom error".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_config_error_response() {
        let response = AppError::Config(anyhow::anyhow!("config error")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_from_provider() {
        let app_err: AppError = ProviderError::Blocked("SAFETY".into()).into();
        assert!(matches!(app_err, AppError::Upstream(ProviderError::Blocked(_))));
    }

    #[test]
    fn test_provider_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: ProviderError = json_err.into();
        assert!(matches!(err, ProviderError::Decode(_)));
    }
}
