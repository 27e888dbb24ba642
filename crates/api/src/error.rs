use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use scriptgate_core::error::{GatewayError, INVALID_CREDENTIALS};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`GatewayError`] for pipeline failures and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses of the form `{"error": "...", "code": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A failure from the execution pipeline.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A malformed request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Gateway(err) => match err {
                GatewayError::Unauthorized => (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    INVALID_CREDENTIALS.to_string(),
                ),
                GatewayError::Evaluation(msg) => {
                    (StatusCode::BAD_REQUEST, "EVALUATION_ERROR", msg.clone())
                }
                GatewayError::Serialization(msg) => {
                    (StatusCode::BAD_REQUEST, "SERIALIZATION_ERROR", msg.clone())
                }
                GatewayError::Unavailable => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "UNAVAILABLE",
                    err.to_string(),
                ),
                GatewayError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal gateway error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
