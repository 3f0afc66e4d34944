//! Error taxonomy for the authentication service
//!
//! Authentication and reset-token failures render as deliberately vague
//! client messages; the detailed reason is logged server-side where the
//! error is raised. Validation failures are maximally specific and list
//! every unmet rule. Only infrastructure failures surface as 500.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;
use tracing::error;

/// Authentication service errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input or weak password; carries every failed rule
    #[error("validation failed")]
    Validation(Vec<String>),

    /// Wrong email or password; the client never learns which
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Expired, forged, revoked, or otherwise unusable token
    #[error("invalid or expired token")]
    Unauthorized,

    /// Reset token not found, already used, or expired; indistinguishable
    #[error("invalid or expired reset token")]
    ResetTokenInvalid,

    /// Too many attempts within the rate-limit window
    #[error("too many attempts")]
    RateLimited { retry_after: Duration },

    /// Infrastructure failure (database, cache, crypto backend)
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::Internal(e.into())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Validation(failures) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({
                    "error": "validation failed",
                    "details": failures,
                })),
            )
                .into_response(),
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"error": "invalid email or password"})),
            )
                .into_response(),
            AuthError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"error": "invalid or expired token"})),
            )
                .into_response(),
            AuthError::ResetTokenInvalid => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "invalid or expired reset token"})),
            )
                .into_response(),
            AuthError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after.as_secs().to_string())],
                Json(serde_json::json!({
                    "error": "too many attempts, try again later",
                    "retry_after_seconds": retry_after.as_secs(),
                })),
            )
                .into_response(),
            AuthError::Internal(e) => {
                error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": "internal server error"})),
                )
                    .into_response()
            }
        }
    }
}
