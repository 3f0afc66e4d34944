//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{AppState, error::AuthError, token::Claims, validation};

/// Response returned by forgot-password regardless of whether the email
/// matched an account
const RESET_REQUESTED_MESSAGE: &str = "if an account exists, a reset link has been sent";

/// Request for admin login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for token generation
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_expires_in: u64,
}

/// Request carrying a refresh token (refresh and logout)
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Request for a password-reset link
#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request to redeem a reset token
#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Request to change the password of the authenticated admin
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/change-password", post(change_password))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::require_access_token,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .merge(protected)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Admin login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Login attempt");

    let issued = state.sessions.login(&payload.email, &payload.password).await?;

    let response = TokenResponse {
        access_token: issued.access_token,
        refresh_token: issued.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: issued.access_expires_in,
        refresh_expires_in: issued.refresh_expires_in,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Refresh token endpoint
///
/// The presented refresh token is rotated; the response carries its
/// replacement alongside the new access token.
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Token refresh request");

    let issued = state.sessions.refresh(&payload.refresh_token).await?;

    let response = TokenResponse {
        access_token: issued.access_token,
        refresh_token: issued.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: issued.access_expires_in,
        refresh_expires_in: issued.refresh_expires_in,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Logout request");

    state.sessions.logout(&payload.refresh_token).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "logged out successfully"})),
    ))
}

/// Forgot-password endpoint
///
/// Always answers 200 with the same body whether or not the email matched
/// an account; mail dispatch runs detached so neither failures nor latency
/// differences leak which case occurred.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let email = payload.email.trim().to_lowercase();

    if validation::validate_email(&email).is_err() {
        debug!("Reset requested for malformed email");
        return Ok((
            StatusCode::OK,
            Json(serde_json::json!({"message": RESET_REQUESTED_MESSAGE})),
        ));
    }

    if let Some(issue) = state.resets.request(&email).await? {
        let mailer = state.mailer.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_reset_email(&issue.email, &issue.raw_token).await {
                error!("Failed to send reset email: {:#}", e);
            }
        });
    }

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": RESET_REQUESTED_MESSAGE})),
    ))
}

/// Reset-password endpoint
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    validation::validate_password(&payload.new_password).map_err(AuthError::Validation)?;

    state
        .resets
        .consume(&payload.token, &payload.new_password)
        .await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "password has been reset"})),
    ))
}

/// Change-password endpoint, requires a valid access token
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    validation::validate_password(&payload.new_password).map_err(AuthError::Validation)?;

    state
        .sessions
        .change_password(claims.sub, &payload.current_password, &payload.new_password)
        .await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "password changed"})),
    ))
}
