//! Middleware for access-token validation on protected routes

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::info;

use crate::AppState;

/// Extract and validate the Bearer access token from the Authorization header
///
/// On success the token claims are inserted into the request extensions for
/// handlers to pick up. Access tokens are stateless: signature plus expiry
/// is the whole check, no revocation lookup.
pub async fn require_access_token(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = state.tokens.validate_access_token(token).map_err(|e| {
        info!("Access token rejected: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
