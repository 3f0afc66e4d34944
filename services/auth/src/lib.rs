//! Authentication service for the Lumen admin backend
//!
//! Admin credentials, compact signed session tokens (access + refresh),
//! password-reset token lifecycle, and login rate limiting. The HTTP layer
//! talks to the session manager and reset store; everything else sits
//! behind them.

pub mod error;
pub mod mailer;
pub mod middleware;
pub mod models;
pub mod password;
pub mod rate_limiter;
pub mod repositories;
pub mod reset;
pub mod routes;
pub mod session;
pub mod sweeper;
pub mod token;
pub mod validation;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub tokens: token::TokenService,
    pub sessions: session::SessionManager,
    pub resets: reset::ResetTokenStore,
    pub mailer: mailer::Mailer,
}
