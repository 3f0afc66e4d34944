//! Session orchestration: login, refresh, logout, password change
//!
//! Login runs rate-limit check, credential verification, and token issuance
//! in that order; the rate-limit check always happens before any credential
//! work so a denied identifier never reaches the repository. Refresh
//! rotates: the presented refresh token is revoked for its remaining
//! lifetime and a new pair is issued, so a superseded token can never be
//! replayed. Revocations live in Redis with a TTL matching the token's
//! natural expiry.

use anyhow::Result;
use common::cache::RedisPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AuthError;
use crate::password;
use crate::rate_limiter::RateLimiter;
use crate::repositories::AdminRepository;
use crate::token::{Claims, TokenService, unix_now};

/// Access/refresh pair handed back after login or refresh
#[derive(Debug)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_in: u64,
    pub refresh_expires_in: u64,
}

fn revocation_key(token: &str) -> String {
    format!("revoked_token:{}", token)
}

/// Session manager, the only component the HTTP layer talks to
#[derive(Clone)]
pub struct SessionManager {
    admins: AdminRepository,
    tokens: TokenService,
    rate_limiter: RateLimiter,
    denylist: RedisPool,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(
        admins: AdminRepository,
        tokens: TokenService,
        rate_limiter: RateLimiter,
        denylist: RedisPool,
    ) -> Self {
        Self {
            admins,
            tokens,
            rate_limiter,
            denylist,
        }
    }

    /// Authenticate an admin and issue a token pair
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedTokens, AuthError> {
        let email = email.trim().to_lowercase();

        // Rate limit before any credential work, so login cannot be used to
        // probe credentials once an identifier is already denied.
        let decision = self.rate_limiter.check(&format!("login:{}", email)).await;
        if !decision.allowed {
            warn!("Login rate limited for {}", email);
            return Err(AuthError::RateLimited {
                retry_after: decision.retry_after,
            });
        }

        let Some(admin) = self.admins.find_by_email(&email).await? else {
            info!("Login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_blocking(password, &admin.password_hash).await? {
            info!("Login failed: wrong password for admin {}", admin.id);
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.issue_pair(&admin)?;
        info!("Login successful for admin {}", admin.id);
        Ok(issued)
    }

    /// Exchange a refresh token for a fresh pair, rotating the old one
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedTokens, AuthError> {
        let claims = self
            .tokens
            .validate_refresh_token(refresh_token)
            .map_err(|e| {
                info!("Refresh rejected: {}", e);
                AuthError::Unauthorized
            })?;

        if self.denylist.exists(&revocation_key(refresh_token)).await? {
            warn!("Refresh rejected: revoked token for admin {}", claims.sub);
            return Err(AuthError::Unauthorized);
        }

        let Some(admin) = self.admins.find_by_id(claims.sub).await? else {
            info!("Refresh rejected: admin {} no longer exists", claims.sub);
            return Err(AuthError::Unauthorized);
        };

        // Revoke before issuing: a crash in between costs the client a
        // re-login, never a replayable token.
        self.revoke(refresh_token, &claims).await?;

        let issued = self.issue_pair(&admin)?;
        info!("Refreshed session for admin {}", admin.id);
        Ok(issued)
    }

    /// Revoke a refresh token ahead of its natural expiry
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self
            .tokens
            .validate_refresh_token(refresh_token)
            .map_err(|e| {
                info!("Logout rejected: {}", e);
                AuthError::Unauthorized
            })?;

        self.revoke(refresh_token, &claims).await?;
        info!("Logged out admin {}", claims.sub);
        Ok(())
    }

    /// Change the password of an authenticated admin
    ///
    /// The caller validates the new password against the policy first; this
    /// method verifies the current password and swaps the hash.
    pub async fn change_password(
        &self,
        admin_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let Some(admin) = self.admins.find_by_id(admin_id).await? else {
            return Err(AuthError::Unauthorized);
        };

        if !verify_blocking(current_password, &admin.password_hash).await? {
            info!("Password change rejected: wrong current password for {}", admin_id);
            return Err(AuthError::InvalidCredentials);
        }

        let new_owned = new_password.to_string();
        let new_hash = tokio::task::spawn_blocking(move || password::hash_password(&new_owned))
            .await
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("hashing task failed: {}", e)))?
            .map_err(AuthError::Internal)?;

        self.admins.update_password(admin_id, &new_hash).await?;
        info!("Password changed for admin {}", admin_id);
        Ok(())
    }

    fn issue_pair(&self, admin: &crate::models::Admin) -> Result<IssuedTokens, AuthError> {
        let access_token = self.tokens.generate_access_token(admin)?;
        let refresh_token = self.tokens.generate_refresh_token(admin)?;

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            access_expires_in: self.tokens.access_token_expiry(),
            refresh_expires_in: self.tokens.refresh_token_expiry(),
        })
    }

    async fn revoke(&self, token: &str, claims: &Claims) -> Result<(), AuthError> {
        let now = unix_now()?;
        let remaining = claims.exp.saturating_sub(now);
        if remaining == 0 {
            // Already past expiry; signature validation would reject it anyway
            return Ok(());
        }

        self.denylist
            .set(&revocation_key(token), "1", Some(remaining))
            .await?;
        Ok(())
    }
}

/// Run password verification on the blocking pool
///
/// Argon2 verification is CPU-bound; keeping it off the async workers means
/// token validation and rate-limit checks for other requests never queue
/// behind a hash.
async fn verify_blocking(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();

    tokio::task::spawn_blocking(move || password::verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("verification task failed: {}", e)))
}
