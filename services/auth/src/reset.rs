//! Password-reset token issuance and single-use consumption
//!
//! A reset token is 32 random bytes, hex encoded. Only its SHA-256 digest
//! is persisted; the raw token travels to the admin inside the reset email
//! and comes back once on consumption. Consumption marks the token used and
//! replaces the credential hash in a single transaction: the row lock taken
//! by the `UPDATE ... WHERE used_at IS NULL` makes concurrent consumes of
//! the same token observably single-winner.

use anyhow::Result;
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AuthError;
use crate::password;
use crate::repositories::AdminRepository;

/// Raw token length in bytes before hex encoding
const RESET_TOKEN_BYTES: usize = 32;

/// Reset tokens are valid for one hour
const RESET_TOKEN_TTL_HOURS: i64 = 1;

fn token_digest(raw_token: &str) -> String {
    hex::encode(Sha256::digest(raw_token.as_bytes()))
}

fn generate_raw_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A freshly issued reset token, ready for mail dispatch
#[derive(Debug)]
pub struct ResetIssue {
    /// Address the reset link goes to
    pub email: String,
    /// Raw token to embed in the link; not stored anywhere
    pub raw_token: String,
}

/// Store for password-reset tokens
#[derive(Clone)]
pub struct ResetTokenStore {
    pool: PgPool,
    admins: AdminRepository,
}

impl ResetTokenStore {
    /// Create a new reset token store
    pub fn new(pool: PgPool, admins: AdminRepository) -> Self {
        Self { pool, admins }
    }

    /// Issue a reset token for `email`
    ///
    /// Returns `Ok(None)` when no admin matches; the caller responds
    /// identically either way so the endpoint cannot be used to enumerate
    /// accounts.
    pub async fn request(&self, email: &str) -> Result<Option<ResetIssue>> {
        let Some(admin) = self.admins.find_by_email(email).await? else {
            debug!("Reset requested for unknown email");
            return Ok(None);
        };

        let raw_token = generate_raw_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);

        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (id, email, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&admin.email)
        .bind(token_digest(&raw_token))
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        info!("Issued password-reset token for admin {}", admin.id);

        Ok(Some(ResetIssue {
            email: admin.email,
            raw_token,
        }))
    }

    /// Consume a reset token and apply the new password
    ///
    /// Fails with `ResetTokenInvalid` when the token is unknown, already
    /// used, or expired; the three cases are indistinguishable to the
    /// caller. On success the token is marked used and the credential hash
    /// replaced inside one transaction.
    pub async fn consume(&self, raw_token: &str, new_password: &str) -> Result<(), AuthError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET used_at = now()
            WHERE token_hash = $1
              AND used_at IS NULL
              AND expires_at > now()
            RETURNING email
            "#,
        )
        .bind(token_digest(raw_token))
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(AuthError::ResetTokenInvalid);
        };
        let email: String = row.get("email");

        // The reset row stays locked while we hash, so a racing consume of
        // the same token blocks here and then sees used_at already set.
        let password_owned = new_password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || {
            password::hash_password(&password_owned)
        })
        .await
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("hashing task failed: {}", e)))?
        .map_err(AuthError::Internal)?;

        let result = sqlx::query(
            r#"
            UPDATE admins
            SET password_hash = $2, updated_at = now()
            WHERE email = $1
            "#,
        )
        .bind(&email)
        .bind(&password_hash)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Admin row vanished between issuance and consumption
            tx.rollback().await?;
            return Err(AuthError::ResetTokenInvalid);
        }

        tx.commit().await?;
        info!("Password reset completed for {}", email);
        Ok(())
    }

    /// Delete tokens whose expiry has passed
    pub async fn sweep_expired(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM password_reset_tokens
            WHERE expires_at < now()
            "#,
        )
        .execute(&self.pool)
        .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            info!("Reset-token sweep removed {} expired tokens", removed);
        }

        Ok(removed)
    }
}
