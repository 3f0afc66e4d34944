//! Session token codec
//!
//! Compact signed tokens (HMAC-SHA256, `header.payload.signature` with
//! base64url parts) for the admin session: short-lived access tokens and
//! long-lived refresh tokens. The two classes are signed with distinct
//! secrets, so leaking one secret cannot forge the other class, and a
//! `token_type` claim is enforced on validation so a refresh token is never
//! accepted where an access token is required.
//!
//! The codec performs no I/O and holds no mutable state; signature
//! verification goes through the jsonwebtoken crate's constant-time HMAC
//! check.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::models::Admin;

/// Token configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Secret used to sign and verify access tokens
    pub access_secret: String,
    /// Secret used to sign and verify refresh tokens
    pub refresh_secret: String,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

impl TokenConfig {
    /// Create a new TokenConfig from environment variables
    ///
    /// # Environment Variables
    /// - `ACCESS_TOKEN_SECRET`: Secret for access tokens (required)
    /// - `REFRESH_TOKEN_SECRET`: Secret for refresh tokens (required, must differ)
    /// - `ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    /// - `REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let access_secret = std::env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("ACCESS_TOKEN_SECRET environment variable not set"))?;

        let refresh_secret = std::env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("REFRESH_TOKEN_SECRET environment variable not set"))?;

        if access_secret == refresh_secret {
            anyhow::bail!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must be distinct");
        }

        let access_token_expiry = std::env::var("ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes
            .parse()
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("REFRESH_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "604800".to_string()) // 7 days
            .parse()
            .unwrap_or(604800);

        Ok(TokenConfig {
            access_secret,
            refresh_secret,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

/// Token claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Admin ID
    pub sub: Uuid,
    /// Admin email
    pub email: String,
    /// Token type (access or refresh)
    pub token_type: TokenType,
    /// Issued at time, epoch seconds
    pub iat: u64,
    /// Expiration time, epoch seconds
    pub exp: u64,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Current time as epoch seconds
pub(crate) fn unix_now() -> Result<u64> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
        .as_secs();
    Ok(now)
}

fn token_header() -> Header {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("TOKEN".to_string());
    header
}

/// Token service
#[derive(Clone)]
pub struct TokenService {
    access_encoding_key: EncodingKey,
    access_decoding_key: DecodingKey,
    refresh_encoding_key: EncodingKey,
    refresh_decoding_key: DecodingKey,
    validation: Validation,
    config: TokenConfig,
}

impl TokenService {
    /// Initialize a new token service
    pub fn new(config: TokenConfig) -> Result<Self> {
        if config.access_secret == config.refresh_secret {
            anyhow::bail!("access and refresh token secrets must be distinct");
        }

        let access_encoding_key = EncodingKey::from_secret(config.access_secret.as_bytes());
        let access_decoding_key = DecodingKey::from_secret(config.access_secret.as_bytes());
        let refresh_encoding_key = EncodingKey::from_secret(config.refresh_secret.as_bytes());
        let refresh_decoding_key = DecodingKey::from_secret(config.refresh_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(TokenService {
            access_encoding_key,
            access_decoding_key,
            refresh_encoding_key,
            refresh_decoding_key,
            validation,
            config,
        })
    }

    /// Generate an access token for an admin
    pub fn generate_access_token(&self, admin: &Admin) -> Result<String> {
        self.generate(admin, TokenType::Access)
    }

    /// Generate a refresh token for an admin
    pub fn generate_refresh_token(&self, admin: &Admin) -> Result<String> {
        self.generate(admin, TokenType::Refresh)
    }

    fn generate(&self, admin: &Admin, token_type: TokenType) -> Result<String> {
        let now = unix_now()?;

        let (ttl, key) = match token_type {
            TokenType::Access => (self.config.access_token_expiry, &self.access_encoding_key),
            TokenType::Refresh => (self.config.refresh_token_expiry, &self.refresh_encoding_key),
        };

        let claims = Claims {
            sub: admin.id,
            email: admin.email.clone(),
            token_type,
            iat: now,
            exp: now + ttl,
        };

        let token = encode(&token_header(), &claims, key)?;
        Ok(token)
    }

    /// Validate an access token and return its claims
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        self.validate(token, &self.access_decoding_key, TokenType::Access)
    }

    /// Validate a refresh token and return its claims
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        self.validate(token, &self.refresh_decoding_key, TokenType::Refresh)
    }

    fn validate(&self, token: &str, key: &DecodingKey, expected: TokenType) -> Result<Claims> {
        let token_data = decode::<Claims>(token, key, &self.validation)?;

        if token_data.claims.token_type != expected {
            anyhow::bail!("unexpected token type");
        }

        Ok(token_data.claims)
    }

    /// Get the access token expiry time in seconds
    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }

    /// Get the refresh token expiry time in seconds
    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serial_test::serial;

    fn test_config() -> TokenConfig {
        TokenConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
        }
    }

    fn test_admin() -> Admin {
        Admin {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = TokenService::new(test_config()).unwrap();
        let admin = test_admin();

        let token = service.generate_access_token(&admin).unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.email, admin.email);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let service = TokenService::new(test_config()).unwrap();
        let admin = test_admin();

        let token = service.generate_refresh_token(&admin).unwrap();
        let claims = service.validate_refresh_token(&token).unwrap();

        assert_eq!(claims.token_type, TokenType::Refresh);
        assert_eq!(claims.exp - claims.iat, 604800);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = TokenService::new(test_config()).unwrap();
        let token = service.generate_access_token(&test_admin()).unwrap();

        // Flip one character of the payload segment
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let payload = &parts[1];
        let flipped = if payload.ends_with('A') { "B" } else { "A" };
        parts[1] = format!("{}{}", &payload[..payload.len() - 1], flipped);
        let tampered = parts.join(".");

        assert!(service.validate_access_token(&tampered).is_err());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let service = TokenService::new(test_config()).unwrap();

        assert!(service.validate_access_token("").is_err());
        assert!(service.validate_access_token("only.two").is_err());
        assert!(service.validate_access_token("a.b.c.d").is_err());
        assert!(service.validate_access_token("..").is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = TokenService::new(test_config()).unwrap();
        let other = TokenService::new(TokenConfig {
            access_secret: "another-access-secret".to_string(),
            refresh_secret: "another-refresh-secret".to_string(),
            ..test_config()
        })
        .unwrap();

        let token = service.generate_access_token(&test_admin()).unwrap();
        assert!(other.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_cross_type_rejected() {
        let service = TokenService::new(test_config()).unwrap();
        let admin = test_admin();

        let refresh = service.generate_refresh_token(&admin).unwrap();
        let access = service.generate_access_token(&admin).unwrap();

        assert!(service.validate_access_token(&refresh).is_err());
        assert!(service.validate_refresh_token(&access).is_err());
    }

    #[test]
    fn test_type_claim_checked_even_with_right_secret() {
        // A token signed with the access secret but carrying a Refresh type
        // claim must still be rejected by access validation.
        let service = TokenService::new(test_config()).unwrap();
        let admin = test_admin();
        let now = unix_now().unwrap();

        let claims = Claims {
            sub: admin.id,
            email: admin.email.clone(),
            token_type: TokenType::Refresh,
            iat: now,
            exp: now + 900,
        };
        let key = EncodingKey::from_secret(test_config().access_secret.as_bytes());
        let forged = encode(&token_header(), &claims, &key).unwrap();

        assert!(service.validate_access_token(&forged).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = TokenService::new(test_config()).unwrap();
        let admin = test_admin();
        let now = unix_now().unwrap();

        let claims = Claims {
            sub: admin.id,
            email: admin.email.clone(),
            token_type: TokenType::Access,
            iat: now - 1000,
            exp: now - 100,
        };
        let key = EncodingKey::from_secret(test_config().access_secret.as_bytes());
        let expired = encode(&token_header(), &claims, &key).unwrap();

        assert!(service.validate_access_token(&expired).is_err());
    }

    #[test]
    fn test_identical_secrets_rejected() {
        let config = TokenConfig {
            access_secret: "same-secret".to_string(),
            refresh_secret: "same-secret".to_string(),
            ..test_config()
        };

        assert!(TokenService::new(config).is_err());
    }

    #[test]
    #[serial]
    fn test_token_config_from_env() {
        unsafe {
            std::env::set_var("ACCESS_TOKEN_SECRET", "env-access");
            std::env::set_var("REFRESH_TOKEN_SECRET", "env-refresh");
        }

        let config = TokenConfig::from_env().unwrap();
        assert_eq!(config.access_token_expiry, 900);
        assert_eq!(config.refresh_token_expiry, 604800);

        unsafe {
            std::env::remove_var("ACCESS_TOKEN_SECRET");
            std::env::remove_var("REFRESH_TOKEN_SECRET");
        }
    }

    #[test]
    #[serial]
    fn test_token_config_missing_secret() {
        unsafe {
            std::env::remove_var("ACCESS_TOKEN_SECRET");
            std::env::remove_var("REFRESH_TOKEN_SECRET");
        }

        assert!(TokenConfig::from_env().is_err());
    }
}
