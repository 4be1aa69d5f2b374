use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use super::clock::Clock;
use crate::config::JwtConfig;
use crate::models::{AccessLevel, User};

/// JWT service for session token issue and verification (HS256).
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_expiry: Duration,
    clock: Arc<dyn Clock>,
}

/// Claims carried by the `auth-token` cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: String,
    pub email: String,
    pub is_admin: bool,
    pub is_super_admin: bool,
    pub access_level: AccessLevel,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Identity attached to a request once its session token checks out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: String,
    pub email: String,
    pub access_level: AccessLevel,
    pub is_admin: bool,
    pub is_super_admin: bool,
}

impl From<SessionClaims> for SessionIdentity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
            access_level: claims.access_level,
            is_admin: claims.is_admin,
            is_super_admin: claims.is_super_admin,
        }
    }
}

#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Session token expired")]
    Expired,

    #[error("Invalid session token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

impl JwtService {
    pub fn new(config: &JwtConfig, clock: Arc<dyn Clock>) -> Result<Self, anyhow::Error> {
        if config.secret.is_empty() {
            return Err(anyhow::anyhow!("JWT secret must not be empty"));
        }
        if config.session_expiry_hours <= 0 {
            return Err(anyhow::anyhow!("Session expiry must be positive"));
        }

        tracing::info!(
            expiry_hours = config.session_expiry_hours,
            "JWT service initialized with HS256 secret"
        );

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            session_expiry: Duration::hours(config.session_expiry_hours),
            clock,
        })
    }

    pub fn session_expiry(&self) -> Duration {
        self.session_expiry
    }

    /// Issue a session token for an active user.
    pub fn issue(&self, user: &User) -> Result<IssuedToken, anyhow::Error> {
        let now = self.clock.now();
        let expires_at = now + self.session_expiry;

        let claims = SessionClaims {
            user_id: user.id.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            is_super_admin: user.is_super_admin,
            access_level: user.access_level,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode session token: {}", e))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature and expiry. A token is expired once `now >= exp`.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock below.
        validation.validate_exp = false;

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)?.claims;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
