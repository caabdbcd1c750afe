//! Signed, time-limited bearer tokens.
//!
//! Tokens are JWTs carrying the username as `sub`. There is no refresh flow:
//! a client whose token expired logs in again.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{AuthConfig, MAX_ACCESS_TOKEN_EXPIRE_MINUTES};
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Username of the token holder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    pub jti: String,
}

#[derive(Serialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

/// Issues and verifies access tokens with one process-wide key and algorithm.
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            algorithm: config.algorithm,
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            ttl: Duration::minutes(
                config
                    .access_token_expire_minutes
                    .clamp(1, MAX_ACCESS_TOKEN_EXPIRE_MINUTES),
            ),
        }
    }

    pub fn issue(&self, subject: &str) -> Result<String, AppError> {
        self.issue_with_ttl(subject, self.ttl)
    }

    pub fn issue_with_ttl(&self, subject: &str, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AppError::Internal(format!("Token lifetime of {} is out of range", ttl))
        })?;
        let claims = Claims {
            sub: Some(subject.to_string()),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        debug!(subject, expires_at = claims.exp, "Issuing access token");
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Returns the token subject. Every failure is reported the same way so
    /// callers cannot tell a bad signature from an expired token.
    pub fn verify(&self, token: &str) -> Result<String, AppError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        let claims = match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(err) => {
                warn!(reason = %err, "Rejected access token");
                return Err(AppError::credentials());
            }
        };

        claims.sub.ok_or_else(|| {
            warn!("Access token has no subject");
            AppError::credentials()
        })
    }
}
