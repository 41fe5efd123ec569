use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, get_current_timestamp,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::Role;

/// Claims
///
/// The payload signed into every bearer token. Nothing is persisted server-side:
/// the signature over these fields is the whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the username.
    pub sub: String,
    pub role: Role,
    /// Issued At (iat), unix seconds.
    pub iat: u64,
    /// Expiration Time (exp), unix seconds. Tokens are invalid from this instant on.
    pub exp: u64,
}

/// Every validation failure looks the same to callers: bad signature, foreign
/// secret, malformed input and expiry are deliberately indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid or expired token")]
pub struct InvalidToken;

/// TokenService
///
/// Issues and validates HS256 JWTs bound to the server secret with a fixed TTL.
/// No clock skew is tolerated.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

pub type TokenState = Arc<TokenService>;

impl TokenService {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub fn issue(&self, username: &str, role: Role) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(username, role, get_current_timestamp())
    }

    /// Signs a token as if issued at `issued_at` (unix seconds).
    pub fn issue_at(
        &self,
        username: &str,
        role: Role,
        issued_at: u64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: username.to_string(),
            role,
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl_secs),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    pub fn validate(&self, token: &str) -> Result<Claims, InvalidToken> {
        self.validate_at(token, get_current_timestamp())
    }

    /// Validates against an explicit clock reading (unix seconds).
    pub fn validate_at(&self, token: &str, now: u64) -> Result<Claims, InvalidToken> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // Expiry is checked below against `now` so that it is strict and testable.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(kind = ?e.kind(), "token rejected");
            InvalidToken
        })?;

        if data.claims.exp <= now {
            tracing::debug!(exp = data.claims.exp, now, "token rejected: expired");
            return Err(InvalidToken);
        }
        Ok(data.claims)
    }
}
