//! JWT session tokens
//!
//! Handles creation and verification of the stateless session token issued
//! after a successful wallet login.

use std::collections::HashSet;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session lifetime: 24 hours
pub const SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT-related errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token encoding failed: {0}")]
    Encoding(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// JWT claims for session tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject (Stellar public key)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

/// A signed session token together with the claims it carries
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub value: String,
    pub claims: SessionClaims,
}

impl SessionToken {
    /// Seconds between issuance and expiry
    pub fn max_age_seconds(&self) -> i64 {
        self.claims.exp - self.claims.iat
    }
}

/// Encodes and decodes session tokens with a server-held secret
#[derive(Clone)]
pub struct SessionTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl SessionTokenCodec {
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a token for `subject`, valid for [`SESSION_TTL_SECONDS`] from now
    pub fn issue(&self, subject: &str) -> Result<SessionToken, TokenError> {
        self.issue_at(subject, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now` (Unix seconds)
    pub fn issue_at(&self, subject: &str, now: i64) -> Result<SessionToken, TokenError> {
        let claims = SessionClaims {
            sub: subject.to_string(),
            iat: now,
            exp: now + SESSION_TTL_SECONDS,
            iss: self.issuer.clone(),
        };

        let value = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(SessionToken { value, claims })
    }

    /// Verify and decode a token against the current time
    pub fn decode(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.decode_at(token, Utc::now().timestamp())
    }

    /// Verify and decode a token as if the current time were `now`.
    ///
    /// A token whose `exp` equals `now` is already expired.
    pub fn decode_at(&self, token: &str, now: i64) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked below against the supplied clock, without leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims =
            HashSet::from(["sub", "exp", "iss"].map(String::from));
        validation.set_issuer(&[self.issuer.as_str()]);

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })?;

        if token_data.claims.exp <= now {
            return Err(TokenError::Expired);
        }

        Ok(token_data.claims)
    }
}
