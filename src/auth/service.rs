//! Authentication service
//!
//! Core business logic for wallet-based authentication: a fixed challenge is
//! signed by the wallet, the signature is checked, the account must exist on
//! the ledger, and only then is a session token minted.

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use thiserror::Error;

use super::crypto::{CryptoError, SignatureVerifier};
use super::jwt::{SessionToken, SessionTokenCodec, TokenError};
use crate::ledger::{AccountRecord, LedgerAccountLookup, LedgerError};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE_NAME: &str = "jwt";

/// Auth service errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Account not found on ledger")]
    AccountNotFound,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<CryptoError> for AuthError {
    fn from(e: CryptoError) -> Self {
        AuthError::InvalidSignature(e.to_string())
    }
}

impl From<LedgerError> for AuthError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::AccountNotFound => AuthError::AccountNotFound,
            LedgerError::Unavailable(_) | LedgerError::InvalidResponse(_) => {
                AuthError::InternalError(e.to_string())
            }
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid(reason) => AuthError::InvalidToken(reason),
            TokenError::Encoding(_) => AuthError::InternalError(e.to_string()),
        }
    }
}

/// Immutable settings injected into the authenticator at construction
#[derive(Clone)]
pub struct AuthSettings {
    /// Bytes every wallet signs
    pub challenge: Vec<u8>,
    /// HS256 secret for session tokens
    pub jwt_secret: String,
    /// `iss` claim of issued tokens
    pub issuer: String,
    /// Mark the session cookie `Secure`
    pub secure_cookie: bool,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("challenge", &String::from_utf8_lossy(&self.challenge))
            .field("jwt_secret", &"****")
            .field("issuer", &self.issuer)
            .field("secure_cookie", &self.secure_cookie)
            .finish()
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub public_key: String,
    pub token: SessionToken,
    pub account: AccountRecord,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    verifier: Arc<dyn SignatureVerifier>,
    ledger: Arc<dyn LedgerAccountLookup>,
    codec: SessionTokenCodec,
    challenge: Arc<[u8]>,
    secure_cookie: bool,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        settings: AuthSettings,
        verifier: Arc<dyn SignatureVerifier>,
        ledger: Arc<dyn LedgerAccountLookup>,
    ) -> Self {
        Self {
            verifier,
            ledger,
            codec: SessionTokenCodec::new(&settings.jwt_secret, settings.issuer),
            challenge: settings.challenge.into(),
            secure_cookie: settings.secure_cookie,
        }
    }

    /// Authenticate a wallet by its signature over the challenge.
    ///
    /// The ledger is only consulted once the signature has verified.
    pub async fn authenticate(
        &self,
        public_key: Option<&str>,
        signed_challenge: Option<&str>,
    ) -> Result<Authenticated, AuthError> {
        let public_key = required_field("public_key", public_key)?;
        let signed_challenge = required_field("signed_challenge", signed_challenge)?;

        let signature = decode_signature(signed_challenge)?;
        tracing::debug!(public_key = %public_key, "Auth request validated");

        self.verifier
            .verify(public_key, &self.challenge, &signature)
            .inspect_err(|e| {
                tracing::warn!(public_key = %public_key, error = %e, "Signature rejected");
            })?;
        tracing::debug!(public_key = %public_key, "Signature checked");

        let account = self
            .ledger
            .fetch_account(public_key)
            .await
            .inspect_err(|e| match e {
                LedgerError::AccountNotFound => {
                    tracing::warn!(public_key = %public_key, "Account not found on ledger");
                }
                _ => {
                    tracing::error!(public_key = %public_key, error = %e, "Ledger lookup failed");
                }
            })?;
        tracing::debug!(public_key = %public_key, "Account verified");

        let token = self.codec.issue(public_key).inspect_err(|e| {
            tracing::error!(public_key = %public_key, error = %e, "Token issuance failed");
        })?;

        tracing::info!(public_key = %public_key, expires_at = token.claims.exp, "Session issued");

        Ok(Authenticated {
            public_key: public_key.to_string(),
            token,
            account,
        })
    }

    /// Validate a session token and return the public key it was issued for
    pub fn validate_session(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.codec.decode(token)?;
        Ok(claims.sub)
    }

    /// Cookie delivering `token` to the browser
    pub fn session_cookie(&self, token: &SessionToken) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, token.value.clone()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(CookieDuration::seconds(token.max_age_seconds()))
            .secure(self.secure_cookie)
            .build()
    }

    /// Removal cookie for logout.
    ///
    /// Tokens are stateless, so this only asks the client to forget the
    /// session; the token itself stays valid until it expires.
    pub fn logout(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
            .http_only(true)
            .same_site(SameSite::Strict)
            .path("/")
            .secure(self.secure_cookie)
            .build();
        cookie.make_removal();
        cookie
    }

    pub fn codec(&self) -> &SessionTokenCodec {
        &self.codec
    }
}

fn required_field<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, AuthError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AuthError::MalformedRequest(format!("{} is required", name))),
    }
}

/// Decode the base64 signature, accepting the URL-safe alphabet as well
fn decode_signature(encoded: &str) -> Result<Vec<u8>, AuthError> {
    general_purpose::STANDARD
        .decode(encoded)
        .or_else(|_| general_purpose::URL_SAFE.decode(encoded))
        .or_else(|_| general_purpose::URL_SAFE_NO_PAD.decode(encoded))
        .map_err(|e| AuthError::MalformedRequest(format!("signed_challenge is not base64: {}", e)))
}
