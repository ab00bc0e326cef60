//! Authentication module
//!
//! Provides wallet-based authentication using Stellar addresses.
//! - Challenge-response authentication over a fixed, configured challenge
//! - Ledger existence check before any token is issued
//! - Stateless JWT sessions delivered as an HttpOnly cookie

mod crypto;
mod jwt;
mod service;

pub use crypto::{
    decode_account_id, encode_account_id, verify_stellar_signature, CryptoError,
    SignatureVerifier, StellarSignatureVerifier,
};
pub use jwt::{SessionClaims, SessionToken, SessionTokenCodec, TokenError, SESSION_TTL_SECONDS};
pub use service::{AuthError, AuthService, AuthSettings, Authenticated, SESSION_COOKIE_NAME};
