//! Session extraction
//!
//! Resolves the caller's session token from a bearer header or the session
//! cookie and validates it.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::auth::{AuthService, SESSION_COOKIE_NAME};
use crate::error::ApiError;

/// Caller holding a valid session token
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub public_key: String,
}

/// Extractor for authenticated sessions
///
/// The `Authorization: Bearer` header wins over the `jwt` cookie when both
/// are present.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(user: SessionUser) -> impl IntoResponse {
///     format!("Hello, {}", user.public_key)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = session_token(parts, state)
            .await
            .ok_or(ApiError::InvalidToken("Authentication token required"))?;

        let auth_service = Arc::<AuthService>::from_ref(state);
        let public_key = auth_service.validate_session(&token)?;

        Ok(SessionUser { public_key })
    }
}

async fn session_token<S>(parts: &mut Parts, state: &S) -> Option<String>
where
    S: Send + Sync,
{
    if let Ok(TypedHeader(Authorization(bearer))) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await
    {
        return Some(bearer.token().to_string());
    }

    CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
