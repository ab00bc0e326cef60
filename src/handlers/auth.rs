//! Authentication HTTP handlers
//!
//! Endpoints for Stellar wallet authentication.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use axum_extra::extract::CookieJar;

use super::SessionUser;
use crate::auth::AuthService;
use crate::error::ApiResult;
use crate::models::{
    AccountInfo, MeResponse, MessageResponse, StellarAuthRequest, StellarAuthResponse,
};

/// POST /auth/stellar - Verify a signed challenge and start a session
pub async fn stellar_auth(
    State(auth_service): State<Arc<AuthService>>,
    jar: CookieJar,
    payload: Result<Json<StellarAuthRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<StellarAuthResponse>)> {
    let Json(req) = payload?;

    let authenticated = auth_service
        .authenticate(req.public_key.as_deref(), req.signed_challenge.as_deref())
        .await?;

    let jar = jar.add(auth_service.session_cookie(&authenticated.token));

    let response = StellarAuthResponse {
        message: "Authentication successful".to_string(),
        account_info: AccountInfo::from_account(
            &authenticated.public_key,
            &authenticated.account,
        ),
    };

    Ok((jar, Json(response)))
}

/// GET /auth/me - Public key of the current session
pub async fn get_current_user(user: SessionUser) -> Json<MeResponse> {
    Json(MeResponse {
        public_key: user.public_key,
    })
}

/// POST /auth/logout - Ask the client to drop its session cookie
pub async fn logout(
    State(auth_service): State<Arc<AuthService>>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.add(auth_service.logout());
    (jar, Json(MessageResponse::new("Logged out successfully")))
}

/// GET /auth/test - Liveness check for the auth router
pub async fn auth_test() -> Json<MessageResponse> {
    Json(MessageResponse::new("Auth router is working"))
}
