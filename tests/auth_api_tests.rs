//! End-to-end tests of the authentication routes
//!
//! The full router runs in-process against an in-memory ledger, so these
//! tests need no network or Horizon access.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{header, Request, Response, StatusCode};
    use axum::Router;
    use base64::{engine::general_purpose, Engine as _};
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use ticketing_server::auth::{
        encode_account_id, AuthService, AuthSettings, SessionTokenCodec, StellarSignatureVerifier,
    };
    use ticketing_server::ledger::{AccountRecord, Balance, LedgerAccountLookup, LedgerError};
    use ticketing_server::middleware::RateLimiter;
    use ticketing_server::routes::app_router;
    use ticketing_server::state::AppState;

    const CHALLENGE: &str = "AstroCodersAuth123";
    const SECRET: &str = "integration-secret";
    const ISSUER: &str = "ticketing-api";

    /// Ledger stand-in that records how often it was consulted
    #[derive(Default)]
    struct RecordingLedger {
        accounts: HashMap<String, AccountRecord>,
        outage: bool,
        calls: AtomicUsize,
    }

    impl RecordingLedger {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LedgerAccountLookup for RecordingLedger {
        async fn fetch_account(&self, account_id: &str) -> Result<AccountRecord, LedgerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.outage {
                return Err(LedgerError::Unavailable(
                    "dial tcp 10.1.2.3:443: connection refused".to_string(),
                ));
            }
            self.accounts
                .get(account_id)
                .cloned()
                .ok_or(LedgerError::AccountNotFound)
        }
    }

    struct Wallet {
        key: SigningKey,
        address: String,
    }

    impl Wallet {
        fn generate() -> Self {
            let key = SigningKey::generate(&mut OsRng);
            let address = encode_account_id(key.verifying_key().as_bytes());
            Self { key, address }
        }

        fn sign(&self, message: &[u8]) -> String {
            general_purpose::STANDARD.encode(self.key.sign(message).to_bytes())
        }
    }

    fn funded_account(id: &str) -> AccountRecord {
        AccountRecord {
            id: id.to_string(),
            balances: vec![
                Balance {
                    asset_type: "native".to_string(),
                    amount: "100".to_string(),
                },
                Balance {
                    asset_type: "credit_alphanum4".to_string(),
                    amount: "5".to_string(),
                },
            ],
        }
    }

    fn app_with(ledger: Arc<RecordingLedger>, rate_limiter: RateLimiter) -> Router {
        let settings = AuthSettings {
            challenge: CHALLENGE.as_bytes().to_vec(),
            jwt_secret: SECRET.to_string(),
            issuer: ISSUER.to_string(),
            secure_cookie: false,
        };
        let auth_service = Arc::new(AuthService::new(
            settings,
            Arc::new(StellarSignatureVerifier),
            ledger,
        ));
        app_router(AppState::new(auth_service, rate_limiter))
    }

    fn app(ledger: Arc<RecordingLedger>) -> Router {
        app_with(ledger, RateLimiter::new(1_000))
    }

    fn ledger_with(accounts: &[&str]) -> Arc<RecordingLedger> {
        let mut ledger = RecordingLedger::default();
        for id in accounts {
            ledger.accounts.insert(id.to_string(), funded_account(id));
        }
        Arc::new(ledger)
    }

    fn login_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/auth/stellar")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn set_cookie(response: &Response<Body>) -> String {
        response
            .headers()
            .get(header::SET_COOKIE)
            .expect("Set-Cookie header")
            .to_str()
            .unwrap()
            .to_string()
    }

    fn cookie_value(set_cookie: &str) -> String {
        set_cookie
            .split(';')
            .next()
            .and_then(|pair| pair.strip_prefix("jwt="))
            .expect("jwt cookie")
            .to_string()
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_filters_balances() {
        let wallet = Wallet::generate();
        let ledger = ledger_with(&[wallet.address.as_str()]);

        let response = app(ledger.clone())
            .oneshot(login_request(json!({
                "publicKey": wallet.address,
                "signedChallenge": wallet.sign(CHALLENGE.as_bytes()),
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let cookie = set_cookie(&response);
        assert!(cookie.starts_with("jwt="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=86400"));

        let claims = SessionTokenCodec::new(SECRET, ISSUER)
            .decode(&cookie_value(&cookie))
            .unwrap();
        assert_eq!(claims.sub, wallet.address);

        let body = json_body(response).await;
        assert_eq!(body["account_info"]["public_key"], wallet.address);
        assert_eq!(
            body["account_info"]["balances"],
            json!([{"asset_type": "native", "amount": "100"}])
        );
        assert!(body["message"].is_string());
        assert_eq!(ledger.calls(), 1);
    }

    #[tokio::test]
    async fn test_snake_case_body_accepted() {
        let wallet = Wallet::generate();
        let ledger = ledger_with(&[wallet.address.as_str()]);

        let response = app(ledger)
            .oneshot(login_request(json!({
                "public_key": wallet.address,
                "signed_challenge": wallet.sign(CHALLENGE.as_bytes()),
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_signed_challenge_is_bad_request_without_ledger_call() {
        let wallet = Wallet::generate();
        let ledger = ledger_with(&[wallet.address.as_str()]);

        let response = app(ledger.clone())
            .oneshot(login_request(json!({ "public_key": wallet.address })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "MALFORMED_REQUEST");
        assert_eq!(ledger.calls(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_body_is_bad_request() {
        let ledger = ledger_with(&[]);

        let request = Request::builder()
            .method("POST")
            .uri("/auth/stellar")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app(ledger.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ledger.calls(), 0);
    }

    #[tokio::test]
    async fn test_wrong_signature_and_unknown_account_look_the_same() {
        let wallet = Wallet::generate();
        let stranger = Wallet::generate();
        let ledger = ledger_with(&[wallet.address.as_str()]);

        let bad_signature = app(ledger.clone())
            .oneshot(login_request(json!({
                "public_key": wallet.address,
                "signed_challenge": wallet.sign(b"not the challenge"),
            })))
            .await
            .unwrap();
        assert_eq!(bad_signature.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ledger.calls(), 0);

        let unknown_account = app(ledger.clone())
            .oneshot(login_request(json!({
                "public_key": stranger.address,
                "signed_challenge": stranger.sign(CHALLENGE.as_bytes()),
            })))
            .await
            .unwrap();
        assert_eq!(unknown_account.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ledger.calls(), 1);

        assert_eq!(
            json_body(bad_signature).await,
            json_body(unknown_account).await
        );
    }

    #[tokio::test]
    async fn test_ledger_outage_is_generic_internal_error() {
        let wallet = Wallet::generate();
        let ledger = Arc::new(RecordingLedger {
            outage: true,
            ..RecordingLedger::default()
        });

        let response = app(ledger)
            .oneshot(login_request(json!({
                "public_key": wallet.address,
                "signed_challenge": wallet.sign(CHALLENGE.as_bytes()),
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert!(!body.to_string().contains("10.1.2.3"));
    }

    #[tokio::test]
    async fn test_me_accepts_cookie_and_bearer() {
        let wallet = Wallet::generate();
        let token = SessionTokenCodec::new(SECRET, ISSUER)
            .issue(&wallet.address)
            .unwrap();
        let app = app(ledger_with(&[]));

        let via_cookie = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/auth/me")
                    .header(header::COOKIE, format!("theme=dark; jwt={}", token.value))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(via_cookie.status(), StatusCode::OK);
        assert_eq!(
            json_body(via_cookie).await,
            json!({ "public_key": wallet.address })
        );

        let via_bearer = app
            .oneshot(
                Request::builder()
                    .uri("/auth/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token.value))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(via_bearer.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_me_rejections() {
        let app = app(ledger_with(&[]));

        let missing = app
            .clone()
            .oneshot(Request::builder().uri("/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(missing).await["error"]["code"], "INVALID_TOKEN");

        let forged = SessionTokenCodec::new("another-secret", ISSUER)
            .issue("GABC")
            .unwrap();
        let invalid = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/auth/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", forged.value))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(invalid).await["error"]["code"], "INVALID_TOKEN");

        let stale = SessionTokenCodec::new(SECRET, ISSUER)
            .issue_at("GABC", 1_000)
            .unwrap();
        let expired = app
            .oneshot(
                Request::builder()
                    .uri("/auth/me")
                    .header(header::COOKIE, format!("jwt={}", stale.value))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(expired).await["error"]["code"], "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_login_then_me_round_trip() {
        let wallet = Wallet::generate();
        let app = app(ledger_with(&[wallet.address.as_str()]));

        let login = app
            .clone()
            .oneshot(login_request(json!({
                "public_key": wallet.address,
                "signed_challenge": wallet.sign(CHALLENGE.as_bytes()),
            })))
            .await
            .unwrap();
        let token = cookie_value(&set_cookie(&login));

        let me = app
            .oneshot(
                Request::builder()
                    .uri("/auth/me")
                    .header(header::COOKIE, format!("jwt={}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(json_body(me).await["public_key"], wallet.address);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let app = app(ledger_with(&[]));

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/auth/logout")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let cookie = set_cookie(&response);
            assert!(cookie.starts_with("jwt=;"));
            assert!(cookie.contains("Path=/"));
            assert!(cookie.contains("Max-Age=0"));
        }
    }

    #[tokio::test]
    async fn test_liveness_and_health() {
        let app = app(ledger_with(&[]));

        let liveness = app
            .clone()
            .oneshot(Request::builder().uri("/auth/test").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(liveness.status(), StatusCode::OK);
        assert_eq!(
            liveness.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );
        assert!(liveness.headers().get("x-request-id").is_some());

        let health = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);
        assert_eq!(
            health.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
            "nosniff"
        );
    }

    #[tokio::test]
    async fn test_auth_routes_are_rate_limited() {
        let app = app_with(ledger_with(&[]), RateLimiter::new(1));

        let ping = || {
            Request::builder()
                .uri("/auth/test")
                .header("x-forwarded-for", "203.0.113.9")
                .body(Body::empty())
                .unwrap()
        };

        // Burst of two, then throttled
        assert_eq!(
            app.clone().oneshot(ping()).await.unwrap().status(),
            StatusCode::OK
        );
        assert_eq!(
            app.clone().oneshot(ping()).await.unwrap().status(),
            StatusCode::OK
        );

        let throttled = app.clone().oneshot(ping()).await.unwrap();
        assert_eq!(throttled.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(throttled.headers().get(header::RETRY_AFTER).unwrap(), "1");

        // The health route sits outside the limiter
        let health = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);
    }

    fn from_peer(forwarded_for: &str) -> Request<Body> {
        Request::builder()
            .uri("/auth/test")
            .header("x-forwarded-for", forwarded_for)
            .extension(ConnectInfo(SocketAddr::from(([192, 0, 2, 10], 5000))))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_rotating_forwarded_for_does_not_reset_bucket() {
        let app = app_with(ledger_with(&[]), RateLimiter::new(1));

        let mut statuses = Vec::new();
        for i in 0..10 {
            let response = app
                .clone()
                .oneshot(from_peer(&format!("10.0.0.{}", i)))
                .await
                .unwrap();
            statuses.push(response.status());
        }

        let allowed = statuses.iter().filter(|s| **s == StatusCode::OK).count();
        assert_eq!(allowed, 2);
        assert_eq!(statuses[9], StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_trusted_proxy_headers_separate_clients() {
        let limiter = RateLimiter::new(1).with_trusted_proxy_headers(true);
        let app = app_with(ledger_with(&[]), limiter);

        for i in 0..5 {
            let response = app
                .clone()
                .oneshot(from_peer(&format!("10.0.0.{}", i)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
