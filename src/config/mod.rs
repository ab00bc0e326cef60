//! Configuration management for the ticketing API
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).
//! Secrets fall back to development defaults only outside production.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use thiserror::Error;

use crate::auth::AuthSettings;
use crate::middleware::DEFAULT_MAX_BUCKETS;

const DEV_JWT_SECRET: &str = "development-secret-change-in-production";
const DEV_AUTH_CHALLENGE: &str = "AstroCodersAuth123";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),
}

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Address the HTTP listener binds to
    pub host: IpAddr,

    /// Server port
    pub port: u16,

    /// Stellar Horizon API URL
    pub horizon_url: String,

    /// Timeout applied to every Horizon request
    pub ledger_timeout: Duration,

    /// Secret used to sign session tokens (HS256)
    pub jwt_secret: String,

    /// Fixed challenge every wallet signs to authenticate
    pub auth_challenge: String,

    /// `iss` claim stamped into and required from session tokens
    pub token_issuer: String,

    /// Rate limit on `/auth/*`: requests per second per client
    pub auth_rate_limit_rps: u32,

    /// Maximum number of clients the rate limiter tracks at once
    pub auth_rate_limit_max_clients: usize,

    /// Key rate limiting on `X-Forwarded-For` / `X-Real-IP` instead of the peer address
    pub trust_proxy_headers: bool,

    /// CORS allowed origins
    pub cors_allowed_origins: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// `from_env` passes the process environment; tests pass a fixture map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let host = match var("HOST") {
            Some(h) => h.parse::<IpAddr>().map_err(|_| {
                ConfigError::InvalidValue(format!("HOST is not an IP address: {}", h))
            })?,
            None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };

        let port = var("PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let horizon_url = var("HORIZON_URL")
            .unwrap_or_else(|| "https://horizon-testnet.stellar.org".to_string());

        let ledger_timeout_seconds = var("LEDGER_TIMEOUT_SECONDS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .unwrap_or(10);

        let jwt_secret = required_secret(&var, environment, "JWT_SECRET", DEV_JWT_SECRET)?;
        let auth_challenge =
            required_secret(&var, environment, "AUTH_CHALLENGE", DEV_AUTH_CHALLENGE)?;

        let token_issuer = var("TOKEN_ISSUER").unwrap_or_else(|| "ticketing-api".to_string());

        let auth_rate_limit_rps = var("AUTH_RATE_LIMIT_RPS")
            .unwrap_or_else(|| "5".to_string())
            .parse::<u32>()
            .ok()
            .filter(|rps| *rps > 0)
            .unwrap_or(5);

        let auth_rate_limit_max_clients = var("AUTH_RATE_LIMIT_MAX_CLIENTS")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|max| *max > 0)
            .unwrap_or(DEFAULT_MAX_BUCKETS);

        let trust_proxy_headers = match var("TRUST_PROXY_HEADERS") {
            Some(v) => parse_bool(&v).ok_or_else(|| {
                ConfigError::InvalidValue(format!("TRUST_PROXY_HEADERS is not a boolean: {}", v))
            })?,
            None => false,
        };

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS");

        Ok(Config {
            environment,
            host,
            port,
            horizon_url,
            ledger_timeout: Duration::from_secs(ledger_timeout_seconds),
            jwt_secret,
            auth_challenge,
            token_issuer,
            auth_rate_limit_rps,
            auth_rate_limit_max_clients,
            trust_proxy_headers,
            cors_allowed_origins,
        })
    }

    /// Immutable settings handed to the authenticator
    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            challenge: self.auth_challenge.clone().into_bytes(),
            jwt_secret: self.jwt_secret.clone(),
            issuer: self.token_issuer.clone(),
            secure_cookie: self.environment.is_production(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Secrets must be set explicitly in production; elsewhere a development value is used.
fn required_secret<F>(
    var: &F,
    environment: Environment,
    key: &str,
    dev_default: &str,
) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => Ok(value),
        None if environment.is_production() => Err(ConfigError::MissingEnvVar(key.to_string())),
        None => {
            tracing::warn!(
                variable = key,
                environment = environment.as_str(),
                "Secret not set, using development default"
            );
            Ok(dev_default.to_string())
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("environment", &self.environment)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("horizon_url", &self.horizon_url)
            .field("ledger_timeout", &self.ledger_timeout)
            .field("jwt_secret", &"****")
            .field("auth_challenge", &self.auth_challenge)
            .field("token_issuer", &self.token_issuer)
            .field("auth_rate_limit_rps", &self.auth_rate_limit_rps)
            .field("auth_rate_limit_max_clients", &self.auth_rate_limit_max_clients)
            .field("trust_proxy_headers", &self.trust_proxy_headers)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}
