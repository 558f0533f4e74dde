//! API server configuration.

use dpm_core::auth::jwt::random_id;
use tracing::info;

/// Default lifetime of an application bind token.
pub const DEFAULT_BIND_TOKEN_EXPIRY_HOURS: i64 = 48;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// JWT signing secret, shared by access and bind tokens.
    pub jwt_secret: String,
    /// Password accepted for every human principal.
    pub dev_password: String,
    pub bind_token_expiry_hours: i64,
    /// Load the demo groups, users, topics and applications at startup.
    pub seed_demo_data: bool,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                      | Default            |
    /// |-------------------------------|--------------------|
    /// | `BIND_ADDR`                   | `127.0.0.1:8080`   |
    /// | `JWT_SECRET`                  | random per process |
    /// | `DPM_DEV_PASSWORD`            | `password`         |
    /// | `DPM_BIND_TOKEN_EXPIRY_HOURS` | `48`               |
    /// | `DPM_SEED_DEMO_DATA`          | `true`             |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into()),
            jwt_secret: resolve_jwt_secret(),
            dev_password: std::env::var("DPM_DEV_PASSWORD").unwrap_or_else(|_| "password".into()),
            bind_token_expiry_hours: std::env::var("DPM_BIND_TOKEN_EXPIRY_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BIND_TOKEN_EXPIRY_HOURS),
            seed_demo_data: std::env::var("DPM_SEED_DEMO_DATA")
                .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
        }
    }

    /// Seeded configuration for tests and embedding.
    pub fn for_tests() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".into(),
            jwt_secret: "test-secret".into(),
            dev_password: "password".into(),
            bind_token_expiry_hours: DEFAULT_BIND_TOKEN_EXPIRY_HOURS,
            seed_demo_data: true,
        }
    }
}

/// `JWT_SECRET` if set, otherwise a fresh random secret. Tokens issued with a
/// generated secret do not survive a restart.
fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    info!("JWT_SECRET not set, generated a per-process secret");
    random_id(64)
}
