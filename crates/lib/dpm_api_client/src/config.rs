//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::ClientResult;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Backend root, always ending in `/` so a path prefix such as
    /// `https://host/dpm` survives joining.
    pub base_url: Url,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Resolve an API path such as `/api/login` beneath `base_url`.
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Reads configuration from environment variables.
    ///
    /// | Variable           | Default                 |
    /// |--------------------|-------------------------|
    /// | `DPM_URL`          | `http://localhost:8080` |
    /// | `DPM_TIMEOUT_SECS` | `30`                    |
    pub fn from_env() -> ClientResult<Self> {
        let base_url = std::env::var("DPM_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let timeout = std::env::var("DPM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Ok(Self {
            timeout: Duration::from_secs(timeout),
            ..Self::new(&base_url)?
        })
    }
}
