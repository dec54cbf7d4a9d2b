use crate::error::{InvalidEnvVarSnafu, MissingEnvVarSnafu, Result};
use crate::storage::constants::{
    DEFAULT_API_URL, DEFAULT_DOWNLOAD_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_TRANSFER_TIMEOUT_SECS,
};
use snafu::OptionExt;
use std::env;
use std::fmt;
use std::time::Duration;

pub const API_TOKEN_ENV: &str = "STOWAGE_API_TOKEN";
const API_TOKEN_FALLBACK_ENV: &str = "STOWAGE_TOKEN";
const API_URL_ENV: &str = "STOWAGE_API_URL";
const DOWNLOAD_URL_ENV: &str = "STOWAGE_DOWNLOAD_URL";
const TIMEOUT_ENV: &str = "STOWAGE_TIMEOUT_SECS";
const TRANSFER_TIMEOUT_ENV: &str = "STOWAGE_UPLOAD_TIMEOUT_SECS";

/// Connection settings for the remote storage service.
#[derive(Clone)]
pub struct GatewayConfig {
    pub api_url: String,
    pub download_url: String,
    pub token: String,
    pub timeout: Duration,
    pub transfer_timeout: Duration,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_url", &self.api_url)
            .field("download_url", &self.download_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("transfer_timeout", &self.transfer_timeout)
            .finish()
    }
}

impl GatewayConfig {
    /// Default endpoints and timeouts with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            token: token.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            transfer_timeout: Duration::from_secs(DEFAULT_TRANSFER_TIMEOUT_SECS),
        }
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|t| !t.trim().is_empty());
        let token = present(API_TOKEN_ENV)
            .or_else(|| present(API_TOKEN_FALLBACK_ENV))
            .context(MissingEnvVarSnafu { key: API_TOKEN_ENV })?;

        let mut config = Self::new(token.trim());
        if let Some(url) = lookup(API_URL_ENV) {
            config.api_url = url;
        }
        if let Some(url) = lookup(DOWNLOAD_URL_ENV) {
            config.download_url = url;
        }
        if let Some(timeout) = seconds(&lookup, TIMEOUT_ENV)? {
            config.timeout = timeout;
        }
        if let Some(timeout) = seconds(&lookup, TRANSFER_TIMEOUT_ENV)? {
            config.transfer_timeout = timeout;
        }
        Ok(config)
    }
}

/// Load gateway configuration from environment variables
pub fn load_gateway_config() -> Result<GatewayConfig> {
    GatewayConfig::from_lookup(|key| env::var(key).ok())
}

// Parse a positive number of seconds, if the key is set.
fn seconds<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
        _ => InvalidEnvVarSnafu { key, value: raw }.fail(),
    }
}
