//! Client configuration parsed from environment variables.
//!
//! Only the provider API key is injected per deployment; the rest of the
//! Firebase project configuration is static. Host overrides exist so the
//! adapters can be pointed at local mock servers.

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_STORAGE_HOST: &str = "https://firebasestorage.googleapis.com";
pub const DEFAULT_IDENTITY_HOST: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Static Firebase project settings.
pub const FIREBASE_AUTH_DOMAIN: &str = "mern-blog-5dfe1.firebaseapp.com";
pub const FIREBASE_STORAGE_BUCKET: &str = "mern-blog-5dfe1.appspot.com";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub firebase_api_key: Option<String>,
    pub storage_bucket: String,
    pub storage_host: String,
    pub identity_host: String,
    pub timeouts: Timeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            firebase_api_key: None,
            storage_bucket: FIREBASE_STORAGE_BUCKET.to_owned(),
            storage_host: DEFAULT_STORAGE_HOST.to_owned(),
            identity_host: DEFAULT_IDENTITY_HOST.to_owned(),
            timeouts: Timeouts::default(),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `BLOG_API_BASE_URL`: default `http://127.0.0.1:3000`
    /// - `FIREBASE_API_KEY` (or `VITE_FIREBASE_API_KEY`): needed for Google sign-in only
    /// - `FIREBASE_STORAGE_BUCKET`: default project bucket
    /// - `FIREBASE_STORAGE_HOST`, `FIREBASE_IDENTITY_HOST`: provider hosts
    /// - `BLOG_REQUEST_TIMEOUT_SECS`: default 60
    /// - `BLOG_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout variable is set but is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = trim_url(env_or("BLOG_API_BASE_URL", DEFAULT_API_BASE_URL));
        let firebase_api_key = non_empty_env("FIREBASE_API_KEY").or_else(|| non_empty_env("VITE_FIREBASE_API_KEY"));
        let storage_bucket = env_or("FIREBASE_STORAGE_BUCKET", FIREBASE_STORAGE_BUCKET);
        let storage_host = trim_url(env_or("FIREBASE_STORAGE_HOST", DEFAULT_STORAGE_HOST));
        let identity_host = trim_url(env_or("FIREBASE_IDENTITY_HOST", DEFAULT_IDENTITY_HOST));
        let timeouts = Timeouts {
            request_secs: env_parse_secs("BLOG_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_parse_secs("BLOG_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };

        Ok(Self { api_base_url, firebase_api_key, storage_bucket, storage_host, identity_host, timeouts })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .into_iter()
        .map(|v| v.trim().to_owned())
        .find(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    non_empty_env(key).unwrap_or_else(|| default.to_owned())
}

fn trim_url(raw: String) -> String {
    raw.trim_end_matches('/').to_owned()
}

fn env_parse_secs(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = non_empty_env(key) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidValue { var: key, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
