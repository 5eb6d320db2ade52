//! REST backend seam and its `reqwest` implementation.
//!
//! ERROR HANDLING
//! ==============
//! Only transport failures are errors here. Any status the server returns,
//! success or not, comes back as an `ApiResponse` so controllers can read
//! `message`/`success` from error bodies.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde::Serialize;

use super::types::{ApiError, ApiResponse, GoogleSignInRequest, SignUpRequest};
use crate::config::{ClientConfig, Timeouts};
use crate::state::draft::Draft;

pub const SIGN_UP_PATH: &str = "/api/auth/signup";
pub const GOOGLE_SIGN_IN_PATH: &str = "/api/auth/google";
pub const SIGN_OUT_PATH: &str = "/api/user/signout";
pub const CREATE_POST_PATH: &str = "/api/post/create";

/// Name of the backend's session cookie.
pub const SESSION_COOKIE: &str = "access_token";

/// Calls the blog backend makes available to the client.
#[async_trait::async_trait]
pub trait BlogApi: Send + Sync {
    /// `POST /api/auth/signup`.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<ApiResponse, ApiError>;

    /// `POST /api/auth/google`.
    async fn google_sign_in(&self, request: &GoogleSignInRequest) -> Result<ApiResponse, ApiError>;

    /// `POST /api/user/signout`.
    async fn sign_out(&self) -> Result<ApiResponse, ApiError>;

    /// `POST /api/post/create`.
    async fn create_post(&self, draft: &Draft) -> Result<ApiResponse, ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// `reqwest`-backed `BlogApi`.
///
/// Keeps a cookie store so a session cookie set by sign-in is sent on
/// later calls from the same process. A token passed in explicitly is
/// sent as the session cookie on every request.
pub struct HttpBlogApi {
    http: reqwest::Client,
    base_url: String,
    session_token: Option<String>,
}

impl HttpBlogApi {
    /// Build a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str, timeouts: Timeouts) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request())
            .connect_timeout(timeouts.connect())
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned(), session_token: None })
    }

    /// Build a client from parsed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.timeouts)
    }

    /// Send `token` as the session cookie on every request.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    async fn post<B: Serialize + ?Sized + Sync>(&self, path: &str, body: Option<&B>) -> Result<ApiResponse, ApiError> {
        let url = endpoint_url(&self.base_url, path);
        tracing::debug!(%url, "POST");

        let mut request = self.http.post(&url);
        if let Some(token) = &self.session_token {
            request = request.header(reqwest::header::COOKIE, session_cookie(token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        tracing::debug!(%url, status, "response");
        Ok(ApiResponse::new(status, parse_body(&text)))
    }
}

#[async_trait::async_trait]
impl BlogApi for HttpBlogApi {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<ApiResponse, ApiError> {
        self.post(SIGN_UP_PATH, Some(request)).await
    }

    async fn google_sign_in(&self, request: &GoogleSignInRequest) -> Result<ApiResponse, ApiError> {
        self.post(GOOGLE_SIGN_IN_PATH, Some(request)).await
    }

    async fn sign_out(&self) -> Result<ApiResponse, ApiError> {
        self.post::<()>(SIGN_OUT_PATH, None).await
    }

    async fn create_post(&self, draft: &Draft) -> Result<ApiResponse, ApiError> {
        self.post(CREATE_POST_PATH, Some(draft)).await
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}")
}

/// Parse a response body as JSON; empty or malformed bodies become `Null`.
fn parse_body(text: &str) -> serde_json::Value {
    if text.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(text).unwrap_or(serde_json::Value::Null)
}
