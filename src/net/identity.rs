//! Federated identity seam and the Firebase Auth REST implementation.
//!
//! The interactive Google account picker is outside this crate. What the
//! client consumes is its result: a Google ID token, which Firebase
//! `accounts:signInWithIdp` turns into a verified profile. Without a token
//! the provider reports an abort, the same outcome as a closed popup.

#[cfg(test)]
#[path = "identity_test.rs"]
mod identity_test;

use serde::{Deserialize, Serialize};

use crate::config::{ClientConfig, FIREBASE_AUTH_DOMAIN, Timeouts};

const GOOGLE_PROVIDER_ID: &str = "google.com";

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The user closed the account picker or no credential was supplied.
    #[error("sign-in aborted: {0}")]
    Aborted(String),

    /// The identity provider refused the credential.
    #[error("identity provider rejected sign-in: {0}")]
    Rejected(String),

    /// The request to the identity provider failed.
    #[error("identity request failed: {0}")]
    Request(String),

    /// Required provider configuration is missing.
    #[error("identity provider not configured: {0}")]
    NotConfigured(String),
}

/// Profile asserted by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityAssertion {
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

/// Produces one identity assertion per call.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self) -> Result<IdentityAssertion, IdentityError>;
}

// =============================================================================
// FIREBASE AUTH
// =============================================================================

pub struct FirebaseIdentity {
    http: reqwest::Client,
    host: String,
    api_key: String,
    google_id_token: Option<String>,
}

impl FirebaseIdentity {
    /// Build a client for the identity toolkit on `host`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(host: &str, api_key: &str, timeouts: Timeouts) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request())
            .connect_timeout(timeouts.connect())
            .build()
            .map_err(|e| IdentityError::Request(e.to_string()))?;
        Ok(Self { http, host: host.trim_end_matches('/').to_owned(), api_key: api_key.to_owned(), google_id_token: None })
    }

    /// Build a client from parsed config.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` when no Firebase API key is set.
    pub fn from_config(config: &ClientConfig) -> Result<Self, IdentityError> {
        let api_key = config
            .firebase_api_key
            .as_deref()
            .ok_or_else(|| IdentityError::NotConfigured("FIREBASE_API_KEY is not set".to_owned()))?;
        Self::new(&config.identity_host, api_key, config.timeouts)
    }

    /// Use `token` as the Google credential for the next sign-in.
    #[must_use]
    pub fn with_google_id_token(mut self, token: Option<String>) -> Self {
        self.google_id_token = token.filter(|t| !t.trim().is_empty());
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_secure_token: bool,
    return_idp_credential: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpResponse {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    email: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

#[async_trait::async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in(&self) -> Result<IdentityAssertion, IdentityError> {
        let Some(id_token) = self.google_id_token.as_deref() else {
            return Err(IdentityError::Aborted("no Google credential supplied".to_owned()));
        };

        let url = sign_in_url(&self.host, &self.api_key);
        let request_uri = auth_handler_uri(FIREBASE_AUTH_DOMAIN);
        let body = SignInWithIdpRequest {
            post_body: idp_post_body(id_token),
            request_uri: &request_uri,
            return_secure_token: true,
            return_idp_credential: true,
        };
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(IdentityError::Rejected(provider_error_message(&text, status.as_u16())));
        }
        parse_assertion(&text)
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn sign_in_url(host: &str, api_key: &str) -> String {
    format!("{host}/v1/accounts:signInWithIdp?key={}", urlencoding::encode(api_key))
}

/// Redirect target registered for the project's auth domain.
fn auth_handler_uri(auth_domain: &str) -> String {
    format!("https://{auth_domain}/__/auth/handler")
}

fn idp_post_body(id_token: &str) -> String {
    format!("id_token={}&providerId={GOOGLE_PROVIDER_ID}", urlencoding::encode(id_token))
}

fn provider_error_message(body: &str, status: u16) -> String {
    serde_json::from_str::<ProviderErrorBody>(body).map_or_else(|_| format!("status {status}"), |b| b.error.message)
}

fn parse_assertion(body: &str) -> Result<IdentityAssertion, IdentityError> {
    let resp: SignInWithIdpResponse =
        serde_json::from_str(body).map_err(|e| IdentityError::Rejected(format!("unexpected response: {e}")))?;
    let email = resp
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| IdentityError::Rejected("provider returned no email".to_owned()))?;
    let name = resp
        .display_name
        .or(resp.full_name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.clone());
    Ok(IdentityAssertion { name, email, photo_url: resp.photo_url })
}
