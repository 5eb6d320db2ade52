//! Wire DTOs for the blog REST backend.
//!
//! DESIGN
//! ======
//! Field names follow the backend's JSON (`_id`, `profilePicture`,
//! `googlePhotoUrl`) through serde renames so Rust code keeps snake case.
//! Responses are kept as raw `ApiResponse { status, body }` so each
//! controller decides what a status or a `success` flag means for its flow.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Avatar shown when the session user has no profile picture.
pub const DEFAULT_AVATAR: &str = "/default-avatar.png";

// =============================================================================
// ERROR
// =============================================================================

/// Transport-level failures talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// A response body did not have the expected shape.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// RESPONSE
// =============================================================================

/// Status and JSON body of a completed backend call.
///
/// An empty or non-JSON body is represented as `Value::Null`.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    /// True for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body's `message` field, when it is a string.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(serde_json::Value::as_str)
    }

    /// The body's `success` field, when it is a boolean.
    #[must_use]
    pub fn success_flag(&self) -> Option<bool> {
        self.body.get("success").and_then(serde_json::Value::as_bool)
    }

    /// Deserialize the body into `T`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Parse` if the body does not match `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        T::deserialize(&self.body).map_err(|e| ApiError::Parse(e.to_string()))
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Authenticated identity held by the client after sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(rename = "profilePicture", default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
}

impl SessionUser {
    /// Avatar URL, or the bundled default when the user has none.
    #[must_use]
    pub fn avatar_or_default(&self) -> &str {
        match self.avatar_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => DEFAULT_AVATAR,
        }
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Body of `POST /api/auth/signup`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/auth/google`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GoogleSignInRequest {
    pub name: String,
    pub email: String,
    #[serde(rename = "googlePhotoUrl")]
    pub google_photo_url: Option<String>,
}

/// The part of a created post the client needs.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CreatedPost {
    pub slug: String,
}
