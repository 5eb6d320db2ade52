//! Controllers for each user-facing flow.
//!
//! ARCHITECTURE
//! ============
//! Each controller owns the transient state of one screen or widget and
//! reaches the outside world only through `net` traits, `AppContext` and a
//! `Navigator`. Every public operation is an async call with exactly one
//! outcome; nothing is retried.
//!
//! ERROR HANDLING
//! ==============
//! `FlowError`'s `Display` is the text shown to the user. Validation
//! failures never reach the network. Sign-in and sign-out failures are
//! logged with `tracing::error!` and also returned.

pub mod create_post;
pub mod header;
pub mod oauth;
pub mod sign_up;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;

pub const GENERIC_FAILURE: &str = "Something went wrong";

/// What a controller reports when an operation does not succeed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    /// A client-side precondition failed; no request was made.
    #[error("{0}")]
    Validation(String),

    /// The same operation is already running.
    #[error("Please wait for the current request to finish")]
    Busy,

    #[error("{0}")]
    Upload(String),

    #[error("Image upload cancelled")]
    UploadCancelled,

    #[error("{0}")]
    Publish(String),

    #[error("{0}")]
    SignUp(String),

    #[error("{0}")]
    SignIn(String),

    #[error("{0}")]
    SignOut(String),
}

/// Message for a failed response: the body's `message`, else `fallback`.
fn response_message(response: &crate::net::types::ApiResponse, fallback: &str) -> String {
    response
        .message()
        .filter(|m| !m.trim().is_empty())
        .map_or_else(|| fallback.to_owned(), str::to_owned)
}
