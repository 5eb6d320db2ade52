//! "Continue with Google" flow.
//!
//! Each run asks the identity provider for an assertion, exchanges it with
//! the backend for a session, and stores the session in the context. A run
//! that fails at any step leaves the context as it was, so the button can
//! simply be pressed again.

#[cfg(test)]
#[path = "oauth_test.rs"]
mod oauth_test;

use std::sync::Arc;

use super::{FlowError, GENERIC_FAILURE, response_message};
use crate::net::api::BlogApi;
use crate::net::identity::IdentityProvider;
use crate::net::types::{GoogleSignInRequest, SessionUser};
use crate::routes::{Navigator, Route};
use crate::state::session::AppContext;

pub struct GoogleSignIn {
    api: Arc<dyn BlogApi>,
    identity: Arc<dyn IdentityProvider>,
    ctx: AppContext,
}

impl GoogleSignIn {
    #[must_use]
    pub fn new(api: Arc<dyn BlogApi>, identity: Arc<dyn IdentityProvider>, ctx: AppContext) -> Self {
        Self { api, identity, ctx }
    }

    /// Sign in with the federated identity and go home.
    ///
    /// # Errors
    ///
    /// `SignIn` when the provider step is aborted or rejected, the backend
    /// exchange fails, or the session cannot be read. The failure is also
    /// logged.
    pub async fn run(&self, nav: &dyn Navigator) -> Result<SessionUser, FlowError> {
        match self.exchange().await {
            Ok(user) => {
                self.ctx.sign_in_success(user.clone());
                nav.navigate(&Route::Home.path());
                Ok(user)
            }
            Err(message) => {
                tracing::error!(error = %message, "google sign-in failed");
                Err(FlowError::SignIn(message))
            }
        }
    }

    async fn exchange(&self) -> Result<SessionUser, String> {
        let assertion = self.identity.sign_in().await.map_err(|e| e.to_string())?;
        let request = GoogleSignInRequest {
            name: assertion.name,
            email: assertion.email,
            google_photo_url: assertion.photo_url,
        };

        let response = self.api.google_sign_in(&request).await.map_err(|e| e.to_string())?;
        if !response.is_success() {
            return Err(response_message(&response, GENERIC_FAILURE));
        }
        response.parse::<SessionUser>().map_err(|e| e.to_string())
    }
}
