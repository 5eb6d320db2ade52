//! Credential sign-up form.

#[cfg(test)]
#[path = "sign_up_test.rs"]
mod sign_up_test;

use std::sync::Arc;

use tokio::sync::watch;

use super::{FlowError, GENERIC_FAILURE, response_message};
use crate::net::api::BlogApi;
use crate::net::types::SignUpRequest;
use crate::routes::{Navigator, Route};

pub const MISSING_FIELDS_MESSAGE: &str = "Please fill out all fields.";

/// Form values, trimmed on entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignUpForm {
    /// Update the field named by its input id. Unknown ids are ignored.
    pub fn set_field(&mut self, id: &str, value: &str) -> bool {
        let slot = match id {
            "username" => &mut self.username,
            "email" => &mut self.email,
            "password" => &mut self.password,
            _ => return false,
        };
        value.trim().clone_into(slot);
        true
    }

    fn is_complete(&self) -> bool {
        !(self.username.is_empty() || self.email.is_empty() || self.password.is_empty())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormStatus {
    pub loading: bool,
    pub error: Option<String>,
}

pub struct SignUpController {
    api: Arc<dyn BlogApi>,
    status: watch::Sender<FormStatus>,
}

impl SignUpController {
    #[must_use]
    pub fn new(api: Arc<dyn BlogApi>) -> Self {
        let (status, _) = watch::channel(FormStatus::default());
        Self { api, status }
    }

    #[must_use]
    pub fn status(&self) -> FormStatus {
        self.status.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FormStatus> {
        self.status.subscribe()
    }

    /// Create the account, then send the user to sign in.
    ///
    /// # Errors
    ///
    /// - `Validation` when a field is empty (no request is made)
    /// - `Busy` while a previous submit is in flight
    /// - `SignUp` with the server's message or the transport error
    pub async fn submit(&self, form: &SignUpForm, nav: &dyn Navigator) -> Result<(), FlowError> {
        if !form.is_complete() {
            self.status.send_modify(|s| s.error = Some(MISSING_FIELDS_MESSAGE.to_owned()));
            return Err(FlowError::Validation(MISSING_FIELDS_MESSAGE.to_owned()));
        }

        let started = self.status.send_if_modified(|s| {
            if s.loading {
                return false;
            }
            s.loading = true;
            s.error = None;
            true
        });
        if !started {
            return Err(FlowError::Busy);
        }

        let outcome = self.register(form).await;
        self.status.send_modify(|s| {
            s.loading = false;
            s.error = outcome.as_ref().err().cloned();
        });

        match outcome {
            Ok(()) => {
                tracing::info!(username = %form.username, "account created");
                nav.navigate(&Route::SignIn.path());
                Ok(())
            }
            Err(message) => {
                tracing::warn!(error = %message, "sign-up failed");
                Err(FlowError::SignUp(message))
            }
        }
    }

    async fn register(&self, form: &SignUpForm) -> Result<(), String> {
        let request = SignUpRequest {
            username: form.username.clone(),
            email: form.email.clone(),
            password: form.password.clone(),
        };
        let response = self.api.sign_up(&request).await.map_err(|e| e.to_string())?;

        if response.success_flag() == Some(false) || !response.is_success() {
            return Err(response_message(&response, GENERIC_FAILURE));
        }
        Ok(())
    }
}
