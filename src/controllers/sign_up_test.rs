use serde_json::json;

use super::*;
use crate::controllers::test_support::{ApiCall, MockApi};
use crate::net::types::{ApiError, ApiResponse, GoogleSignInRequest};
use crate::routes::MemoryHistory;
use crate::state::draft::Draft;

fn form(username: &str, email: &str, password: &str) -> SignUpForm {
    let mut form = SignUpForm::default();
    form.set_field("username", username);
    form.set_field("email", email);
    form.set_field("password", password);
    form
}

fn controller(api: MockApi) -> (SignUpController, Arc<MockApi>) {
    let api = Arc::new(api);
    (SignUpController::new(api.clone()), api)
}

// =========================================================================
// SignUpForm
// =========================================================================

#[test]
fn fields_are_trimmed_on_entry() {
    let form = form("  ada ", "\tada@example.com\n", " secret ");
    assert_eq!(form.username, "ada");
    assert_eq!(form.email, "ada@example.com");
    assert_eq!(form.password, "secret");
}

#[test]
fn unknown_field_is_ignored() {
    let mut form = SignUpForm::default();
    assert!(!form.set_field("nickname", "x"));
    assert_eq!(form, SignUpForm::default());
}

// =========================================================================
// submit
// =========================================================================

#[tokio::test]
async fn missing_field_fails_without_network() {
    let (ctl, api) = controller(MockApi::new());
    let nav = MemoryHistory::new("/sign-up");

    let err = ctl.submit(&form("ada", "   ", "secret"), &nav).await.unwrap_err();

    assert_eq!(err, FlowError::Validation(MISSING_FIELDS_MESSAGE.to_owned()));
    assert_eq!(err.to_string(), "Please fill out all fields.");
    assert!(api.calls().is_empty());
    assert_eq!(ctl.status(), FormStatus { loading: false, error: Some(MISSING_FIELDS_MESSAGE.to_owned()) });
    assert_eq!(nav.navigation_count(), 0);
}

#[tokio::test]
async fn success_navigates_to_sign_in() {
    let (ctl, api) = controller(MockApi::new().respond(200, json!("Signup successful")));
    let nav = MemoryHistory::new("/sign-up");

    ctl.submit(&form("ada", "ada@example.com", "secret"), &nav).await.unwrap();

    assert_eq!(nav.location(), "/sign-in");
    assert_eq!(ctl.status(), FormStatus::default());
    assert_eq!(
        api.calls(),
        vec![ApiCall::SignUp(SignUpRequest {
            username: "ada".to_owned(),
            email: "ada@example.com".to_owned(),
            password: "secret".to_owned(),
        })]
    );
}

#[tokio::test]
async fn success_flag_false_shows_message_without_navigation() {
    let (ctl, _) = controller(MockApi::new().respond(400, json!({"success": false, "message": "Email already taken"})));
    let nav = MemoryHistory::new("/sign-up");

    let err = ctl.submit(&form("ada", "ada@example.com", "secret"), &nav).await.unwrap_err();

    assert_eq!(err, FlowError::SignUp("Email already taken".to_owned()));
    assert_eq!(ctl.status(), FormStatus { loading: false, error: Some("Email already taken".to_owned()) });
    assert_eq!(nav.navigation_count(), 0);
}

#[tokio::test]
async fn success_flag_false_wins_over_ok_status() {
    let (ctl, _) = controller(MockApi::new().respond(200, json!({"success": false, "message": "Username taken"})));
    let nav = MemoryHistory::new("/sign-up");

    let err = ctl.submit(&form("ada", "ada@example.com", "secret"), &nav).await.unwrap_err();

    assert_eq!(err.to_string(), "Username taken");
    assert_eq!(nav.navigation_count(), 0);
}

#[tokio::test]
async fn non_ok_without_message_uses_fallback() {
    let (ctl, _) = controller(MockApi::new().respond(502, serde_json::Value::Null));

    let err = ctl.submit(&form("ada", "ada@example.com", "secret"), &MemoryHistory::default()).await.unwrap_err();

    assert_eq!(err, FlowError::SignUp(GENERIC_FAILURE.to_owned()));
    assert!(!ctl.status().loading);
}

#[tokio::test]
async fn transport_failure_clears_loading() {
    let (ctl, _) = controller(MockApi::new().fail(ApiError::Request("connection refused".to_owned())));

    let err = ctl.submit(&form("ada", "ada@example.com", "secret"), &MemoryHistory::default()).await.unwrap_err();

    assert!(err.to_string().contains("connection refused"));
    let status = ctl.status();
    assert!(!status.loading);
    assert_eq!(status.error, Some(err.to_string()));
}

#[tokio::test]
async fn resubmit_clears_previous_error() {
    let (ctl, _) = controller(
        MockApi::new()
            .respond(400, json!({"success": false, "message": "Email already taken"}))
            .respond(200, json!({})),
    );
    let nav = MemoryHistory::new("/sign-up");

    assert!(ctl.submit(&form("ada", "ada@example.com", "secret"), &nav).await.is_err());
    ctl.submit(&form("ada", "ada2@example.com", "secret"), &nav).await.unwrap();

    assert_eq!(ctl.status().error, None);
    assert_eq!(nav.location(), "/sign-in");
}

// =========================================================================
// In-flight guard
// =========================================================================

/// Holds `sign_up` open until released.
struct GatedApi {
    release: tokio::sync::Notify,
}

#[async_trait::async_trait]
impl BlogApi for GatedApi {
    async fn sign_up(&self, _: &SignUpRequest) -> Result<ApiResponse, ApiError> {
        self.release.notified().await;
        Ok(ApiResponse::new(200, json!({})))
    }

    async fn google_sign_in(&self, _: &GoogleSignInRequest) -> Result<ApiResponse, ApiError> {
        unreachable!()
    }

    async fn sign_out(&self) -> Result<ApiResponse, ApiError> {
        unreachable!()
    }

    async fn create_post(&self, _: &Draft) -> Result<ApiResponse, ApiError> {
        unreachable!()
    }
}

#[tokio::test]
async fn loading_is_observable_and_blocks_resubmit() {
    let api = Arc::new(GatedApi { release: tokio::sync::Notify::new() });
    let ctl = SignUpController::new(api.clone());
    let nav = MemoryHistory::new("/sign-up");
    let values = form("ada", "ada@example.com", "secret");

    let first = ctl.submit(&values, &nav);
    let second = async {
        tokio::task::yield_now().await;
        assert!(ctl.status().loading);
        let result = ctl.submit(&values, &nav).await;
        api.release.notify_one();
        result
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(second, Err(FlowError::Busy));
    assert_eq!(first, Ok(()));
    assert!(!ctl.status().loading);
}
