//! Scripted fakes for the `net` seams.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::net::api::BlogApi;
use crate::net::identity::{IdentityAssertion, IdentityError, IdentityProvider};
use crate::net::storage::{LocalFile, ObjectStorage, ProgressSink, StorageError, StoredObject, UploadSnapshot};
use crate::net::types::{ApiError, ApiResponse, GoogleSignInRequest, SessionUser, SignUpRequest};
use crate::state::draft::Draft;

// =========================================================================
// MockApi
// =========================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum ApiCall {
    SignUp(SignUpRequest),
    GoogleSignIn(GoogleSignInRequest),
    SignOut,
    CreatePost(serde_json::Value),
}

/// Replays queued responses in order; an empty queue answers `200 {}`.
#[derive(Default)]
pub struct MockApi {
    responses: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    calls: Mutex<Vec<ApiCall>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: serde_json::Value) -> Self {
        self.responses.lock().unwrap().push_back(Ok(ApiResponse::new(status, body)));
        self
    }

    pub fn fail(self, error: ApiError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ApiCall) -> Result<ApiResponse, ApiError> {
        self.calls.lock().unwrap().push(call);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::new(200, json!({}))))
    }
}

#[async_trait::async_trait]
impl BlogApi for MockApi {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<ApiResponse, ApiError> {
        self.record(ApiCall::SignUp(request.clone()))
    }

    async fn google_sign_in(&self, request: &GoogleSignInRequest) -> Result<ApiResponse, ApiError> {
        self.record(ApiCall::GoogleSignIn(request.clone()))
    }

    async fn sign_out(&self) -> Result<ApiResponse, ApiError> {
        self.record(ApiCall::SignOut)
    }

    async fn create_post(&self, draft: &Draft) -> Result<ApiResponse, ApiError> {
        self.record(ApiCall::CreatePost(serde_json::to_value(draft).unwrap()))
    }
}

// =========================================================================
// MockStorage
// =========================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageOutcome {
    Complete,
    FailUpload,
    FailDownloadUrl,
    WaitForCancel,
}

/// Emits the given byte ticks, then finishes per `outcome`.
pub struct MockStorage {
    ticks: Vec<u64>,
    outcome: StorageOutcome,
    keys: Mutex<Vec<String>>,
}

impl MockStorage {
    pub fn new(ticks: Vec<u64>, outcome: StorageOutcome) -> Self {
        Self { ticks, outcome, keys: Mutex::new(Vec::new()) }
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }

    pub fn url_for(key: &str) -> String {
        format!("https://cdn.test/o/{key}?alt=media&token=t1")
    }
}

#[async_trait::async_trait]
impl ObjectStorage for MockStorage {
    async fn upload_resumable(
        &self,
        key: &str,
        file: &LocalFile,
        progress: ProgressSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<StoredObject, StorageError> {
        self.keys.lock().unwrap().push(key.to_owned());
        for &done in &self.ticks {
            progress(UploadSnapshot { bytes_transferred: done, total_bytes: file.len() });
        }
        match self.outcome {
            StorageOutcome::FailUpload => Err(StorageError::Status { status: 503, body: "unavailable".to_owned() }),
            StorageOutcome::WaitForCancel => {
                cancel.cancelled().await;
                Err(StorageError::Cancelled)
            }
            StorageOutcome::Complete | StorageOutcome::FailDownloadUrl => {
                Ok(StoredObject { bucket: "test-bucket".to_owned(), name: key.to_owned() })
            }
        }
    }

    async fn download_url(&self, object: &StoredObject) -> Result<String, StorageError> {
        if self.outcome == StorageOutcome::FailDownloadUrl {
            return Err(StorageError::Request("connection reset".to_owned()));
        }
        Ok(Self::url_for(&object.name))
    }
}

// =========================================================================
// MockIdentity
// =========================================================================

/// Replays queued assertions; an empty queue aborts.
#[derive(Default)]
pub struct MockIdentity {
    results: Mutex<VecDeque<Result<IdentityAssertion, IdentityError>>>,
}

impl MockIdentity {
    pub fn new(results: Vec<Result<IdentityAssertion, IdentityError>>) -> Self {
        Self { results: Mutex::new(results.into()) }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MockIdentity {
    async fn sign_in(&self) -> Result<IdentityAssertion, IdentityError> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(IdentityError::Aborted("popup closed".to_owned())))
    }
}

// =========================================================================
// Fixtures
// =========================================================================

pub fn ada_assertion() -> IdentityAssertion {
    IdentityAssertion {
        name: "Ada Lovelace".to_owned(),
        email: "ada@example.com".to_owned(),
        photo_url: Some("https://lh3.example/ada".to_owned()),
    }
}

pub fn ada_session_json() -> serde_json::Value {
    json!({
        "_id": "u-ada",
        "username": "adalovelace1234",
        "email": "ada@example.com",
        "profilePicture": "https://lh3.example/ada",
        "isAdmin": false
    })
}

pub fn ada_user() -> SessionUser {
    serde_json::from_value(ada_session_json()).unwrap()
}

pub fn image_file(len: usize) -> LocalFile {
    LocalFile::new("cover.png", vec![7u8; len])
}
