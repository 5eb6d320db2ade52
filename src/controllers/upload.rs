//! Resumable image upload controller.
//!
//! DESIGN
//! ======
//! One controller drives at most one transfer at a time. Its state
//! (`progress`, `error`) lives in a `watch` channel for views; optional
//! `UploadEvent`s give a strict per-tick log with exactly one terminal
//! event per started transfer.
//!
//! CANCELLATION
//! ============
//! Cancelling the token aborts the transfer and discards the remote
//! session. Dropping the `upload` future also stops the transfer and
//! resets progress. Neither path returns a URL, so no draft is touched.

#[cfg(test)]
#[path = "upload_test.rs"]
mod upload_test;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::FlowError;
use crate::net::storage::{LocalFile, ObjectStorage, StorageError, UploadSnapshot};
use crate::state::upload::UploadState;

pub const NO_FILE_MESSAGE: &str = "Please select an image";
pub const UPLOAD_FAILED_MESSAGE: &str = "Image upload failed";

/// Per-transfer notifications.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadEvent {
    Progress(u8),
    Completed(String),
    Failed(String),
    Cancelled,
}

pub struct UploadController {
    storage: Arc<dyn ObjectStorage>,
    state: watch::Sender<UploadState>,
    events: Option<mpsc::UnboundedSender<UploadEvent>>,
}

impl UploadController {
    #[must_use]
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        let (state, _) = watch::channel(UploadState::default());
        Self { storage, state, events: None }
    }

    /// Also deliver every progress tick and outcome to `tx`.
    #[must_use]
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<UploadEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    #[must_use]
    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// Upload `file` and return its download URL.
    ///
    /// # Errors
    ///
    /// - `Validation` when no file is selected (no storage call is made)
    /// - `Busy` when a transfer is already running
    /// - `UploadCancelled` when `cancel` fires first
    /// - `Upload` on any storage failure
    pub async fn upload(&self, file: Option<&LocalFile>, cancel: &CancellationToken) -> Result<String, FlowError> {
        let Some(file) = file else {
            self.state.send_modify(|s| s.error = Some(NO_FILE_MESSAGE.to_owned()));
            return Err(FlowError::Validation(NO_FILE_MESSAGE.to_owned()));
        };

        let claimed = self.state.send_if_modified(|s| {
            if s.is_active() {
                return false;
            }
            s.progress = Some(0);
            s.error = None;
            true
        });
        if !claimed {
            return Err(FlowError::Busy);
        }
        let _active = ActiveTransfer { state: &self.state };

        let key = object_key(now_millis(), &file.name);
        tracing::info!(key = %key, bytes = file.len(), "image upload started");

        match self.transfer(&key, file, cancel).await {
            Ok(url) => {
                self.state.send_replace(UploadState::default());
                tracing::info!(key = %key, "image upload complete");
                self.emit(UploadEvent::Completed(url.clone()));
                Ok(url)
            }
            Err(StorageError::Cancelled) => {
                self.state.send_replace(UploadState::default());
                tracing::info!(key = %key, "image upload cancelled");
                self.emit(UploadEvent::Cancelled);
                Err(FlowError::UploadCancelled)
            }
            Err(e) => {
                tracing::error!(key = %key, error = %e, "image upload failed");
                self.state.send_replace(UploadState { progress: None, error: Some(UPLOAD_FAILED_MESSAGE.to_owned()) });
                self.emit(UploadEvent::Failed(UPLOAD_FAILED_MESSAGE.to_owned()));
                Err(FlowError::Upload(UPLOAD_FAILED_MESSAGE.to_owned()))
            }
        }
    }

    async fn transfer(&self, key: &str, file: &LocalFile, cancel: &CancellationToken) -> Result<String, StorageError> {
        let on_progress = |snapshot: UploadSnapshot| {
            let percent = snapshot.percent();
            self.state.send_if_modified(|s| {
                if s.progress.is_none() || s.progress == Some(percent) {
                    return false;
                }
                s.progress = Some(percent);
                true
            });
            self.emit(UploadEvent::Progress(percent));
        };

        let object = self
            .storage
            .upload_resumable(key, file, &on_progress, cancel)
            .await?;
        self.storage.download_url(&object).await
    }

    fn emit(&self, event: UploadEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                tracing::debug!("upload event receiver dropped");
            }
        }
    }
}

/// Resets progress if the upload future is dropped mid-transfer.
struct ActiveTransfer<'a> {
    state: &'a watch::Sender<UploadState>,
}

impl Drop for ActiveTransfer<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|s| s.progress.take().is_some());
    }
}

/// Storage key for an upload: millisecond timestamp, dash, original name.
#[must_use]
pub fn object_key(unix_millis: i64, file_name: &str) -> String {
    format!("{unix_millis}-{file_name}")
}

#[allow(clippy::cast_possible_truncation)]
fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
