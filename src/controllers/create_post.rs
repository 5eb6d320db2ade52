//! Post editor: draft fields, cover image upload, and publish.

#[cfg(test)]
#[path = "create_post_test.rs"]
mod create_post_test;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::upload::{UploadController, UploadEvent};
use super::{FlowError, GENERIC_FAILURE, response_message};
use crate::net::api::BlogApi;
use crate::net::storage::{LocalFile, ObjectStorage};
use crate::net::types::CreatedPost;
use crate::routes::{Navigator, Route};
use crate::state::draft::Draft;
use crate::state::upload::UploadState;

pub struct CreatePostController {
    api: Arc<dyn BlogApi>,
    upload: UploadController,
    draft: Draft,
    file: Option<LocalFile>,
    publish_error: Option<String>,
}

impl CreatePostController {
    #[must_use]
    pub fn new(api: Arc<dyn BlogApi>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            api,
            upload: UploadController::new(storage),
            draft: Draft::new(),
            file: None,
            publish_error: None,
        }
    }

    /// Forward upload progress and outcomes to `tx`.
    #[must_use]
    pub fn with_upload_events(mut self, tx: mpsc::UnboundedSender<UploadEvent>) -> Self {
        self.upload = self.upload.with_events(tx);
        self
    }

    #[must_use]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    /// Choose the file for the next upload. Selecting does not upload.
    pub fn select_file(&mut self, file: Option<LocalFile>) {
        self.file = file;
    }

    #[must_use]
    pub fn selected_file(&self) -> Option<&LocalFile> {
        self.file.as_ref()
    }

    #[must_use]
    pub fn upload_state(&self) -> UploadState {
        self.upload.state()
    }

    #[must_use]
    pub fn subscribe_upload(&self) -> watch::Receiver<UploadState> {
        self.upload.subscribe()
    }

    #[must_use]
    pub fn publish_error(&self) -> Option<&str> {
        self.publish_error.as_deref()
    }

    /// Upload the selected file and store its URL as the draft image.
    ///
    /// The draft changes only when the upload completes.
    ///
    /// # Errors
    ///
    /// Whatever [`UploadController::upload`] reports.
    pub async fn upload_image(&mut self, cancel: &CancellationToken) -> Result<String, FlowError> {
        let url = self.upload.upload(self.file.as_ref(), cancel).await?;
        self.draft.set_image(&url);
        Ok(url)
    }

    /// Submit the draft and navigate to the created post.
    ///
    /// # Errors
    ///
    /// `Publish` with the server's message for a rejected draft, or the
    /// generic failure text for transport errors and unreadable replies.
    /// The draft is kept for editing.
    pub async fn publish(&mut self, nav: &dyn Navigator) -> Result<String, FlowError> {
        match self.submit().await {
            Ok(slug) => {
                self.publish_error = None;
                tracing::info!(slug = %slug, "post created");
                nav.navigate(&Route::Post { slug: slug.clone() }.path());
                self.draft = Draft::new();
                self.file = None;
                Ok(slug)
            }
            Err(message) => {
                tracing::warn!(error = %message, "publish failed");
                self.publish_error = Some(message.clone());
                Err(FlowError::Publish(message))
            }
        }
    }

    async fn submit(&self) -> Result<String, String> {
        let response = match self.api.create_post(&self.draft).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "create post request failed");
                return Err(GENERIC_FAILURE.to_owned());
            }
        };
        if !response.is_success() {
            return Err(response_message(&response, GENERIC_FAILURE));
        }
        response
            .parse::<CreatedPost>()
            .map(|post| post.slug)
            .map_err(|_| GENERIC_FAILURE.to_owned())
    }
}
