//! Object storage seam and the Firebase Storage resumable-upload client.
//!
//! SYSTEM CONTEXT
//! ==============
//! The upload controller only needs two things from storage: push a file
//! under a key while reporting byte progress, and resolve a download URL
//! for the stored object. `FirebaseStorage` speaks the Firebase Storage
//! REST protocol (`X-Goog-Upload-*` headers) directly.
//!
//! PROTOCOL
//! ========
//! 1. `POST /v0/b/{bucket}/o?name={key}` with `X-Goog-Upload-Command: start`
//!    returns the session URL in `X-Goog-Upload-URL`.
//! 2. Chunks are `POST`ed to the session URL with `X-Goog-Upload-Offset`;
//!    the last one carries `upload, finalize` and returns object metadata.
//!    Chunk size starts at 256 KiB and doubles per accepted chunk.
//! 3. `X-Goog-Upload-Command: cancel` discards an unfinished session. A
//!    cancel that lands while the start request is in flight waits for the
//!    session URL and cancels that session.
//! 4. The download URL is built from the object's first download token.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::path::Path;

use bytes::Bytes;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::config::{ClientConfig, Timeouts};

pub const RESUMABLE_CHUNK_SIZE: usize = 256 * 1024;
pub const MAX_RESUMABLE_CHUNK_SIZE: usize = 32 * 1024 * 1024;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

const HEADER_PROTOCOL: &str = "X-Goog-Upload-Protocol";
const HEADER_COMMAND: &str = "X-Goog-Upload-Command";
const HEADER_OFFSET: &str = "X-Goog-Upload-Offset";
const HEADER_URL: &str = "X-Goog-Upload-URL";
const HEADER_STATUS: &str = "X-Goog-Upload-Status";
const HEADER_SIZE_RECEIVED: &str = "X-Goog-Upload-Size-Received";
const HEADER_CONTENT_LENGTH: &str = "X-Goog-Upload-Header-Content-Length";
const HEADER_CONTENT_TYPE: &str = "X-Goog-Upload-Header-Content-Type";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The request could not be sent or its body could not be read.
    #[error("storage request failed: {0}")]
    Request(String),

    /// The storage service answered with a non-success status.
    #[error("storage responded with status {status}")]
    Status { status: u16, body: String },

    /// The storage service answered in a way the protocol does not allow.
    #[error("storage protocol error: {0}")]
    Protocol(String),

    /// The transfer was cancelled by the caller.
    #[error("upload cancelled")]
    Cancelled,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// TYPES
// =============================================================================

/// A file selected for upload, fully loaded into memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl LocalFile {
    /// Wrap in-memory bytes, sniffing the content type from their magic number.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let content_type = infer::get(&bytes).map_or(FALLBACK_CONTENT_TYPE, |kind| kind.mime_type()).to_owned();
        Self { name: name.into(), content_type, bytes }
    }

    /// Read a file from disk.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub async fn open(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(name, bytes))
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Byte progress of one transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadSnapshot {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl UploadSnapshot {
    /// Progress as a whole percentage in `[0, 100]`; an empty transfer is complete.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        let ratio = self.bytes_transferred as f64 / self.total_bytes as f64;
        (ratio * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// An object written to storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub name: String,
}

/// Sink for progress ticks during a transfer.
pub type ProgressSink<'a> = &'a (dyn Fn(UploadSnapshot) + Send + Sync);

/// Storage operations the upload controller depends on.
#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Transfer `file` under `key`, reporting progress, until finalized or cancelled.
    async fn upload_resumable(
        &self,
        key: &str,
        file: &LocalFile,
        progress: ProgressSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<StoredObject, StorageError>;

    /// Resolve a durable download URL for a stored object.
    async fn download_url(&self, object: &StoredObject) -> Result<String, StorageError>;
}

// =============================================================================
// FIREBASE CLIENT
// =============================================================================

pub struct FirebaseStorage {
    http: reqwest::Client,
    host: String,
    bucket: String,
    initial_chunk: usize,
    max_chunk: usize,
}

impl FirebaseStorage {
    /// Build a client for `bucket` on `host`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(host: &str, bucket: &str, timeouts: Timeouts) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request())
            .connect_timeout(timeouts.connect())
            .build()
            .map_err(|e| StorageError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            host: host.trim_end_matches('/').to_owned(),
            bucket: bucket.to_owned(),
            initial_chunk: RESUMABLE_CHUNK_SIZE,
            max_chunk: MAX_RESUMABLE_CHUNK_SIZE,
        })
    }

    /// Build a client from parsed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &ClientConfig) -> Result<Self, StorageError> {
        Self::new(&config.storage_host, &config.storage_bucket, config.timeouts)
    }

    /// Override chunk sizing. Both values are raised to at least one byte.
    #[must_use]
    pub fn with_chunk_sizes(mut self, initial: usize, max: usize) -> Self {
        self.initial_chunk = initial.max(1);
        self.max_chunk = max.max(self.initial_chunk);
        self
    }

    async fn start_session(&self, key: &str, file: &LocalFile) -> Result<String, StorageError> {
        let mut url = url::Url::parse(&bucket_objects_url(&self.host, &self.bucket))
            .map_err(|e| StorageError::Protocol(e.to_string()))?;
        url.query_pairs_mut().append_pair("name", key);

        let response = self
            .http
            .post(url)
            .header(HEADER_PROTOCOL, "resumable")
            .header(HEADER_COMMAND, "start")
            .header(HEADER_CONTENT_LENGTH, file.len().to_string())
            .header(HEADER_CONTENT_TYPE, file.content_type.as_str())
            .json(&serde_json::json!({ "name": key, "contentType": file.content_type }))
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        let response = check_status(response).await?;

        match header_str(&response, HEADER_URL) {
            Some(session_url) => Ok(session_url.to_owned()),
            None => Err(StorageError::Protocol("missing upload session URL".to_owned())),
        }
    }

    async fn send_chunk(
        &self,
        session_url: &str,
        chunk: Bytes,
        offset: u64,
        finalize: bool,
    ) -> Result<ChunkAck, StorageError> {
        let command = if finalize { "upload, finalize" } else { "upload" };
        let response = self
            .http
            .post(session_url)
            .header(HEADER_PROTOCOL, "resumable")
            .header(HEADER_COMMAND, command)
            .header(HEADER_OFFSET, offset.to_string())
            .body(chunk)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        let response = check_status(response).await?;

        let status = header_str(&response, HEADER_STATUS).unwrap_or("active").to_ascii_lowercase();
        let size_received = header_str(&response, HEADER_SIZE_RECEIVED).and_then(|v| v.parse::<u64>().ok());
        let body = response
            .text()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        Ok(ChunkAck { is_final: status == "final", size_received, body })
    }

    async fn cancel_session(&self, session_url: &str) {
        let result = self
            .http
            .post(session_url)
            .header(HEADER_PROTOCOL, "resumable")
            .header(HEADER_COMMAND, "cancel")
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!("upload session cancelled");
            }
            Ok(response) => {
                tracing::warn!(status = response.status().as_u16(), "upload cancel rejected");
            }
            Err(e) => tracing::warn!(error = %e, "upload cancel failed"),
        }
    }
}

struct ChunkAck {
    is_final: bool,
    size_received: Option<u64>,
    body: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    name: String,
    bucket: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

#[async_trait::async_trait]
impl ObjectStorage for FirebaseStorage {
    async fn upload_resumable(
        &self,
        key: &str,
        file: &LocalFile,
        progress: ProgressSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<StoredObject, StorageError> {
        let total = file.len();

        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        // Not raced against `cancel`: a session the server already opened
        // has to be cancelled there.
        let session_url = self.start_session(key, file).await?;
        if cancel.is_cancelled() {
            self.cancel_session(&session_url).await;
            return Err(StorageError::Cancelled);
        }
        tracing::debug!(key, total, "upload session started");
        progress(UploadSnapshot { bytes_transferred: 0, total_bytes: total });

        let mut offset: u64 = 0;
        let mut chunk_size = self.initial_chunk;
        loop {
            let end = next_chunk_end(offset, chunk_size, total);
            let finalize = end == total;
            let chunk = file.bytes.slice(byte_index(offset)..byte_index(end));

            let ack = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    self.cancel_session(&session_url).await;
                    return Err(StorageError::Cancelled);
                }
                ack = self.send_chunk(&session_url, chunk, offset, finalize) => ack?,
            };

            let received = ack.size_received.unwrap_or(end);
            if received <= offset && !finalize {
                return Err(StorageError::Protocol(format!("no progress past offset {offset}")));
            }
            offset = received.min(total);
            progress(UploadSnapshot { bytes_transferred: offset, total_bytes: total });

            if finalize || ack.is_final {
                if !ack.is_final {
                    return Err(StorageError::Protocol("finalize was not acknowledged".to_owned()));
                }
                let metadata = parse_metadata(&ack.body)?;
                return Ok(StoredObject { bucket: metadata.bucket, name: metadata.name });
            }
            chunk_size = chunk_size.saturating_mul(2).min(self.max_chunk);
        }
    }

    async fn download_url(&self, object: &StoredObject) -> Result<String, StorageError> {
        let url = object_url(&self.host, &object.bucket, &object.name);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;
        let response = check_status(response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        let metadata = parse_metadata(&body)?;
        let token = first_download_token(metadata.download_tokens.as_deref())
            .ok_or_else(|| StorageError::Protocol(format!("object {} has no download token", object.name)))?;
        Ok(download_url_for(&self.host, &object.bucket, &object.name, token))
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StorageError::Status { status: status.as_u16(), body })
}

fn header_str<'a>(response: &'a reqwest::Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

fn bucket_objects_url(host: &str, bucket: &str) -> String {
    format!("{host}/v0/b/{bucket}/o")
}

fn object_url(host: &str, bucket: &str, name: &str) -> String {
    format!("{}/{}", bucket_objects_url(host, bucket), urlencoding::encode(name))
}

fn download_url_for(host: &str, bucket: &str, name: &str, token: &str) -> String {
    format!("{}?alt=media&token={}", object_url(host, bucket, name), urlencoding::encode(token))
}

fn first_download_token(tokens: Option<&str>) -> Option<&str> {
    tokens?.split(',').map(str::trim).find(|t| !t.is_empty())
}

fn parse_metadata(body: &str) -> Result<ObjectMetadata, StorageError> {
    serde_json::from_str(body).map_err(|e| StorageError::Protocol(format!("bad object metadata: {e}")))
}

fn next_chunk_end(offset: u64, chunk_size: usize, total: u64) -> u64 {
    offset.saturating_add(chunk_size as u64).min(total)
}

#[allow(clippy::cast_possible_truncation)]
fn byte_index(offset: u64) -> usize {
    offset as usize
}
