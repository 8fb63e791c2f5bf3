//! Pausable upload through a resumable session URL.

use std::sync::Arc;

use directup_broker::{Credential, UrlBroker};
use directup_protocol::UploadMode;
use directup_transfer::{Payload, StorageTransport};
use tokio::sync::mpsc;

use crate::error::UploadError;
use crate::pipeline::{ErrorPolicy, Pipeline};
use crate::types::{TransferSession, TransferState, UploadEvent};

/// Upload that can be paused and resumed against the same session URL.
///
/// ```text
/// Idle --request_session--> Requesting --> Uploading
/// Uploading --pause | transport error | non-200--> Paused
/// Paused --resume--> Uploading
/// Uploading --HTTP 200--> Completed
/// ```
///
/// Resuming never asks the broker again. It re-sends the whole payload to
/// the stored URL; no byte offset is negotiated with the storage endpoint.
pub struct ResumableUpload {
    pipeline: Pipeline,
}

impl ResumableUpload {
    pub fn new(broker: Arc<dyn UrlBroker>, transport: Arc<dyn StorageTransport>) -> Self {
        Self {
            pipeline: Pipeline::new(
                UploadMode::Resumable,
                ErrorPolicy::Pausable,
                broker,
                transport,
            ),
        }
    }

    /// Takes the event stream. Returns `None` after the first call.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<UploadEvent>> {
        self.pipeline.take_events()
    }

    /// Replaces the selected file. Any session, paused or live, is dropped.
    pub fn select_file(&self, payload: Payload) {
        self.pipeline.select_file(payload);
    }

    /// Obtains a resumable session URL and starts uploading to it.
    pub async fn request_session(&self, credential: Option<&Credential>) -> Result<(), UploadError> {
        self.pipeline
            .start(credential, "Generating resumable upload URL...")
            .await
    }

    /// Same as [`request_session`](Self::request_session).
    pub async fn start(&self, credential: Option<&Credential>) -> Result<(), UploadError> {
        self.request_session(credential).await
    }

    /// Aborts the live PUT and keeps the session.
    ///
    /// Returns `false` (and does nothing) unless uploading.
    pub fn pause(&self) -> bool {
        self.pipeline.pause()
    }

    /// Re-sends the payload to the stored session URL.
    ///
    /// Returns `false` (and does nothing) unless paused. Must be called from
    /// within a tokio runtime.
    pub fn resume(&self) -> bool {
        self.pipeline.resume()
    }

    pub fn state(&self) -> TransferState {
        self.pipeline.state()
    }

    pub fn file(&self) -> Option<Payload> {
        self.pipeline.file()
    }

    /// Snapshot of the current session, if a URL has been issued.
    pub fn session(&self) -> Option<TransferSession> {
        self.pipeline.session()
    }

    /// Reason of the last interrupted or failed attempt.
    pub fn last_error(&self) -> Option<UploadError> {
        self.pipeline.last_error()
    }
}
