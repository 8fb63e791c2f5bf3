//! State shared by both upload controllers.
//!
//! A pipeline owns the selected file, the authorized target, the state and
//! the abort token of the single live transport operation. Every action that
//! supersedes earlier work (new selection, new start, pause, new attempt)
//! bumps a generation counter; late events from older generations are
//! dropped.

use std::sync::{Arc, Mutex, MutexGuard};

use directup_broker::{Credential, UploadTarget, UrlBroker};
use directup_protocol::UploadMode;
use directup_transfer::{Payload, PercentTracker, StorageTransport, TransferHandle, TransportEvent};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::UploadError;
use crate::types::{Severity, TransferSession, TransferState, UploadEvent};

/// The only status code treated as a successful upload.
const SUCCESS_STATUS: u16 = 200;

/// What a transport-level failure does to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorPolicy {
    /// Transport errors are terminal (`Failed`).
    Terminal,
    /// Transport errors and non-200 answers pause the upload; `resume`
    /// re-sends the payload.
    Pausable,
}

pub(crate) struct Pipeline {
    mode: UploadMode,
    policy: ErrorPolicy,
    broker: Arc<dyn UrlBroker>,
    transport: Arc<dyn StorageTransport>,
    shared: Arc<Shared>,
    events_rx: Option<mpsc::UnboundedReceiver<UploadEvent>>,
}

struct Shared {
    inner: Mutex<Inner>,
    events_tx: mpsc::UnboundedSender<UploadEvent>,
}

#[derive(Default)]
struct Inner {
    file: Option<Payload>,
    target: Option<UploadTarget>,
    state: TransferState,
    bytes_acknowledged: u64,
    generation: u64,
    in_flight: Option<CancellationToken>,
    last_error: Option<String>,
}

impl Inner {
    /// Aborts the live transport operation, if any, and invalidates every
    /// outstanding generation.
    fn supersede(&mut self) -> u64 {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        self.generation += 1;
        self.generation
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: UploadEvent) {
        // The receiver may have been dropped by a presentation layer that
        // stopped listening; the controllers keep working regardless.
        let _ = self.events_tx.send(event);
    }

    fn set_state(&self, inner: &mut Inner, state: TransferState) {
        if inner.state != state {
            inner.state = state;
            self.emit(UploadEvent::StateChanged { state });
        }
    }

    fn status(&self, message: impl Into<String>, severity: Severity) {
        self.emit(UploadEvent::StatusChanged {
            message: message.into(),
            severity,
        });
    }
}

impl Pipeline {
    pub(crate) fn new(
        mode: UploadMode,
        policy: ErrorPolicy,
        broker: Arc<dyn UrlBroker>,
        transport: Arc<dyn StorageTransport>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            mode,
            policy,
            broker,
            transport,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::default()),
                events_tx,
            }),
            events_rx: Some(events_rx),
        }
    }

    pub(crate) fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<UploadEvent>> {
        self.events_rx.take()
    }

    pub(crate) fn state(&self) -> TransferState {
        self.shared.lock().state
    }

    pub(crate) fn file(&self) -> Option<Payload> {
        self.shared.lock().file.clone()
    }

    pub(crate) fn session(&self) -> Option<TransferSession> {
        let inner = self.shared.lock();
        let (Some(target), Some(file)) = (inner.target.clone(), inner.file.clone()) else {
            return None;
        };
        Some(TransferSession {
            upload_url: target,
            file,
            bytes_acknowledged: inner.bytes_acknowledged,
            state: inner.state,
        })
    }

    pub(crate) fn last_error(&self) -> Option<UploadError> {
        self.shared
            .lock()
            .last_error
            .clone()
            .map(UploadError::Transport)
    }

    /// Replaces the selected file, silently discarding any session.
    pub(crate) fn select_file(&self, payload: Payload) {
        let shared = &self.shared;
        let mut inner = shared.lock();

        if inner.target.is_some() || inner.state != TransferState::Idle {
            debug!(mode = %self.mode, state = %inner.state, "discarding previous session");
        }
        inner.supersede();
        inner.target = None;
        inner.bytes_acknowledged = 0;
        inner.last_error = None;

        shared.set_state(&mut inner, TransferState::Idle);
        shared.emit(UploadEvent::FileSelected {
            name: payload.name().to_string(),
            size: payload.size(),
            mime_type: payload.mime_type().to_string(),
        });
        inner.file = Some(payload);
    }

    /// Asks the broker for a target and starts the first attempt.
    ///
    /// Returns once the PUT has been issued; its outcome arrives on the
    /// event stream.
    pub(crate) async fn start(
        &self,
        credential: Option<&Credential>,
        requesting_message: &str,
    ) -> Result<(), UploadError> {
        let shared = &self.shared;

        let (file, credential, ticket) = {
            let mut inner = shared.lock();

            let Some(file) = inner.file.clone() else {
                shared.status("Select a file first", Severity::Warning);
                return Err(UploadError::NoFile);
            };
            let Some(credential) = credential.filter(|c| !c.is_blank()) else {
                warn!(mode = %self.mode, "start rejected: no credential");
                shared.status("Please sign in first", Severity::Error);
                return Err(UploadError::NotAuthenticated);
            };
            if inner.state == TransferState::Requesting {
                debug!(mode = %self.mode, "start ignored: broker request in flight");
                return Err(UploadError::Busy);
            }

            let ticket = inner.supersede();
            inner.target = None;
            inner.bytes_acknowledged = 0;
            inner.last_error = None;
            shared.set_state(&mut inner, TransferState::Requesting);
            shared.status(requesting_message, Severity::Info);

            (file, credential.clone(), ticket)
        };

        let result = self
            .broker
            .request_upload_target(file.name(), file.mime_type(), self.mode, &credential)
            .await;

        let mut inner = shared.lock();
        if inner.generation != ticket {
            debug!(mode = %self.mode, "broker response discarded: superseded");
            return Ok(());
        }

        match result {
            Ok(target) => {
                info!(
                    mode = %self.mode,
                    file = %file.name(),
                    object = %target.object_name,
                    "upload target issued"
                );
                inner.target = Some(target);
                self.begin_attempt(&mut inner);
                Ok(())
            }
            Err(e) => {
                warn!(mode = %self.mode, error = %e, "broker request failed");
                shared.set_state(&mut inner, TransferState::Idle);
                shared.status(format!("Error: {e}"), Severity::Error);
                Err(e.into())
            }
        }
    }

    /// Aborts the live PUT and keeps the session. No-op unless uploading.
    pub(crate) fn pause(&self) -> bool {
        let shared = &self.shared;
        let mut inner = shared.lock();
        if inner.state != TransferState::Uploading {
            debug!(mode = %self.mode, state = %inner.state, "pause ignored");
            return false;
        }

        inner.supersede();
        shared.set_state(&mut inner, TransferState::Paused);
        shared.status("Upload paused. Click Resume to continue.", Severity::Info);
        info!(mode = %self.mode, bytes = inner.bytes_acknowledged, "upload paused");
        true
    }

    /// Re-issues the PUT against the stored target. No-op unless paused.
    pub(crate) fn resume(&self) -> bool {
        let shared = &self.shared;
        let mut inner = shared.lock();
        if inner.state != TransferState::Paused {
            debug!(mode = %self.mode, state = %inner.state, "resume ignored");
            return false;
        }

        shared.status("Resuming upload...", Severity::Info);
        self.begin_attempt(&mut inner);
        true
    }

    /// Starts a full PUT of the selected file to the stored target.
    ///
    /// The whole payload is sent on every attempt; no byte offset is carried
    /// over from earlier attempts.
    fn begin_attempt(&self, inner: &mut Inner) {
        let shared = &self.shared;
        let (Some(file), Some(target)) = (inner.file.clone(), inner.target.clone()) else {
            warn!(mode = %self.mode, "attempt requested without file or target");
            return;
        };

        let generation = inner.supersede();
        inner.bytes_acknowledged = 0;
        inner.last_error = None;
        shared.set_state(inner, TransferState::Uploading);
        shared.status("Uploading to Cloud Storage...", Severity::Info);
        shared.emit(UploadEvent::ProgressChanged { percent: 0.0 });

        let handle = self.transport.put(&target.signed_url, &file);
        inner.in_flight = Some(handle.abort_token());

        debug!(mode = %self.mode, generation, size = file.size(), "attempt started");

        let label = if target.object_name.is_empty() {
            file.name().to_string()
        } else {
            target.object_name.clone()
        };
        tokio::spawn(pump(
            Arc::clone(shared),
            self.mode,
            self.policy,
            generation,
            file.size(),
            label,
            handle,
        ));
    }
}

/// Applies transport events of one attempt to the shared state.
async fn pump(
    shared: Arc<Shared>,
    mode: UploadMode,
    policy: ErrorPolicy,
    generation: u64,
    size: u64,
    label: String,
    mut handle: TransferHandle,
) {
    let mut tracker = PercentTracker::new();

    loop {
        let event = match handle.next_event().await {
            Some(event) => event,
            None if handle.is_aborted() => return,
            None => TransportEvent::Failed {
                message: "transport closed without a response".into(),
            },
        };

        let mut inner = shared.lock();
        if inner.generation != generation || inner.state != TransferState::Uploading {
            debug!(%mode, generation, "event from superseded attempt dropped");
            return;
        }

        match event {
            TransportEvent::Progress { sent, total } => {
                inner.bytes_acknowledged = sent;
                if let Some(percent) = tracker.update(sent, total) {
                    shared.emit(UploadEvent::ProgressChanged { percent });
                }
            }
            TransportEvent::Finished { status, .. } if status == SUCCESS_STATUS => {
                inner.in_flight = None;
                inner.bytes_acknowledged = size;
                shared.emit(UploadEvent::ProgressChanged {
                    percent: tracker.complete(),
                });
                shared.set_state(&mut inner, TransferState::Completed);
                let message = match mode {
                    UploadMode::Standard => format!("Upload successful! File: {label}"),
                    UploadMode::Resumable => "Resumable upload successful!".to_string(),
                };
                shared.status(message, Severity::Success);
                info!(%mode, object = %label, size, "upload completed");
                return;
            }
            TransportEvent::Finished { status, reason } => {
                inner.in_flight = None;
                let reason = if reason.is_empty() {
                    format!("HTTP {status}")
                } else {
                    reason
                };
                warn!(%mode, object = %label, status, %reason, "storage rejected upload");
                match policy {
                    ErrorPolicy::Terminal => {
                        shared.set_state(&mut inner, TransferState::Failed);
                        shared.status(format!("Upload failed: {reason}"), Severity::Error);
                    }
                    ErrorPolicy::Pausable => {
                        shared.set_state(&mut inner, TransferState::Paused);
                        shared.status(
                            format!("Upload failed: {reason}. Click Resume to retry."),
                            Severity::Warning,
                        );
                    }
                }
                inner.last_error = Some(format!("HTTP {status}: {reason}"));
                return;
            }
            TransportEvent::Failed { message } => {
                inner.in_flight = None;
                warn!(%mode, object = %label, error = %message, "transport error");
                match policy {
                    ErrorPolicy::Terminal => {
                        shared.set_state(&mut inner, TransferState::Failed);
                        shared.status("Upload failed: Network error", Severity::Error);
                    }
                    ErrorPolicy::Pausable => {
                        shared.set_state(&mut inner, TransferState::Paused);
                        shared.status(
                            "Upload paused due to error. Click Resume to retry.",
                            Severity::Warning,
                        );
                    }
                }
                inner.last_error = Some(message);
                return;
            }
        }
    }
}
