use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::Payload;

/// Notification produced by an in-flight PUT.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Bytes handed to the network so far. `total` is `None` when the
    /// transport cannot tell the full body length.
    Progress { sent: u64, total: Option<u64> },
    /// The server answered. Any status code, including non-2xx.
    Finished { status: u16, reason: String },
    /// The request never produced a response (connection reset, DNS, TLS...).
    Failed { message: String },
}

impl TransportEvent {
    /// Returns `true` for `Finished` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// A cancellable upload operation.
///
/// Yields zero or more [`TransportEvent::Progress`] followed by exactly one
/// terminal event. After [`abort`](Self::abort) the handle yields nothing.
#[derive(Debug)]
pub struct TransferHandle {
    events: mpsc::Receiver<TransportEvent>,
    cancel: CancellationToken,
}

impl TransferHandle {
    /// Wraps an event receiver. Producers must stop when `cancel` fires.
    pub fn new(events: mpsc::Receiver<TransportEvent>, cancel: CancellationToken) -> Self {
        Self { events, cancel }
    }

    /// Waits for the next event. Returns `None` once aborted or when the
    /// producer is gone.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            event = self.events.recv() => event,
        }
    }

    /// Aborts the operation.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    /// Token that aborts this operation when cancelled.
    pub fn abort_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Object storage endpoint that accepts a whole payload via PUT.
///
/// Implemented by [`HttpTransport`](crate::HttpTransport); tests provide
/// scripted implementations.
pub trait StorageTransport: Send + Sync {
    /// Starts a PUT of the full payload to `url` with the payload's
    /// `Content-Type`. Must be called from within a tokio runtime.
    fn put(&self, url: &str, payload: &Payload) -> TransferHandle;
}
