//! Data types for the upload controllers.

use std::fmt;

use directup_broker::UploadTarget;
use directup_transfer::Payload;

/// Lifecycle of one user-initiated upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Nothing in flight; `start` is available.
    #[default]
    Idle,
    /// Waiting for the broker to issue an upload URL.
    Requesting,
    /// A PUT is in flight.
    Uploading,
    /// Resumable only: the PUT was aborted (by the user or by a transport
    /// error) and the session can be resumed.
    Paused,
    /// The storage endpoint answered HTTP 200.
    Completed,
    /// The upload failed; only a new `start` recovers.
    Failed,
}

impl TransferState {
    /// Returns `true` for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Uploading => "uploading",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The visual category of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Notification for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// A new file replaced the previous selection.
    FileSelected {
        name: String,
        size: u64,
        mime_type: String,
    },
    /// Human-readable status line.
    StatusChanged { message: String, severity: Severity },
    /// Percent complete of the current attempt, in `[0, 100]`.
    ProgressChanged { percent: f64 },
    /// The controller moved to a new state.
    StateChanged { state: TransferState },
}

/// Snapshot of a session: the authorized target, the file and how far the
/// current attempt got.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSession {
    pub upload_url: UploadTarget,
    pub file: Payload,
    pub bytes_acknowledged: u64,
    pub state: TransferState,
}
