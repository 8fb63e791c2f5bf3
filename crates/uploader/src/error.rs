//! Upload error types.

use directup_broker::BrokerError;

/// Errors surfaced by the upload controllers.
///
/// Every error is also reported as a status message on the event stream.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// No credential was supplied. Nothing was sent over the network.
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("no file selected")]
    NoFile,

    /// A broker request for this pipeline is already in flight.
    #[error("an upload URL request is already in progress")]
    Busy,

    /// The broker refused or failed to issue an upload URL.
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    /// The PUT to storage failed after a URL was obtained.
    #[error("transport error: {0}")]
    Transport(String),
}
