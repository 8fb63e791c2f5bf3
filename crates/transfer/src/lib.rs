//! Payload handles, percent progress and the storage transport.
//!
//! The transport is modelled as a cancellable operation that yields a
//! sequence of progress notifications followed by exactly one terminal
//! result. [`HttpTransport`] implements it on top of `reqwest`.

mod http;
mod payload;
mod progress;
mod transport;

pub use http::HttpTransport;
pub use payload::{Payload, detect_content_type};
pub use progress::PercentTracker;
pub use transport::{StorageTransport, TransferHandle, TransportEvent};

/// Default body chunk size: 256 KiB.
///
/// Each chunk handed to the HTTP client produces one progress notification.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
