//! Direct-to-storage upload controllers.
//!
//! This crate implements the **state machines** for uploading a file to
//! object storage through a short-lived URL issued by a broker. It has no
//! UI dependency: a presentation layer selects a file, calls `start`,
//! `pause` and `resume`, and renders the [`UploadEvent`] stream.
//!
//! # Pipelines
//!
//! - [`StandardUpload`]: one-shot PUT: `Idle → Requesting → Uploading →
//!   Completed | Failed`.
//! - [`ResumableUpload`]: PUT to a resumable session URL that can be
//!   paused and resumed without asking the broker again. A transport error
//!   pauses the upload instead of failing it.
//!
//! The two pipelines share no state and may run concurrently. Within one
//! pipeline at most one transport operation is live; starting a new one
//! aborts the previous.

pub mod error;
mod pipeline;
pub mod resumable;
pub mod standard;
pub mod types;

#[cfg(test)]
mod mock;

// Re-export primary types for convenience.
pub use directup_broker::{Credential, UploadTarget};
pub use directup_transfer::Payload;
pub use error::UploadError;
pub use resumable::ResumableUpload;
pub use standard::StandardUpload;
pub use types::{Severity, TransferSession, TransferState, UploadEvent};
