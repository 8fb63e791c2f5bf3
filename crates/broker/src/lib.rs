//! Upload URL broker.
//!
//! The broker is the backend service that authorizes an upload and hands
//! back a short-lived target URL. [`UrlBroker`] is the contract the upload
//! controllers depend on; [`HttpBroker`] implements it over HTTP.
//!
//! The broker never retries. Each call corresponds to one user action.

pub mod client;
pub mod credential;
pub mod error;
pub mod types;

use std::future::Future;
use std::pin::Pin;

use directup_protocol::UploadMode;

pub use client::HttpBroker;
pub use credential::Credential;
pub use error::BrokerError;
pub use types::UploadTarget;

/// Issues upload targets for named, typed payloads.
pub trait UrlBroker: Send + Sync {
    /// Requests a target URL for `filename` of `content_type`.
    ///
    /// A missing or rejected credential yields [`BrokerError::Unauthorized`].
    fn request_upload_target<'a>(
        &'a self,
        filename: &'a str,
        content_type: &'a str,
        mode: UploadMode,
        credential: &'a Credential,
    ) -> Pin<Box<dyn Future<Output = Result<UploadTarget, BrokerError>> + Send + 'a>>;
}
