//! Broker result types.

use directup_protocol::{ResumableUrlResponse, SignedUrlResponse, UploadMode};

/// A URL the payload may be PUT to.
///
/// Issued for one user-initiated upload. Signed URLs expire on their own;
/// callers never refresh them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub signed_url: String,
    pub expires_implicitly: bool,
    pub mode: UploadMode,
    /// Object name chosen by the backend (empty if not echoed).
    pub object_name: String,
    /// Human-readable lifetime as reported by the backend.
    pub expires_in: Option<String>,
}

impl From<SignedUrlResponse> for UploadTarget {
    fn from(resp: SignedUrlResponse) -> Self {
        Self {
            signed_url: resp.signed_url,
            expires_implicitly: true,
            mode: UploadMode::Standard,
            object_name: resp.filename,
            expires_in: resp.expires_in,
        }
    }
}

impl From<ResumableUrlResponse> for UploadTarget {
    fn from(resp: ResumableUrlResponse) -> Self {
        Self {
            signed_url: resp.resumable_url,
            expires_implicitly: true,
            mode: UploadMode::Resumable,
            object_name: resp.filename,
            expires_in: resp.timeout,
        }
    }
}
