use serde::{Deserialize, Serialize};

use crate::types::StoredFile;

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Body of both URL-issuing endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadUrlRequest {
    pub filename: String,
    pub content_type: String,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Response of `POST /api/generate-signed-url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedUrlResponse {
    pub signed_url: String,
    /// Object name assigned by the backend (prefixed with the user id).
    #[serde(default)]
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

/// Response of `POST /api/generate-resumable-url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumableUrlResponse {
    pub resumable_url: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Session lifetime as reported by the backend (e.g. "1 hour").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// Response of `GET /api/list-files`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListFilesResponse {
    #[serde(default)]
    pub files: Vec<StoredFile>,
    #[serde(default)]
    pub count: usize,
}

/// Error body returned by the backend on 4xx/5xx.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
