use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{RESUMABLE_URL_PATH, SIGNED_URL_PATH};

/// Which kind of upload URL the backend should issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadMode {
    /// One-shot PUT to a V4 signed URL.
    Standard,
    /// PUT to a resumable upload session URL.
    Resumable,
}

impl UploadMode {
    /// Backend endpoint that issues URLs for this mode.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Standard => SIGNED_URL_PATH,
            Self::Resumable => RESUMABLE_URL_PATH,
        }
    }
}

impl fmt::Display for UploadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Resumable => f.write_str("resumable"),
        }
    }
}

/// An object previously uploaded by the authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    /// ISO-8601 creation timestamp, if the storage backend reported one.
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub public_url: String,
}

/// Response of the backend health check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub status: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

impl ServiceInfo {
    /// Returns `true` if the backend reports itself healthy.
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
