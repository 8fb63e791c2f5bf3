use std::fmt;
use std::path::Path;

use bytes::Bytes;
use directup_protocol::constants::DEFAULT_CONTENT_TYPE;
use tracing::debug;

use crate::TransferError;

/// Immutable handle to a selected file: bytes, name and MIME type.
///
/// Cloning is cheap; the bytes are reference counted and shared between
/// every transfer attempt made with the same handle.
#[derive(Clone, PartialEq, Eq)]
pub struct Payload {
    name: String,
    mime_type: String,
    data: Bytes,
}

impl Payload {
    /// Creates a payload from in-memory bytes.
    ///
    /// An empty `mime_type` is replaced with `application/octet-stream`.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let mime_type = mime_type.into();
        Self {
            name: name.into(),
            mime_type: if mime_type.is_empty() {
                DEFAULT_CONTENT_TYPE.to_string()
            } else {
                mime_type
            },
            data: data.into(),
        }
    }

    /// Reads a file from disk, detecting its MIME type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self, TransferError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| TransferError::InvalidPayload(format!("{} has no file name", path.display())))?
            .to_string();

        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(TransferError::InvalidPayload(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let data = tokio::fs::read(path).await?;
        let mime_type = detect_content_type(&name).unwrap_or(DEFAULT_CONTENT_TYPE);

        debug!(file = %name, size = data.len(), mime = mime_type, "payload loaded");
        Ok(Self::new(name, mime_type, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns a shared reference to the payload bytes.
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Detects a MIME type from a file extension (case-insensitive).
pub fn detect_content_type(path: &str) -> Option<&'static str> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("webp") => Some("image/webp"),
        Some("gif") => Some("image/gif"),
        Some("svg") => Some("image/svg+xml"),
        Some("pdf") => Some("application/pdf"),
        Some("zip") => Some("application/zip"),
        Some("gz" | "tgz") => Some("application/gzip"),
        Some("json") => Some("application/json"),
        Some("txt" | "log") => Some("text/plain"),
        Some("csv") => Some("text/csv"),
        Some("html" | "htm") => Some("text/html"),
        Some("mp3") => Some("audio/mpeg"),
        Some("wav") => Some("audio/wav"),
        Some("flac") => Some("audio/flac"),
        Some("mp4") => Some("video/mp4"),
        Some("webm") => Some("video/webm"),
        Some("mov") => Some("video/quicktime"),
        _ => None,
    }
}
