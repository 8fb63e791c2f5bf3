pub mod constants;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::{HEALTH_PATH, LIST_FILES_PATH, RESUMABLE_URL_PATH, SIGNED_URL_PATH};
pub use messages::{
    ErrorResponse, ListFilesResponse, ResumableUrlResponse, SignedUrlResponse, UploadUrlRequest,
};
pub use types::{ServiceInfo, StoredFile, UploadMode};
