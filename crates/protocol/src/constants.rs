/// Issues a signed URL for a single-shot PUT upload.
pub const SIGNED_URL_PATH: &str = "/api/generate-signed-url";

/// Opens a resumable upload session and returns its session URL.
pub const RESUMABLE_URL_PATH: &str = "/api/generate-resumable-url";

/// Lists the authenticated user's uploaded objects.
pub const LIST_FILES_PATH: &str = "/api/list-files";

/// Unauthenticated health check.
pub const HEALTH_PATH: &str = "/";

/// Content type the backend assumes when a request omits one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
