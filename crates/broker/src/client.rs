//! HTTP URL broker.
//!
//! Async client using `reqwest` with per-request Bearer authentication.

use std::future::Future;
use std::pin::Pin;

use directup_protocol::{
    ErrorResponse, HEALTH_PATH, LIST_FILES_PATH, ListFilesResponse, ResumableUrlResponse,
    ServiceInfo, SignedUrlResponse, StoredFile, UploadMode, UploadUrlRequest,
};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{BrokerError, Credential, UploadTarget, UrlBroker};

/// Broker backed by the signed-URL HTTP service.
#[derive(Debug, Clone)]
pub struct HttpBroker {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBroker {
    /// Creates a broker for the service at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, BrokerError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Creates a broker sharing an existing HTTP client.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Lists the objects the credential's owner has uploaded.
    pub async fn list_files(&self, credential: &Credential) -> Result<Vec<StoredFile>, BrokerError> {
        let url = format!("{}{}", self.base_url, LIST_FILES_PATH);
        let req = self
            .http
            .get(&url)
            .header(AUTHORIZATION, auth_header(credential)?);
        let resp: ListFilesResponse = send_json(req).await?;
        debug!(count = resp.files.len(), "listed uploaded files");
        Ok(resp.files)
    }

    /// Fetches the backend health check.
    pub async fn service_info(&self) -> Result<ServiceInfo, BrokerError> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        send_json(self.http.get(&url)).await
    }

    async fn issue(
        &self,
        filename: &str,
        content_type: &str,
        mode: UploadMode,
        credential: &Credential,
    ) -> Result<UploadTarget, BrokerError> {
        let url = format!("{}{}", self.base_url, mode.endpoint());
        let body = UploadUrlRequest {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
        };

        debug!(%mode, file = %filename, content_type, "requesting upload target");
        let req = self
            .http
            .post(&url)
            .header(AUTHORIZATION, auth_header(credential)?)
            .json(&body);

        let target: UploadTarget = match mode {
            UploadMode::Standard => send_json::<SignedUrlResponse>(req).await?.into(),
            UploadMode::Resumable => send_json::<ResumableUrlResponse>(req).await?.into(),
        };

        if target.signed_url.is_empty() {
            return Err(BrokerError::InvalidResponse("empty upload URL".into()));
        }

        debug!(%mode, object = %target.object_name, "upload target issued");
        Ok(target)
    }
}

impl UrlBroker for HttpBroker {
    fn request_upload_target<'a>(
        &'a self,
        filename: &'a str,
        content_type: &'a str,
        mode: UploadMode,
        credential: &'a Credential,
    ) -> Pin<Box<dyn Future<Output = Result<UploadTarget, BrokerError>> + Send + 'a>> {
        Box::pin(self.issue(filename, content_type, mode, credential))
    }
}

/// Builds a sensitive `Authorization` header value.
fn auth_header(credential: &Credential) -> Result<HeaderValue, BrokerError> {
    if credential.is_blank() {
        return Err(BrokerError::Unauthorized("no credential".into()));
    }
    let mut value = HeaderValue::from_str(&credential.bearer())
        .map_err(|_| BrokerError::Unauthorized("credential is not a valid header value".into()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Sends a request and decodes a JSON body, mapping non-2xx to errors.
async fn send_json<T: DeserializeOwned>(req: reqwest::RequestBuilder) -> Result<T, BrokerError> {
    let resp = req.send().await?;
    let status = resp.status();

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        warn!(status = status.as_u16(), %message, "broker request rejected");

        return Err(match status.as_u16() {
            401 | 403 => BrokerError::Unauthorized(message),
            code => BrokerError::Unavailable {
                status: code,
                message,
            },
        });
    }

    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| BrokerError::InvalidResponse(e.to_string()))
}

/// Extracts `{"error": "..."}` from a backend error body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|e| e.error)
        .filter(|e| !e.is_empty())
}
