//! `reqwest`-backed storage transport.

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::transport::{StorageTransport, TransferHandle, TransportEvent};
use crate::{DEFAULT_CHUNK_SIZE, Payload, TransferError};

/// Buffered transport events per transfer. Progress updates beyond this
/// are dropped; the terminal event is always delivered.
const EVENT_BUFFER: usize = 64;

/// Uploads payloads with a single HTTP PUT.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    chunk_size: usize,
}

impl HttpTransport {
    /// Creates a transport with its own HTTP client.
    pub fn new() -> Result<Self, TransferError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_client(http))
    }

    /// Creates a transport sharing an existing HTTP client.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self {
            http,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Sets the body chunk size (one progress notification per chunk).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl StorageTransport for HttpTransport {
    fn put(&self, url: &str, payload: &Payload) -> TransferHandle {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();
        let handle = TransferHandle::new(events_rx, cancel.clone());

        let request = self
            .http
            .put(url)
            .header(CONTENT_TYPE, payload.mime_type())
            .header(CONTENT_LENGTH, payload.size())
            .body(progress_body(
                payload.bytes(),
                self.chunk_size,
                events_tx.clone(),
            ));

        let host = host_of(url);
        let file = payload.name().to_string();
        let size = payload.size();

        tokio::spawn(async move {
            debug!(%host, %file, size, "PUT started");
            tokio::select! {
                _ = cancel.cancelled() => {
                    // Dropping the request future closes the connection.
                    debug!(%host, %file, "PUT aborted");
                }
                result = request.send() => {
                    let event = match result {
                        Ok(resp) => {
                            let status = resp.status();
                            debug!(%host, %file, status = status.as_u16(), "PUT finished");
                            TransportEvent::Finished {
                                status: status.as_u16(),
                                reason: status.canonical_reason().unwrap_or_default().to_string(),
                            }
                        }
                        Err(e) => {
                            warn!(%host, %file, error = %e, "PUT failed");
                            TransportEvent::Failed {
                                message: e.to_string(),
                            }
                        }
                    };
                    let _ = events_tx.send(event).await;
                }
            }
        });

        handle
    }
}

/// Streams `data` in chunks, reporting cumulative bytes as each chunk is
/// handed to the HTTP client.
fn progress_body(
    data: Bytes,
    chunk_size: usize,
    events_tx: mpsc::Sender<TransportEvent>,
) -> reqwest::Body {
    let total = data.len() as u64;
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(chunk_size)
        .map(|start| data.slice(start..(start + chunk_size).min(data.len())))
        .collect();

    let mut sent: u64 = 0;
    let stream = futures_util::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        let _ = events_tx.try_send(TransportEvent::Progress {
            sent,
            total: Some(total),
        });
        Ok::<Bytes, std::io::Error>(chunk)
    });

    reqwest::Body::wrap_stream(stream)
}

/// Host part of a URL for logging. Signed URLs carry credentials in the
/// query string, which must never reach the logs.
fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "<invalid url>".into())
}
