//! One-shot upload through a signed URL.

use std::sync::Arc;

use directup_broker::{Credential, UrlBroker};
use directup_protocol::UploadMode;
use directup_transfer::{Payload, StorageTransport};
use tokio::sync::mpsc;

use crate::error::UploadError;
use crate::pipeline::{ErrorPolicy, Pipeline};
use crate::types::{TransferSession, TransferState, UploadEvent};

/// Single PUT of the whole payload: `Idle → Requesting → Uploading →
/// Completed | Failed`.
///
/// Any non-200 answer or transport error is terminal. The only recovery is
/// a new [`start`](Self::start), which asks the broker for a fresh URL.
pub struct StandardUpload {
    pipeline: Pipeline,
}

impl StandardUpload {
    pub fn new(broker: Arc<dyn UrlBroker>, transport: Arc<dyn StorageTransport>) -> Self {
        Self {
            pipeline: Pipeline::new(UploadMode::Standard, ErrorPolicy::Terminal, broker, transport),
        }
    }

    /// Takes the event stream. Returns `None` after the first call.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<UploadEvent>> {
        self.pipeline.take_events()
    }

    /// Replaces the selected file and aborts anything in flight.
    pub fn select_file(&self, payload: Payload) {
        self.pipeline.select_file(payload);
    }

    /// Requests a signed URL and starts the PUT.
    ///
    /// Fails with [`UploadError::NotAuthenticated`] without touching the
    /// network when `credential` is missing or blank.
    pub async fn start(&self, credential: Option<&Credential>) -> Result<(), UploadError> {
        self.pipeline
            .start(credential, "Generating signed URL...")
            .await
    }

    pub fn state(&self) -> TransferState {
        self.pipeline.state()
    }

    pub fn file(&self) -> Option<Payload> {
        self.pipeline.file()
    }

    pub fn session(&self) -> Option<TransferSession> {
        self.pipeline.session()
    }

    /// Reason of the last failed attempt.
    pub fn last_error(&self) -> Option<UploadError> {
        self.pipeline.last_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::*;
    use crate::types::Severity;
    use directup_broker::BrokerError;

    const URL: &str = "https://storage.example/bucket/uploads/report.pdf?X-Goog-Signature=sig";

    fn setup() -> (
        StandardUpload,
        Arc<MockBroker>,
        Arc<MockTransport>,
        mpsc::UnboundedReceiver<UploadEvent>,
    ) {
        let broker = Arc::new(MockBroker::new());
        let transport = Arc::new(MockTransport::new());
        let mut upload = StandardUpload::new(broker.clone(), transport.clone());
        let rx = upload.take_events().unwrap();
        (upload, broker, transport, rx)
    }

    fn report() -> Payload {
        Payload::new("report.pdf", "application/pdf", vec![0u8; 500_000])
    }

    #[tokio::test]
    async fn completes_with_monotonic_progress() {
        let (upload, broker, transport, mut rx) = setup();
        broker.push_ok(URL, "uploads/u1/report.pdf", UploadMode::Standard);
        upload.select_file(report());

        upload
            .start(Some(&Credential::new("token-1")))
            .await
            .unwrap();

        let calls = broker.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].filename, "report.pdf");
        assert_eq!(calls[0].content_type, "application/pdf");
        assert_eq!(calls[0].mode, UploadMode::Standard);
        assert_eq!(calls[0].token, "token-1");

        assert_eq!(transport.put_count(), 1);
        assert_eq!(transport.url(0), URL);
        assert_eq!(transport.mime_type(0), "application/pdf");
        assert_eq!(upload.state(), TransferState::Uploading);

        transport.progress(0, 125_000, 500_000).await;
        transport.progress(0, 300_000, 500_000).await;
        transport.progress(0, 500_000, 500_000).await;
        transport.finish(0, 200, "OK").await;

        let events = wait_for_state(&mut rx, TransferState::Completed).await;
        let events = [events, drain(&mut rx)].concat();

        assert_eq!(
            events[0],
            UploadEvent::FileSelected {
                name: "report.pdf".into(),
                size: 500_000,
                mime_type: "application/pdf".into(),
            }
        );
        let progress = percents(&events);
        assert_eq!(progress, vec![0.0, 25.0, 60.0, 100.0, 100.0]);
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));

        let statuses = statuses(&events);
        assert_eq!(statuses[0], "Generating signed URL...");
        assert_eq!(statuses[1], "Uploading to Cloud Storage...");
        assert_eq!(
            statuses.last().unwrap(),
            "Upload successful! File: uploads/u1/report.pdf"
        );
        assert!(events.contains(&UploadEvent::StatusChanged {
            message: "Upload successful! File: uploads/u1/report.pdf".into(),
            severity: Severity::Success,
        }));
        assert_eq!(upload.state(), TransferState::Completed);
        assert_eq!(upload.session().unwrap().bytes_acknowledged, 500_000);
    }

    #[tokio::test]
    async fn state_sequence_follows_lifecycle() {
        let (upload, broker, transport, mut rx) = setup();
        broker.push_ok(URL, "", UploadMode::Standard);
        upload.select_file(report());
        upload.start(Some(&Credential::new("t"))).await.unwrap();
        transport.finish(0, 200, "OK").await;

        let events = wait_for_state(&mut rx, TransferState::Completed).await;
        let states: Vec<TransferState> = events
            .iter()
            .filter_map(|e| match e {
                UploadEvent::StateChanged { state } => Some(*state),
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![
                TransferState::Requesting,
                TransferState::Uploading,
                TransferState::Completed
            ]
        );
        // Without an echoed object name the local file name is reported.
        assert!(statuses(&drain(&mut rx)).contains(&"Upload successful! File: report.pdf".into()));
    }

    #[tokio::test]
    async fn missing_credential_never_touches_network() {
        let (upload, broker, transport, mut rx) = setup();
        upload.select_file(report());
        drain(&mut rx);

        let err = upload.start(None).await.unwrap_err();
        assert!(matches!(err, UploadError::NotAuthenticated));

        let err = upload
            .start(Some(&Credential::new("   ")))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NotAuthenticated));

        assert!(broker.calls().is_empty());
        assert_eq!(transport.put_count(), 0);
        assert_eq!(upload.state(), TransferState::Idle);

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                UploadEvent::StatusChanged {
                    message: "Please sign in first".into(),
                    severity: Severity::Error,
                };
                2
            ]
        );
    }

    #[tokio::test]
    async fn start_without_file_is_rejected() {
        let (upload, broker, _transport, _rx) = setup();
        let err = upload.start(Some(&Credential::new("t"))).await.unwrap_err();
        assert!(matches!(err, UploadError::NoFile));
        assert!(broker.calls().is_empty());
    }

    #[tokio::test]
    async fn broker_rejection_returns_to_idle_and_retry_works() {
        let (upload, broker, transport, mut rx) = setup();
        broker.push_err(BrokerError::Unauthorized("Invalid token".into()));
        broker.push_ok(URL, "", UploadMode::Standard);
        upload.select_file(report());

        let err = upload.start(Some(&Credential::new("expired"))).await.unwrap_err();
        assert!(matches!(
            err,
            UploadError::Broker(BrokerError::Unauthorized(_))
        ));
        assert_eq!(upload.state(), TransferState::Idle);
        assert_eq!(transport.put_count(), 0);

        let events = drain(&mut rx);
        let last = statuses(&events).pop().unwrap();
        assert!(last.starts_with("Error: "), "{last}");
        assert!(last.contains("Invalid token"), "{last}");

        // The user re-authenticates and clicks again.
        upload.start(Some(&Credential::new("fresh"))).await.unwrap();
        assert_eq!(broker.calls().len(), 2);
        assert_eq!(transport.put_count(), 1);
        assert_eq!(upload.state(), TransferState::Uploading);
    }

    #[tokio::test]
    async fn non_200_status_fails() {
        let (upload, broker, transport, mut rx) = setup();
        broker.push_ok(URL, "", UploadMode::Standard);
        upload.select_file(report());
        upload.start(Some(&Credential::new("t"))).await.unwrap();

        transport.progress(0, 250_000, 500_000).await;
        transport.finish(0, 403, "Forbidden").await;

        let events = wait_for_state(&mut rx, TransferState::Failed).await;
        let events = [events, drain(&mut rx)].concat();
        assert_eq!(statuses(&events).last().unwrap(), "Upload failed: Forbidden");
        assert!(matches!(
            upload.last_error(),
            Some(UploadError::Transport(msg)) if msg.contains("403")
        ));
        assert!(!percents(&events).contains(&100.0));
    }

    #[tokio::test]
    async fn transport_error_is_terminal() {
        let (upload, broker, transport, mut rx) = setup();
        broker.push_ok(URL, "", UploadMode::Standard);
        upload.select_file(report());
        upload.start(Some(&Credential::new("t"))).await.unwrap();

        transport.fail(0, "connection reset").await;

        let events = wait_for_state(&mut rx, TransferState::Failed).await;
        let events = [events, drain(&mut rx)].concat();
        assert_eq!(statuses(&events).last().unwrap(), "Upload failed: Network error");
        assert_eq!(upload.state(), TransferState::Failed);
        assert!(upload.session().is_some());
    }

    #[tokio::test]
    async fn restart_aborts_previous_put() {
        let (upload, broker, transport, mut rx) = setup();
        broker.push_ok("https://storage.example/first", "", UploadMode::Standard);
        broker.push_ok("https://storage.example/second", "", UploadMode::Standard);
        upload.select_file(report());

        upload.start(Some(&Credential::new("t"))).await.unwrap();
        upload.start(Some(&Credential::new("t"))).await.unwrap();

        assert_eq!(transport.put_count(), 2);
        assert!(transport.is_cancelled(0));
        assert!(!transport.is_cancelled(1));

        // The stale attempt's answer changes nothing.
        transport.finish(0, 200, "OK").await;
        transport.finish(1, 500, "Internal Server Error").await;
        wait_for_state(&mut rx, TransferState::Failed).await;
        assert_eq!(upload.state(), TransferState::Failed);
    }

    #[tokio::test]
    async fn reselecting_file_aborts_upload() {
        let (upload, broker, transport, mut rx) = setup();
        broker.push_ok(URL, "", UploadMode::Standard);
        upload.select_file(report());
        upload.start(Some(&Credential::new("t"))).await.unwrap();

        upload.select_file(Payload::new("b.txt", "text/plain", b"b".to_vec()));
        assert!(transport.is_cancelled(0));
        assert_eq!(upload.state(), TransferState::Idle);
        assert!(upload.session().is_none());
        assert_eq!(upload.file().unwrap().name(), "b.txt");

        transport.finish(0, 200, "OK").await;
        tokio::task::yield_now().await;
        let events = drain(&mut rx);
        assert!(!events.contains(&UploadEvent::StateChanged {
            state: TransferState::Completed
        }));
    }
}
