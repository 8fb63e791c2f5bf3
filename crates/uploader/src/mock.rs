//! Scripted broker and transport for controller tests.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use directup_broker::{BrokerError, Credential, UploadTarget, UrlBroker};
use directup_protocol::UploadMode;
use directup_transfer::{Payload, StorageTransport, TransferHandle, TransportEvent};
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;

use crate::types::{TransferState, UploadEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct BrokerCall {
    pub filename: String,
    pub content_type: String,
    pub mode: UploadMode,
    pub token: String,
}

/// Broker answering from a queue of scripted results.
#[derive(Default)]
pub struct MockBroker {
    results: Mutex<VecDeque<Result<UploadTarget, BrokerError>>>,
    calls: Mutex<Vec<BrokerCall>>,
    gate: Option<Arc<Notify>>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call waits for `gate.notify_one()` before answering.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn push_ok(&self, url: &str, object_name: &str, mode: UploadMode) {
        self.results.lock().unwrap().push_back(Ok(UploadTarget {
            signed_url: url.to_string(),
            expires_implicitly: true,
            mode,
            object_name: object_name.to_string(),
            expires_in: None,
        }));
    }

    pub fn push_err(&self, err: BrokerError) {
        self.results.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<BrokerCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl UrlBroker for MockBroker {
    fn request_upload_target<'a>(
        &'a self,
        filename: &'a str,
        content_type: &'a str,
        mode: UploadMode,
        credential: &'a Credential,
    ) -> Pin<Box<dyn Future<Output = Result<UploadTarget, BrokerError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(BrokerCall {
                filename: filename.to_string(),
                content_type: content_type.to_string(),
                mode,
                token: credential.token().to_string(),
            });
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BrokerError::InvalidResponse("no scripted result".into())))
        })
    }
}

/// One recorded PUT with the sender that feeds its handle.
pub struct PutCall {
    pub url: String,
    pub name: String,
    pub mime_type: String,
    pub events: mpsc::Sender<TransportEvent>,
    pub cancel: CancellationToken,
}

/// Transport whose PUTs are driven by the test.
#[derive(Default)]
pub struct MockTransport {
    puts: Mutex<Vec<PutCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }

    pub fn url(&self, index: usize) -> String {
        self.puts.lock().unwrap()[index].url.clone()
    }

    pub fn mime_type(&self, index: usize) -> String {
        self.puts.lock().unwrap()[index].mime_type.clone()
    }

    pub fn name(&self, index: usize) -> String {
        self.puts.lock().unwrap()[index].name.clone()
    }

    pub fn is_cancelled(&self, index: usize) -> bool {
        self.puts.lock().unwrap()[index].cancel.is_cancelled()
    }

    /// Feeds `event` to the handle of PUT number `index`.
    pub async fn emit(&self, index: usize, event: TransportEvent) {
        let tx = self.puts.lock().unwrap()[index].events.clone();
        // The receiver is gone once the pump has finished with the attempt.
        let _ = tx.send(event).await;
    }

    pub async fn progress(&self, index: usize, sent: u64, total: u64) {
        self.emit(
            index,
            TransportEvent::Progress {
                sent,
                total: Some(total),
            },
        )
        .await;
    }

    pub async fn finish(&self, index: usize, status: u16, reason: &str) {
        self.emit(
            index,
            TransportEvent::Finished {
                status,
                reason: reason.to_string(),
            },
        )
        .await;
    }

    pub async fn fail(&self, index: usize, message: &str) {
        self.emit(
            index,
            TransportEvent::Failed {
                message: message.to_string(),
            },
        )
        .await;
    }
}

impl StorageTransport for MockTransport {
    fn put(&self, url: &str, payload: &Payload) -> TransferHandle {
        let (tx, rx) = mpsc::channel(64);
        let cancel = CancellationToken::new();
        self.puts.lock().unwrap().push(PutCall {
            url: url.to_string(),
            name: payload.name().to_string(),
            mime_type: payload.mime_type().to_string(),
            events: tx,
            cancel: cancel.clone(),
        });
        TransferHandle::new(rx, cancel)
    }
}

/// Drains events until one reports `state`, returning everything seen.
pub async fn wait_for_state(
    rx: &mut mpsc::UnboundedReceiver<UploadEvent>,
    state: TransferState,
) -> Vec<UploadEvent> {
    let mut seen = Vec::new();
    let reached = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(event) = rx.recv().await {
            let done = event == UploadEvent::StateChanged { state };
            seen.push(event);
            if done {
                return true;
            }
        }
        false
    })
    .await;
    assert!(
        matches!(reached, Ok(true)),
        "never reached {state}; saw {seen:?}"
    );
    seen
}

/// Drains every event already queued.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<UploadEvent>) -> Vec<UploadEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event);
    }
    seen
}

/// Percent values in the order they were emitted.
pub fn percents(events: &[UploadEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|e| match e {
            UploadEvent::ProgressChanged { percent } => Some(*percent),
            _ => None,
        })
        .collect()
}

/// Status messages in the order they were emitted.
pub fn statuses(events: &[UploadEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            UploadEvent::StatusChanged { message, .. } => Some(message.clone()),
            _ => None,
        })
        .collect()
}
