//! Command handlers. Wires the broker, transport and controllers together.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use directup_broker::HttpBroker;
use directup_transfer::{HttpTransport, Payload};
use directup_uploader::{ResumableUpload, StandardUpload, TransferState, UploadEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::Settings;
use crate::render;

fn clients(settings: &Settings) -> anyhow::Result<(Arc<HttpBroker>, Arc<HttpTransport>)> {
    let broker = HttpBroker::new(&settings.backend_url)?;
    let transport = HttpTransport::new()?.with_chunk_size(settings.chunk_size);
    Ok((Arc::new(broker), Arc::new(transport)))
}

/// Prints one event. Returns the new state, if the event carried one.
fn show(event: &UploadEvent) -> Option<TransferState> {
    if let Some(line) = render::event_line(event) {
        println!("{line}");
    }
    match event {
        UploadEvent::StateChanged { state } => Some(*state),
        _ => None,
    }
}

fn show_pending(events: &mut UnboundedReceiver<UploadEvent>) {
    while let Ok(event) = events.try_recv() {
        show(&event);
    }
}

/// Result of the command once `state` ends the upload, `None` while it
/// can still progress.
fn outcome(state: TransferState, path: &Path) -> Option<anyhow::Result<()>> {
    if !state.is_terminal() {
        return None;
    }
    Some(match state {
        TransferState::Failed => Err(anyhow!("upload of {} failed", path.display())),
        _ => Ok(()),
    })
}

async fn load(path: &Path) -> anyhow::Result<Payload> {
    Payload::from_path(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))
}

/// Runs a standard upload to completion.
pub async fn upload(settings: &Settings, path: &Path) -> anyhow::Result<()> {
    let (broker, transport) = clients(settings)?;
    let mut upload = StandardUpload::new(broker, transport);
    let mut events = upload.take_events().context("event stream already taken")?;

    upload.select_file(load(path).await?);
    if let Err(e) = upload.start(settings.credential.as_ref()).await {
        show_pending(&mut events);
        return Err(e.into());
    }

    while let Some(event) = events.recv().await {
        if let Some(state) = show(&event) {
            tracing::debug!(%state, "standard upload state");
        }
        if let Some(result) = outcome(upload.state(), path) {
            show_pending(&mut events);
            return result;
        }
    }
    Ok(())
}

/// Runs a resumable upload. Reads `p`, `r` and `q` from stdin.
pub async fn resumable(settings: &Settings, path: &Path) -> anyhow::Result<()> {
    let (broker, transport) = clients(settings)?;
    let mut upload = ResumableUpload::new(broker, transport);
    let mut events = upload.take_events().context("event stream already taken")?;

    upload.select_file(load(path).await?);
    if let Err(e) = upload.request_session(settings.credential.as_ref()).await {
        show_pending(&mut events);
        return Err(e.into());
    }
    println!("commands: p = pause, r = resume, q = quit");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                show(&event);
                if let Some(result) = outcome(upload.state(), path) {
                    show_pending(&mut events);
                    return result;
                }
            }
            line = stdin.next_line(), if stdin_open => {
                match line?.as_deref().map(str::trim) {
                    None => stdin_open = false,
                    Some("p") => {
                        if !upload.pause() {
                            println!("nothing to pause ({})", upload.state());
                        }
                    }
                    Some("r") => {
                        if !upload.resume() {
                            println!("nothing to resume ({})", upload.state());
                        }
                    }
                    Some("q") => {
                        upload.pause();
                        show_pending(&mut events);
                        if let Some(session) = upload.session() {
                            tracing::info!(
                                bytes = session.bytes_acknowledged,
                                "quit with an unfinished session"
                            );
                        }
                        bail!("upload of {} interrupted", path.display());
                    }
                    Some(other) => println!("unknown command {other:?}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                upload.pause();
                show_pending(&mut events);
                bail!("upload of {} interrupted", path.display());
            }
        }
    }
    Ok(())
}

/// Lists the caller's uploaded objects.
pub async fn list(settings: &Settings) -> anyhow::Result<()> {
    let Some(credential) = settings.credential.as_ref() else {
        bail!("Please sign in first (set DIRECTUP_TOKEN or pass --token)");
    };
    let broker = HttpBroker::new(&settings.backend_url)?;
    let files = broker.list_files(credential).await?;

    if files.is_empty() {
        println!("no files uploaded yet");
        return Ok(());
    }
    for file in &files {
        println!("{}", render::file_line(file));
    }
    println!("{} file(s)", files.len());
    Ok(())
}

/// Prints the backend health check.
pub async fn health(settings: &Settings) -> anyhow::Result<()> {
    let broker = HttpBroker::new(&settings.backend_url)?;
    let info = broker.service_info().await?;
    for line in render::service_lines(&info) {
        println!("{line}");
    }
    if !info.is_healthy() {
        bail!("backend at {} reports {}", settings.backend_url, info.status);
    }
    Ok(())
}

/// Prints the effective configuration.
pub fn show_config(settings: &Settings, path: &Path) {
    println!("config file: {}", path.display());
    println!("backend_url: {}", settings.backend_url);
    println!(
        "token:       {}",
        if settings.credential.is_some() {
            "<set>"
        } else {
            "<not set>"
        }
    );
    println!("chunk_size:  {}", render::format_bytes(settings.chunk_size as u64));
}
