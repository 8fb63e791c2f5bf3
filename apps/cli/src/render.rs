//! Text rendering of upload events.

use directup_protocol::{ServiceInfo, StoredFile};
use directup_uploader::{Severity, UploadEvent};

const BAR_WIDTH: usize = 30;

/// Formats a byte count with 1024-based units and two decimals.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".into();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let value = (value * 100.0).round() / 100.0;
    format!("{value} {}", UNITS[unit])
}

fn marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "[..]",
        Severity::Success => "[ok]",
        Severity::Warning => "[!!]",
        Severity::Error => "[xx]",
    }
}

/// `[#######.......]  42%`
pub fn progress_bar(percent: f64) -> String {
    let percent = percent.clamp(0.0, 100.0);
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        percent
    )
}

/// One display line per event. `None` for events with nothing to show.
pub fn event_line(event: &UploadEvent) -> Option<String> {
    match event {
        UploadEvent::FileSelected {
            name,
            size,
            mime_type,
        } => Some(format!("{name} ({}, {mime_type})", format_bytes(*size))),
        UploadEvent::StatusChanged { message, severity } => {
            Some(format!("{} {message}", marker(*severity)))
        }
        UploadEvent::ProgressChanged { percent } => Some(progress_bar(*percent)),
        UploadEvent::StateChanged { .. } => None,
    }
}

pub fn file_line(file: &StoredFile) -> String {
    let size = file
        .size
        .map(format_bytes)
        .unwrap_or_else(|| "?".into());
    let created = file.created.as_deref().unwrap_or("-");
    format!("{:<48} {:>12}  {created}", file.name, size)
}

pub fn service_lines(info: &ServiceInfo) -> Vec<String> {
    let mut lines = vec![
        format!("status:  {}", info.status),
        format!("service: {}", info.service),
        format!("bucket:  {}", info.bucket),
    ];
    let mut endpoints: Vec<_> = info.endpoints.iter().collect();
    endpoints.sort();
    lines.extend(endpoints.into_iter().map(|(k, v)| format!("  {k}: {v}")));
    lines
}
