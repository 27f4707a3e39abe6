//! Delivery sinks (§4.4): each is a narrow implementation of [`Sink`], driven
//! by a shared retry pump with sink-specific backoff.

pub mod email_sink;
pub mod excel_sink;
pub mod file_sink;
pub mod flushed;
pub mod ftp_sink;
pub mod socket_sink;
pub mod webhook_sink;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::decision::Decision;

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rejected by peer: {0}")]
    Rejected(String),
}

/// Common capability every delivery destination implements. The retry pump
/// (`drain_outbox`) is generic over this trait so FILE/EXCEL/WEBHOOK/FTP/
/// SOCKET all share one draining loop.
#[async_trait::async_trait]
pub trait Sink: Send + Sync {
    fn file_extension(&self) -> &'static str;

    fn serialize(&self, decision: &Decision) -> Result<Vec<u8>, SinkError>;

    async fn send(&self, body: &[u8]) -> Result<(), SinkError>;

    /// Delay before retrying after a failed send; sinks hold this at a high
    /// value on failure and collapse it to a low value after success
    /// (§4.4's 60s/2s, 30s/2s, 30s/0.8s schedules).
    fn retry_delay_hint(&self, last_send_ok: bool) -> Duration;

    /// Minimum file age before a pump will attempt delivery, letting the
    /// producer finish writing (5s for post/FTP, 0.8s for TCP).
    fn min_file_age(&self) -> Duration {
        Duration::from_millis(800)
    }
}

/// Write `decision` into `dir` as `<uuid>.<ext>` using `sink`'s serializer.
/// Called by the aggregator/decision path at emission time, not by the pump.
pub fn enqueue(dir: &Path, sink: &dyn Sink, decision: &Decision) -> Result<(), SinkError> {
    std::fs::create_dir_all(dir)?;
    let body = sink.serialize(decision)?;
    let path = dir.join(format!("{}.{}", decision.uuid, sink.file_extension()));
    std::fs::write(path, body)?;
    Ok(())
}

/// Attempt one oldest-first delivery pass over `dir`. Returns whether the
/// attempted file was sent successfully (used by the housekeeper to decide
/// the next retry delay per sink's backoff schedule).
pub async fn drain_oldest(dir: &Path, sink: &dyn Sink) -> Option<bool> {
    let oldest = oldest_eligible(dir, sink)?;
    let body = match std::fs::read(&oldest) {
        Ok(b) => b,
        Err(e) => {
            crate::logging::log_event(
                crate::logging::EventKind::Warning,
                &format!("failed to read outbox file {}: {e}", oldest.display()),
            );
            return Some(false);
        }
    };
    match sink.send(&body).await {
        Ok(()) => {
            let _ = std::fs::remove_file(&oldest);
            Some(true)
        }
        Err(e) => {
            crate::logging::log_event(
                crate::logging::EventKind::Network,
                &format!("sink delivery failed for {}: {e}", oldest.display()),
            );
            Some(false)
        }
    }
}

fn oldest_eligible(dir: &Path, sink: &dyn Sink) -> Option<PathBuf> {
    let min_age = sink.min_file_age();
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.metadata()
                .and_then(|m| m.modified())
                .map(|modified| {
                    std::time::SystemTime::now()
                        .duration_since(modified)
                        .unwrap_or_default()
                        >= min_age
                })
                .unwrap_or(false)
        })
        .min_by_key(|e| e.metadata().and_then(|m| m.modified()).ok())
        .map(|e| e.path())
}

/// Prune outbox files older than `max_age`, run by the daily housekeeper
/// tick across every outbox directory (§4.6).
pub fn prune_older_than(dir: &Path, max_age: Duration) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let now = std::time::SystemTime::now();
    for entry in entries.filter_map(|e| e.ok()) {
        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            if now.duration_since(modified).unwrap_or_default() > max_age {
                let _ = std::fs::remove_file(entry.path());
            }
        }
    }
}
