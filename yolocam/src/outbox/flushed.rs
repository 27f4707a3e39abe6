//! Durable overflow store for decisions bumped out of the in-memory queue
//! (§4.4). Files are named `<uuid>.yof` and drained oldest-first by mtime.

use std::path::{Path, PathBuf};

use crate::decision::Decision;

pub struct FlushedStore {
    dir: PathBuf,
}

impl FlushedStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FlushedStore { dir: dir.into() }
    }

    #[cfg(test)]
    pub fn in_memory_for_test() -> Self {
        let dir = std::env::temp_dir().join(format!("yolocam-flushed-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create flushed test dir");
        FlushedStore { dir }
    }

    fn path_for(&self, decision: &Decision) -> PathBuf {
        self.dir.join(format!("{}.yof", decision.uuid))
    }

    pub fn store(&mut self, decision: &Decision) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            crate::logging::log_event(
                crate::logging::EventKind::Warning,
                &format!("failed to create flushed dir: {e}"),
            );
            return;
        }
        let path = self.path_for(decision);
        match decision.to_compact_json() {
            Ok(body) => {
                if let Err(e) = std::fs::write(&path, body) {
                    crate::logging::log_event(
                        crate::logging::EventKind::Warning,
                        &format!("failed to write flushed decision {}: {e}", path.display()),
                    );
                }
            }
            Err(e) => crate::logging::log_event(
                crate::logging::EventKind::Warning,
                &format!("failed to serialize flushed decision: {e}"),
            ),
        }
    }

    /// Restore the oldest (by mtime) flushed decision into memory, removing
    /// it from disk. Returns `None` once the directory is empty.
    pub fn take_oldest(&mut self) -> Option<Decision> {
        let oldest = oldest_entry(&self.dir)?;
        let raw = std::fs::read_to_string(&oldest).ok()?;
        let mut decision: Decision = serde_json::from_str(&raw).ok()?;
        decision.pending = false;
        let _ = std::fs::remove_file(&oldest);
        Some(decision)
    }

    pub fn len(&self) -> usize {
        std::fs::read_dir(&self.dir)
            .map(|it| it.filter_map(|e| e.ok()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete flushed files older than `max_age_days`, run by the daily
    /// housekeeper tick per SPEC_FULL.md's resolved open question on
    /// flushed-store retention.
    pub fn prune_older_than(&self, max_age: std::time::Duration) {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return;
        };
        let now = std::time::SystemTime::now();
        for entry in entries.filter_map(|e| e.ok()) {
            if let Ok(meta) = entry.metadata() {
                if let Ok(modified) = meta.modified() {
                    if now.duration_since(modified).unwrap_or_default() > max_age {
                        let _ = std::fs::remove_file(entry.path());
                    }
                }
            }
        }
    }
}

fn oldest_entry(dir: &Path) -> Option<PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("yof"))
        .min_by_key(|e| e.metadata().and_then(|m| m.modified()).ok())
        .map(|e| e.path())
}
