//! Typed configuration documents, loaded from and persisted to JSON files
//! with the durable write-to-temp-then-rename discipline used throughout
//! this crate's outbox and list stores.
//!
//! Grounded on `braid-config-data`'s pattern of typed defaults substituted
//! on missing/unparsable fields rather than a hard load failure.

pub mod camera;
pub mod device;

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Result, YoloCamError};

/// Expand `~` and `$VAR` references in a configured path, mirroring
/// `braid-config-data`'s use of `shellexpand::full`.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    shellexpand::full(raw)
        .map(|cow| PathBuf::from(cow.into_owned()))
        .map_err(|e| YoloCamError::ShellExpand(e.to_string()))
}

/// Load a JSON document from `path`, falling back to `T::default()` (logged
/// at `WARNING`) when the file is absent or fails to parse.
pub fn load_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    match std::fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                crate::logging::log_event(
                    crate::logging::EventKind::Warning,
                    &format!("failed to parse config at {}: {e}; using defaults", path.display()),
                );
                T::default()
            }
        },
        Err(e) => {
            crate::logging::log_event(
                crate::logging::EventKind::Warning,
                &format!("failed to read config at {}: {e}; using defaults", path.display()),
            );
            T::default()
        }
    }
}

/// Atomically persist `doc` as pretty JSON to `path`: write to a sibling
/// temp file in the same directory, then rename over the target.
pub fn save_atomic<T: Serialize>(path: &Path, doc: &T) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| YoloCamError::io(dir, e))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| YoloCamError::io(dir, e))?;
    let body = serde_json::to_string_pretty(doc)?;
    use std::io::Write;
    tmp.write_all(body.as_bytes())
        .map_err(|e| YoloCamError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| YoloCamError::io(path, e.error))?;
    Ok(())
}
