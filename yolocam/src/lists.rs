//! Blacklist/whitelist/ignorelist plate stores: newline-delimited files,
//! loaded into memory and rewritten atomically on mutation (§3, §4.8).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Blacklist,
    Whitelist,
    Ignorelist,
}

impl ListKind {
    fn file_name(self) -> &'static str {
        match self {
            ListKind::Blacklist => "blacklist.txt",
            ListKind::Whitelist => "whitelist.txt",
            ListKind::Ignorelist => "ignorelist.txt",
        }
    }
}

pub struct PlateList {
    path: PathBuf,
    entries: HashSet<String>,
}

impl PlateList {
    pub fn load(lists_dir: &Path, kind: ListKind) -> Self {
        let path = lists_dir.join(kind.file_name());
        let entries = std::fs::read_to_string(&path)
            .map(|raw| raw.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect())
            .unwrap_or_default();
        PlateList { path, entries }
    }

    pub fn contains(&self, plate: &str) -> bool {
        self.entries.contains(plate)
    }

    pub fn add(&mut self, plate: &str) -> Result<()> {
        if self.entries.insert(plate.to_string()) {
            self.persist()?;
        }
        Ok(())
    }

    pub fn set(&mut self, plates: impl IntoIterator<Item = String>) -> Result<()> {
        self.entries = plates.into_iter().collect();
        self.persist()
    }

    pub fn as_joined(&self) -> String {
        let mut sorted: Vec<&String> = self.entries.iter().collect();
        sorted.sort();
        sorted
            .into_iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }

    fn persist(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| crate::error::YoloCamError::io(dir, e))?;
        }
        let mut sorted: Vec<&String> = self.entries.iter().collect();
        sorted.sort();
        let body = sorted
            .into_iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| crate::error::YoloCamError::io(dir, e))?;
        use std::io::Write;
        tmp.write_all(body.as_bytes())
            .map_err(|e| crate::error::YoloCamError::io(&self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| crate::error::YoloCamError::io(&self.path, e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent_and_persists() {
        let dir = std::env::temp_dir().join(format!("yolocam-lists-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut list = PlateList::load(&dir, ListKind::Whitelist);
        list.add("ABC123").unwrap();
        list.add("ABC123").unwrap();
        assert!(list.contains("ABC123"));

        let reloaded = PlateList::load(&dir, ListKind::Whitelist);
        assert!(reloaded.contains("ABC123"));
        let _ = std::fs::remove_dir_all(dir);
    }
}
