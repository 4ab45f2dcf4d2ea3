//! Notes and reminders persistence.
//!
//! Both lists live in a single JSON object file keyed by list name. Every
//! mutation writes the whole file back, so the file always holds whatever
//! was last written.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// On-disk layout of the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lists {
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub reminders: Vec<String>,
}

/// File-backed notes and reminders.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    lists: Lists,
}

impl Store {
    /// Opens the store at `path`.
    ///
    /// A missing file, or one that cannot be parsed, yields empty lists; the
    /// file is only (re)written on the first mutation.
    pub fn open(path: &Path) -> Self {
        let lists = match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Lists>(&contents) {
                Ok(lists) => {
                    info!(
                        "Loaded {} notes and {} reminders",
                        lists.notes.len(),
                        lists.reminders.len()
                    );
                    lists
                }
                Err(err) => {
                    warn!("Ignoring unreadable store {}: {err}", path.display());
                    Lists::default()
                }
            },
            Err(err) => {
                debug!("No store at {} ({err}), starting fresh", path.display());
                Lists::default()
            }
        };
        Self {
            path: path.to_path_buf(),
            lists,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn notes(&self) -> &[String] {
        &self.lists.notes
    }

    pub fn reminders(&self) -> &[String] {
        &self.lists.reminders
    }

    pub fn add_note(&mut self, note: String) -> Result<(), Error> {
        self.update(|lists| lists.notes.push(note))
    }

    pub fn add_reminder(&mut self, reminder: String) -> Result<(), Error> {
        self.update(|lists| lists.reminders.push(reminder))
    }

    pub fn clear_notes(&mut self) -> Result<(), Error> {
        self.update(|lists| lists.notes.clear())
    }

    pub fn clear_reminders(&mut self) -> Result<(), Error> {
        self.update(|lists| lists.reminders.clear())
    }

    /// Applies `change` to a copy and keeps it only once it is on disk.
    fn update(&mut self, change: impl FnOnce(&mut Lists)) -> Result<(), Error> {
        let mut lists = self.lists.clone();
        change(&mut lists);
        self.save(&lists)?;
        self.lists = lists;
        Ok(())
    }

    /// Writes to a sibling temporary file and renames it over the store.
    fn save(&self, lists: &Lists) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(lists)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("Store saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = Store::open(&dir.path().join("store.json"));
        assert!(store.notes().is_empty());
        assert!(store.reminders().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_mutations_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = Store::open(&path);
        store.add_note("buy milk".to_string()).unwrap();
        store.add_note("call mom".to_string()).unwrap();
        store.add_reminder("stretch".to_string()).unwrap();

        let reopened = Store::open(&path);
        assert_eq!(reopened.notes(), ["buy milk", "call mom"]);
        assert_eq!(reopened.reminders(), ["stretch"]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_clear_only_touches_one_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = Store::open(&path);
        store.add_note("a".to_string()).unwrap();
        store.add_reminder("b".to_string()).unwrap();
        store.clear_notes().unwrap();

        let reopened = Store::open(&path);
        assert!(reopened.notes().is_empty());
        assert_eq!(reopened.reminders(), ["b"]);

        let mut store = reopened;
        store.clear_reminders().unwrap();
        assert!(Store::open(&path).reminders().is_empty());
    }

    #[test]
    fn test_file_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store = Store::open(&path);
        store.add_note("hello".to_string()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["notes"], serde_json::json!(["hello"]));
        assert_eq!(value["reminders"], serde_json::json!([]));
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();

        let mut store = Store::open(&path);
        assert!(store.notes().is_empty());

        store.add_note("fresh".to_string()).unwrap();
        assert_eq!(Store::open(&path).notes(), ["fresh"]);
    }

    #[test]
    fn test_partial_file_defaults_missing_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{ "notes": ["only notes"] }"#).unwrap();

        let store = Store::open(&path);
        assert_eq!(store.notes(), ["only notes"]);
        assert!(store.reminders().is_empty());
    }

    #[test]
    fn test_failed_write_keeps_lists() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let mut store = Store::open(&blocker.join("store.json"));
        assert!(matches!(
            store.add_note("lost".to_string()),
            Err(Error::FileSystem(_))
        ));
        assert!(store.notes().is_empty());
        assert!(store.clear_reminders().is_err());
        assert!(store.reminders().is_empty());
    }
}
