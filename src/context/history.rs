use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::context::storage;
use crate::error::HistoryError;

pub const HISTORY_FILE_NAME: &str = "history.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    pub command: String,
}

impl HistoryEntry {
    pub fn new(query: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            command: command.into(),
        }
    }
}

/// Entries read from disk, plus a user-facing warning when the file could
/// not be read or parsed and was treated as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLoad {
    pub entries: Vec<HistoryEntry>,
    pub warning: Option<String>,
}

/// Append-only log of past interactions, oldest first, capped at
/// `max_entries` with oldest-first eviction. Stored as one JSON array that is
/// always rewritten whole.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    max_entries: usize,
}

enum Snapshot {
    Missing,
    Present(String),
}

impl Snapshot {
    fn raw(&self) -> Option<&str> {
        match self {
            Snapshot::Missing => None,
            Snapshot::Present(raw) => Some(raw),
        }
    }
}

impl HistoryStore {
    pub fn new(path: PathBuf, max_entries: usize) -> Self {
        Self { path, max_entries }
    }

    pub fn in_data_dir(max_entries: usize) -> anyhow::Result<Self> {
        Ok(Self::new(
            storage::data_dir()?.join(HISTORY_FILE_NAME),
            max_entries,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Missing, unreadable, or corrupt history reads as empty. The latter two
    /// carry a warning for the user.
    pub fn load(&self) -> HistoryLoad {
        let snapshot = match self.read_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Failed to read history {}: {e}", self.path.display());
                return HistoryLoad {
                    entries: Vec::new(),
                    warning: Some(format!(
                        "Could not read history {}: {e}",
                        self.path.display()
                    )),
                };
            }
        };

        match Self::parse(&snapshot) {
            Ok(entries) => HistoryLoad {
                entries,
                warning: None,
            },
            Err(e) => {
                warn!("History file is corrupt, treating it as empty: {e}");
                HistoryLoad {
                    entries: Vec::new(),
                    warning: Some(format!(
                        "History file {} is corrupt and was ignored: {e}",
                        self.path.display()
                    )),
                }
            }
        }
    }

    pub fn load_all(&self) -> Vec<HistoryEntry> {
        self.load().entries
    }

    /// Reads, appends, trims from the front, and atomically replaces the file.
    /// If another writer changed the file between our read and our write the
    /// whole cycle is redone once; after that the last writer wins.
    pub fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        self.append_checked(entry, |_| {})
    }

    /// `before_recheck` runs between the first read and the change check of
    /// each attempt.
    fn append_checked(
        &self,
        entry: HistoryEntry,
        mut before_recheck: impl FnMut(usize),
    ) -> Result<(), HistoryError> {
        for attempt in 0..2 {
            let before = self.read_snapshot()?;
            let mut entries = Self::parse(&before).unwrap_or_default();
            entries.push(entry.clone());
            self.enforce_cap(&mut entries);

            before_recheck(attempt);
            let current = self.read_snapshot()?;
            if attempt == 0 && current.raw() != before.raw() {
                debug!("History changed during append, retrying");
                continue;
            }

            let json = serde_json::to_string_pretty(&entries)?;
            storage::write_atomic(&self.path, json.as_bytes())?;
            debug!("History now holds {} entries", entries.len());
            return Ok(());
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<(), HistoryError> {
        storage::remove_if_exists(&self.path)?;
        Ok(())
    }

    fn enforce_cap(&self, entries: &mut Vec<HistoryEntry>) {
        if entries.len() > self.max_entries {
            let overflow = entries.len() - self.max_entries;
            entries.drain(..overflow);
        }
    }

    fn read_snapshot(&self) -> io::Result<Snapshot> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Snapshot::Present(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Snapshot::Missing),
            Err(e) => Err(e),
        }
    }

    fn parse(snapshot: &Snapshot) -> Result<Vec<HistoryEntry>, serde_json::Error> {
        match snapshot.raw() {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw),
            _ => Ok(Vec::new()),
        }
    }
}
