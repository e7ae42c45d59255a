use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::constants::{HISTORY_KEY, MAX_HISTORY, SAVED_KEY};
use crate::models::{HistoryEntry, SavedRequest};

/// Key/value persistence over named keys
pub trait StoragePort {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// One `<key>.json` file per key under a data directory
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(anyhow!("Invalid storage key: {}", key));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// Ensure data directory exists
    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

impl StoragePort for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        self.ensure_dir()?;
        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Process-local storage, for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoragePort for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| anyhow!("storage lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| anyhow!("storage lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| anyhow!("storage lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// Request history and saved requests, mirrored into a storage port
///
/// Both collections are kept newest first. Every mutation writes the whole
/// collection back.
pub struct Storage<P: StoragePort> {
    port: P,
    history: VecDeque<HistoryEntry>,
    saved: Vec<SavedRequest>,
}

impl<P: StoragePort> Storage<P> {
    /// Load both collections. Missing or unreadable data starts empty.
    pub fn new(port: P) -> Self {
        let mut history: VecDeque<HistoryEntry> = load_collection(&port, HISTORY_KEY);
        history.truncate(MAX_HISTORY);
        let saved = load_collection(&port, SAVED_KEY);

        Storage {
            port,
            history,
            saved,
        }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Add entry to history, evicting the oldest past the cap
    pub fn add_to_history(&mut self, entry: HistoryEntry) -> Result<()> {
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_back();
        }
        self.history.push_front(entry);
        self.persist_history()
    }

    pub fn clear_history(&mut self) -> Result<()> {
        self.history.clear();
        self.persist_history()
    }

    /// Get history item by index (0 = most recent)
    pub fn get_history(&self, index: usize) -> Option<&HistoryEntry> {
        self.history.get(index)
    }

    pub fn find_history(&self, id: &str) -> Option<&HistoryEntry> {
        self.history.iter().find(|entry| entry.id == id)
    }

    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    /// History length
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn save_request(&mut self, saved: SavedRequest) -> Result<()> {
        self.saved.insert(0, saved);
        self.persist_saved()
    }

    /// Remove a saved request; returns whether anything was removed
    pub fn delete_saved(&mut self, id: &str) -> Result<bool> {
        let before = self.saved.len();
        self.saved.retain(|s| s.id != id);
        if self.saved.len() == before {
            return Ok(false);
        }
        self.persist_saved()?;
        Ok(true)
    }

    pub fn find_saved(&self, id: &str) -> Option<&SavedRequest> {
        self.saved.iter().find(|s| s.id == id)
    }

    pub fn saved(&self) -> &[SavedRequest] {
        &self.saved
    }

    fn persist_history(&self) -> Result<()> {
        write_collection(&self.port, HISTORY_KEY, &self.history)
    }

    fn persist_saved(&self) -> Result<()> {
        write_collection(&self.port, SAVED_KEY, &self.saved)
    }
}

fn load_collection<P, C>(port: &P, key: &str) -> C
where
    P: StoragePort,
    C: DeserializeOwned + Default,
{
    let raw = match port.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return C::default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Could not read stored collection");
            return C::default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(key, error = %e, "Discarding corrupt stored collection");
        C::default()
    })
}

fn write_collection<P: StoragePort, C: Serialize>(port: &P, key: &str, collection: &C) -> Result<()> {
    let raw = serde_json::to_string(collection)?;
    port.set(key, &raw)
}
