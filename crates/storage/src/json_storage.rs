//! JSON file storage implementation.
//!
//! Keeps the whole store as one flat JSON object of string values. The file
//! is read once on open and rewritten on every change. Another process may
//! write the same file; [`JsonFileStore::reload`] picks those writes up and
//! reports them to subscribers as external changes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::trait_::{lock, ChangeNotifier, ChangeReceiver, KeyValueStore, Result, StoreChange, Subscribers};
use tracing::debug;

/// File-based JSON storage backend.
pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<BTreeMap<String, String>>,
    subscribers: Subscribers,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store; the file
    /// and its parent directories are created on first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = read_map(&path)?;
        debug!("Opened {} with {} keys", path.display(), data.len());

        Ok(Self {
            path,
            data: Mutex::new(data),
            subscribers: Subscribers::default(),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored entries, sorted by key.
    pub fn entries(&self) -> BTreeMap<String, String> {
        lock(&self.data).clone()
    }

    /// Re-read the backing file and notify subscribers of every key whose
    /// value differs from what this store held. Returns the number of changes.
    pub fn reload(&self) -> Result<usize> {
        let fresh = read_map(&self.path)?;
        let changes = {
            let mut data = lock(&self.data);
            let changes = diff(&data, &fresh);
            *data = fresh;
            changes
        };

        for change in &changes {
            self.subscribers.notify(None, change);
        }
        if !changes.is_empty() {
            debug!("Reloaded {}: {} changes", self.path.display(), changes.len());
        }
        Ok(changes.len())
    }

    fn persist(&self, data: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json.as_bytes())?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.data).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut data = lock(&self.data);
        if data.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        let mut next = data.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *data = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut data = lock(&self.data);
        if !data.contains_key(key) {
            return Ok(());
        }
        let mut next = data.clone();
        next.remove(key);
        self.persist(&next)?;
        *data = next;
        Ok(())
    }
}

impl ChangeNotifier for JsonFileStore {
    fn subscribe(&self) -> ChangeReceiver {
        // Writes from this process are never reported back, only reloads.
        self.subscribers.add(0)
    }
}

fn read_map(path: &Path) -> Result<BTreeMap<String, String>> {
    match std::fs::read_to_string(path) {
        Ok(json) if json.trim().is_empty() => Ok(BTreeMap::new()),
        Ok(json) => Ok(serde_json::from_str(&json)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

fn diff(old: &BTreeMap<String, String>, new: &BTreeMap<String, String>) -> Vec<StoreChange> {
    let mut changes = Vec::new();

    for (key, value) in new {
        if old.get(key) != Some(value) {
            changes.push(StoreChange {
                key: key.clone(),
                old_value: old.get(key).cloned(),
                new_value: Some(value.clone()),
            });
        }
    }
    for (key, value) in old {
        if !new.contains_key(key) {
            changes.push(StoreChange {
                key: key.clone(),
                old_value: Some(value.clone()),
                new_value: None,
            });
        }
    }

    changes
}
