//! In-memory store shared between contexts.
//!
//! Every [`MemoryStore`] opened from the same origin sees the same data, the
//! way tabs of one site share local storage. A subscriber is told about
//! changes made through any *other* context, never its own.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::trait_::{lock, ChangeNotifier, ChangeReceiver, KeyValueStore, Result, StoreChange, Subscribers};

#[derive(Default)]
struct Origin {
    data: Mutex<HashMap<String, String>>,
    subscribers: Subscribers,
    next_context: AtomicU64,
}

/// One context's handle onto a shared in-memory origin.
pub struct MemoryStore {
    origin: Arc<Origin>,
    context: u64,
}

impl MemoryStore {
    /// Create a fresh, empty origin and its first context.
    pub fn new() -> Self {
        let origin = Arc::new(Origin::default());
        let context = origin.next_context.fetch_add(1, Ordering::Relaxed);
        Self { origin, context }
    }

    /// Open another context onto the same origin.
    pub fn open_context(&self) -> Self {
        let context = self.origin.next_context.fetch_add(1, Ordering::Relaxed);
        Self {
            origin: Arc::clone(&self.origin),
            context,
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        lock(&self.origin.data).len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.origin.data).keys().cloned().collect();
        keys.sort();
        keys
    }

    fn publish(&self, key: &str, old_value: Option<String>, new_value: Option<String>) {
        if old_value == new_value {
            return;
        }
        let change = StoreChange {
            key: key.to_string(),
            old_value,
            new_value,
        };
        self.origin.subscribers.notify(Some(self.context), &change);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.origin.data).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let old = lock(&self.origin.data).insert(key.to_string(), value.to_string());
        self.publish(key, old, Some(value.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let old = lock(&self.origin.data).remove(key);
        self.publish(key, old, None);
        Ok(())
    }
}

impl ChangeNotifier for MemoryStore {
    fn subscribe(&self) -> ChangeReceiver {
        self.origin.subscribers.add(self.context)
    }
}
