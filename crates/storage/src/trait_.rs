//! Key-value store abstraction.

use coursetrack_core::keys;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// A key changed in a store, made by some other context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    /// The key that changed
    pub key: String,

    /// Value before the change, `None` if absent
    pub old_value: Option<String>,

    /// Value after the change, `None` if removed
    pub new_value: Option<String>,
}

impl StoreChange {
    /// Whether the change touches a lesson completion flag.
    pub fn is_lesson_change(&self) -> bool {
        keys::is_lesson_key(&self.key)
    }
}

/// Receiving half of a change subscription.
pub type ChangeReceiver = mpsc::UnboundedReceiver<StoreChange>;

/// Flat string key-value storage.
///
/// Reads never fail: an absent or unreadable key is simply `None`. Writes
/// report failures so callers can log them.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value (create or update).
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Whether the key holds the completion literal `"true"`.
    fn is_true(&self, key: &str) -> bool {
        keys::is_completion_flag(self.get(key).as_deref())
    }
}

/// Stores that broadcast changes made outside the subscriber's own context.
pub trait ChangeNotifier {
    /// Subscribe to external changes.
    fn subscribe(&self) -> ChangeReceiver;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<S: ChangeNotifier + ?Sized> ChangeNotifier for Arc<S> {
    fn subscribe(&self) -> ChangeReceiver {
        (**self).subscribe()
    }
}

/// Registered subscribers, tagged with the context they belong to.
#[derive(Default)]
pub(crate) struct Subscribers {
    senders: std::sync::Mutex<Vec<(u64, mpsc::UnboundedSender<StoreChange>)>>,
}

impl Subscribers {
    pub(crate) fn add(&self, context: u64) -> ChangeReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.senders).push((context, tx));
        rx
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        lock(&self.senders).len()
    }

    /// Deliver a change to every subscriber outside `origin`. Closed
    /// subscriptions are dropped along the way.
    pub(crate) fn notify(&self, origin: Option<u64>, change: &StoreChange) {
        lock(&self.senders).retain(|(context, tx)| {
            if Some(*context) == origin {
                return !tx.is_closed();
            }
            tx.send(change.clone()).is_ok()
        });
    }
}

pub(crate) fn lock<T>(mutex: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
