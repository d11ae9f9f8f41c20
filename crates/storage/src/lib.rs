//! Storage abstraction and implementations for CourseTrack.
//!
//! This crate provides a flat key-value store interface, a change
//! notification channel, and in-memory and JSON file implementations.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory_storage;
pub mod json_storage;

pub use trait_::{
    ChangeNotifier, ChangeReceiver, KeyValueStore, Result, StorageError, StoreChange,
};
pub use memory_storage::MemoryStore;
pub use json_storage::JsonFileStore;
