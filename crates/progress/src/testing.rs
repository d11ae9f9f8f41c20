//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use coursetrack_core::ProgressSnapshot;
use coursetrack_storage::{KeyValueStore, MemoryStore, Result};

use crate::presenter::{PresentError, Presenter};

/// A memory store that counts writes.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key)
    }
}

/// A presenter that records what it was asked to do.
#[derive(Default)]
pub struct RecordingPresenter {
    pub visible: bool,
    pub missing: bool,
    pub shown: usize,
    pub hidden: usize,
    pub rendered: Vec<ProgressSnapshot>,
}

impl RecordingPresenter {
    fn check(&self) -> std::result::Result<(), PresentError> {
        if self.missing {
            return Err(PresentError::Missing("completion-section".to_string()));
        }
        Ok(())
    }
}

impl Presenter for RecordingPresenter {
    fn is_section_visible(&self) -> std::result::Result<bool, PresentError> {
        self.check()?;
        Ok(self.visible)
    }

    fn show_section(&mut self) -> std::result::Result<(), PresentError> {
        self.check()?;
        self.visible = true;
        self.shown += 1;
        Ok(())
    }

    fn hide_section(&mut self) -> std::result::Result<(), PresentError> {
        self.check()?;
        self.visible = false;
        self.hidden += 1;
        Ok(())
    }

    fn render_stats(&mut self, snapshot: &ProgressSnapshot) -> std::result::Result<(), PresentError> {
        self.check()?;
        self.rendered.push(snapshot.clone());
        Ok(())
    }
}
