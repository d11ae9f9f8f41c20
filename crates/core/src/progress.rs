//! Progress model - derived, never persisted.

use crate::id::ModuleKey;
use crate::Time;
use serde::{Deserialize, Serialize};

/// Progress of a single module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleProgress {
    /// Module key
    pub key: ModuleKey,

    /// Display name
    pub name: String,

    /// Display icon
    pub icon: String,

    /// Completed lessons
    pub completed: usize,

    /// Total lessons
    pub total: usize,

    /// Every lesson of the module is done
    pub is_complete: bool,

    /// Rounded percentage, 0-100
    pub percentage: u8,
}

/// Progress across the whole course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallProgress {
    /// Completed lessons
    pub completed: usize,

    /// Total lessons
    pub total: usize,

    /// Rounded percentage, 0-100
    pub percentage: u8,

    /// Every lesson of the course is done
    pub all_complete: bool,
}

impl OverallProgress {
    /// Build the aggregate from completed/total counts.
    pub fn new(completed: usize, total: usize) -> Self {
        Self {
            completed,
            total,
            percentage: percentage(completed, total),
            all_complete: completed == total,
        }
    }
}

/// A snapshot of progress at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// When snapshot was taken
    pub taken_at: Time,

    /// Per-module progress, in course order
    pub modules: Vec<ModuleProgress>,

    /// Course aggregate
    pub overall: OverallProgress,
}

impl ProgressSnapshot {
    /// Number of fully completed modules.
    pub fn completed_modules(&self) -> usize {
        self.modules.iter().filter(|m| m.is_complete).count()
    }

    /// Progress of one module.
    pub fn module(&self, key: &ModuleKey) -> Option<&ModuleProgress> {
        self.modules.iter().find(|m| &m.key == key)
    }
}

/// `round(100 * completed / total)`, rounding halves up. An empty total is 0%.
pub fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    ((200 * completed + total) / (2 * total)) as u8
}
