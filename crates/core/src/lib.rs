//! CourseTrack core data models.
//!
//! Course configuration, lesson identifiers, derived progress snapshots and
//! the events and commands exchanged with presentation collaborators.

#![warn(missing_docs)]

// Identities
mod id;

// Course definition
mod course;

// Derived state
mod progress;

// Collaborator messages
mod event;
mod presentation;

pub mod keys;

// Re-exports
pub use id::{LessonId, ModuleKey};
pub use course::{CourseConfig, ModuleDefinition, ConfigError};
pub use progress::{ModuleProgress, OverallProgress, ProgressSnapshot, percentage};
pub use event::CourseEvent;
pub use presentation::{PresentationCommand, SectionVisibility};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
