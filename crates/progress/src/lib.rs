//! Progress Tracking
//!
//! Lesson completion, course-completion detection, rewards, and
//! synchronisation with changes made by other contexts.

#![warn(missing_docs)]

pub mod cache;
pub mod tracker;
pub mod presenter;
pub mod rewards;
pub mod sync;

#[cfg(test)]
mod testing;

pub use cache::MemoCache;
pub use tracker::{
    Evaluation, ProgressTracker, ResetConfirmation, ResetOutcome, TrackerConfig, Transition,
};
pub use presenter::{apply_commands, PresentError, Presenter};
pub use rewards::{Certificate, DebugReport, Reward, RewardOutcome};
pub use sync::watch_changes;
