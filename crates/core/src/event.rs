//! Course events - fire-and-forget broadcasts for UI collaborators.

use crate::Time;
use serde::{Deserialize, Serialize};

/// Something worth celebrating happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CourseEvent {
    /// Every lesson is complete and the congratulation section was revealed.
    CourseCompleted {
        /// When the transition happened
        timestamp: Time,
    },

    /// Advanced projects were unlocked.
    AdvancedProjectsUnlocked {
        /// When the reward was unlocked
        timestamp: Time,
    },

    /// Mentor mode was unlocked.
    MentorModeUnlocked {
        /// When the reward was unlocked
        timestamp: Time,
    },

    /// A portfolio was generated.
    PortfolioGenerated,
}

impl CourseEvent {
    /// Event name as seen by subscribers.
    pub fn name(&self) -> &'static str {
        match self {
            CourseEvent::CourseCompleted { .. } => "courseCompleted",
            CourseEvent::AdvancedProjectsUnlocked { .. } => "advancedProjectsUnlocked",
            CourseEvent::MentorModeUnlocked { .. } => "mentorModeUnlocked",
            CourseEvent::PortfolioGenerated => "portfolioGenerated",
        }
    }
}
