//! Presentation state and commands.
//!
//! The tracker never touches the UI. It is told whether the congratulation
//! section is visible and answers with the commands the UI should run.

use crate::progress::ProgressSnapshot;
use serde::{Deserialize, Serialize};

/// Whether the congratulation section is currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SectionVisibility {
    /// Not shown
    #[default]
    Hidden,
    /// Shown
    Visible,
}

impl SectionVisibility {
    /// Is the section shown?
    pub fn is_visible(self) -> bool {
        matches!(self, SectionVisibility::Visible)
    }
}

impl From<bool> for SectionVisibility {
    fn from(visible: bool) -> Self {
        if visible {
            SectionVisibility::Visible
        } else {
            SectionVisibility::Hidden
        }
    }
}

/// An effect the presentation layer should perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationCommand {
    /// Reveal the congratulation section
    ShowSection,
    /// Hide the congratulation section
    HideSection,
    /// Refresh the statistics shown in the section
    RenderStats(ProgressSnapshot),
}
