//! Presentation collaborator seam.

use coursetrack_core::{PresentationCommand, ProgressSnapshot};
use coursetrack_storage::KeyValueStore;
use tracing::warn;

use crate::tracker::{ProgressTracker, ResetConfirmation, ResetOutcome};

/// Errors a presentation layer can report.
#[derive(Debug, thiserror::Error)]
pub enum PresentError {
    /// The element to drive is not there (yet)
    #[error("presentation element not found: {0}")]
    Missing(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Something that can show the congratulation section.
pub trait Presenter {
    /// Is the section shown right now?
    fn is_section_visible(&self) -> Result<bool, PresentError>;

    /// Reveal the section.
    fn show_section(&mut self) -> Result<(), PresentError>;

    /// Hide the section.
    fn hide_section(&mut self) -> Result<(), PresentError>;

    /// Refresh the statistics in the section.
    fn render_stats(&mut self, snapshot: &ProgressSnapshot) -> Result<(), PresentError>;
}

/// Run commands in order. The first failure is logged and aborts the rest;
/// returns whether everything ran.
pub fn apply_commands<P: Presenter + ?Sized>(
    presenter: &mut P,
    commands: &[PresentationCommand],
) -> bool {
    for command in commands {
        let result = match command {
            PresentationCommand::ShowSection => presenter.show_section(),
            PresentationCommand::HideSection => presenter.hide_section(),
            PresentationCommand::RenderStats(snapshot) => presenter.render_stats(snapshot),
        };
        if let Err(e) = result {
            warn!("Presentation aborted: {}", e);
            return false;
        }
    }
    true
}

impl<S: KeyValueStore> ProgressTracker<S> {
    /// Evaluate against a live presenter and apply the resulting commands.
    ///
    /// Returns whether the course is complete; `false` when the presenter
    /// cannot be queried.
    pub fn evaluate_with<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> bool {
        let visible = match presenter.is_section_visible() {
            Ok(visible) => visible,
            Err(e) => {
                warn!("Completion section unavailable: {}", e);
                return false;
            }
        };

        let evaluation = self.evaluate_and_transition(visible.into());
        apply_commands(presenter, &evaluation.commands);
        evaluation.complete
    }

    /// Re-show a previously unlocked section on startup, then evaluate.
    pub fn initialize_with<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> bool {
        let commands = self.restore();
        apply_commands(presenter, &commands);
        self.evaluate_with(presenter)
    }

    /// Reset with an already obtained confirmation and hide the section.
    pub fn reset_with<P: Presenter + ?Sized>(
        &mut self,
        presenter: &mut P,
        confirmation: ResetConfirmation,
    ) -> ResetOutcome {
        let outcome = self.reset_all(confirmation);
        if let ResetOutcome::Reset { commands } = &outcome {
            apply_commands(presenter, commands);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingPresenter;
    use coursetrack_core::{keys, CourseConfig, SectionVisibility};
    use coursetrack_storage::MemoryStore;

    fn tracker() -> ProgressTracker<MemoryStore> {
        ProgressTracker::new(CourseConfig::reference(), MemoryStore::new())
    }

    #[test]
    fn test_evaluate_with_shows_section_once() {
        let mut tracker = tracker();
        let mut presenter = RecordingPresenter::default();
        for id in tracker.course().lesson_ids() {
            tracker.store().set(id.as_str(), "true").unwrap();
        }

        assert!(tracker.evaluate_with(&mut presenter));
        assert!(tracker.evaluate_with(&mut presenter));

        assert!(presenter.visible);
        assert_eq!(presenter.shown, 1);
        assert_eq!(presenter.rendered.len(), 1);
        assert!(presenter.rendered[0].overall.all_complete);
    }

    #[test]
    fn test_missing_presenter_aborts_gracefully() {
        let mut tracker = tracker();
        let mut presenter = RecordingPresenter {
            missing: true,
            ..Default::default()
        };
        tracker.simulate_all(SectionVisibility::Visible);

        assert!(!tracker.evaluate_with(&mut presenter));
        assert_eq!(presenter.shown, 0);
    }

    #[test]
    fn test_apply_commands_stops_at_first_failure() {
        let mut presenter = RecordingPresenter {
            missing: true,
            ..Default::default()
        };
        assert!(!apply_commands(&mut presenter, &[PresentationCommand::HideSection]));
        assert!(apply_commands(&mut RecordingPresenter::default(), &[]));
    }

    #[test]
    fn test_initialize_restores_unlocked_section() {
        let mut tracker = tracker();
        tracker.simulate_all(SectionVisibility::Hidden);
        let stamp = tracker.store().get(keys::COMPLETION_UNLOCKED_TIMESTAMP);

        let mut presenter = RecordingPresenter::default();
        assert!(tracker.initialize_with(&mut presenter));
        assert!(presenter.visible);
        assert_eq!(presenter.shown, 1);
        assert_eq!(tracker.store().get(keys::COMPLETION_UNLOCKED_TIMESTAMP), stamp);
    }

    #[test]
    fn test_initialize_hides_stale_unlock() {
        let mut tracker = tracker();
        tracker.simulate_all(SectionVisibility::Hidden);
        tracker.store().remove("modul0_leksjon1_completed").unwrap();

        let mut presenter = RecordingPresenter::default();
        assert!(!tracker.initialize_with(&mut presenter));
        assert!(!presenter.visible);
        assert_eq!(presenter.hidden, 1);
        assert!(!tracker.store().is_true(keys::COMPLETION_SECTION_UNLOCKED));
    }

    #[test]
    fn test_reset_with_hides_section() {
        let mut tracker = tracker();
        let mut presenter = RecordingPresenter::default();
        tracker.simulate_all(SectionVisibility::Hidden);
        tracker.evaluate_with(&mut presenter);

        let outcome = tracker.reset_with(&mut presenter, ResetConfirmation::Declined);
        assert_eq!(outcome, ResetOutcome::Declined);
        assert!(presenter.visible);

        tracker.reset_with(&mut presenter, ResetConfirmation::Confirmed);
        assert!(!presenter.visible);
        assert!(!tracker.evaluate_with(&mut presenter));
    }
}
