//! Terminal rendering of the congratulation section.

use coursetrack_core::{keys, ProgressSnapshot};
use coursetrack_progress::{PresentError, Presenter};
use coursetrack_storage::KeyValueStore;

/// Prints the section to stdout. Visibility starts from the persisted
/// unlock flag, since a terminal has no lasting UI state of its own.
pub struct TerminalPresenter {
    visible: bool,
}

impl TerminalPresenter {
    pub fn from_store(store: &impl KeyValueStore) -> Self {
        Self {
            visible: store.is_true(keys::COMPLETION_SECTION_UNLOCKED),
        }
    }
}

impl Presenter for TerminalPresenter {
    fn is_section_visible(&self) -> Result<bool, PresentError> {
        Ok(self.visible)
    }

    fn show_section(&mut self) -> Result<(), PresentError> {
        self.visible = true;
        println!();
        println!("🎉 Congratulations! Every module is complete.");
        Ok(())
    }

    fn hide_section(&mut self) -> Result<(), PresentError> {
        if self.visible {
            println!("Congratulation section hidden.");
        }
        self.visible = false;
        Ok(())
    }

    fn render_stats(&mut self, snapshot: &ProgressSnapshot) -> Result<(), PresentError> {
        println!(
            "   {} lessons in {} modules",
            snapshot.overall.completed,
            snapshot.completed_modules()
        );
        Ok(())
    }
}

/// Full progress table.
pub fn print_snapshot(snapshot: &ProgressSnapshot) {
    println!("Course progress");
    for module in &snapshot.modules {
        println!(
            "  {} {:<24} {:>2}/{:<2} {:>3}% {}",
            module.icon,
            module.name,
            module.completed,
            module.total,
            module.percentage,
            if module.is_complete { "✓" } else { "" }
        );
    }
    println!(
        "  Overall: {}/{} lessons ({}%)",
        snapshot.overall.completed, snapshot.overall.total, snapshot.overall.percentage
    );
}
