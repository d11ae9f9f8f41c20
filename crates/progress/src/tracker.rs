//! Progress tracking service.

use std::time::{Duration, Instant};

use chrono::Utc;
use coursetrack_core::{
    keys, CourseConfig, CourseEvent, LessonId, ModuleKey, ModuleProgress, OverallProgress,
    PresentationCommand, ProgressSnapshot, SectionVisibility, Time,
};
use coursetrack_storage::KeyValueStore;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cache::MemoCache;

/// Tracker tuning.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// How long a computed completed-count may be reused. Zero disables reuse.
    pub count_ttl: Duration,

    /// Quiet period used to coalesce bursts of external changes.
    pub debounce: Duration,

    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            count_ttl: Duration::from_secs(1),
            debounce: Duration::from_millis(100),
            event_capacity: 16,
        }
    }
}

/// A change of the congratulation section's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Hidden → Visible: the course was just completed.
    Unlocked {
        /// Persisted completion time
        timestamp: Time,
    },
    /// Visible → Hidden: progress was lost after the unlock.
    Relocked,
}

/// Outcome of [`ProgressTracker::evaluate_and_transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Whether every lesson is complete
    pub complete: bool,

    /// The transition that fired, if any
    pub transition: Option<Transition>,

    /// Effects for the presentation layer, in order
    pub commands: Vec<PresentationCommand>,
}

impl Evaluation {
    /// Visibility after the commands have been applied.
    pub fn visibility_after(&self, before: SectionVisibility) -> SectionVisibility {
        match self.transition {
            Some(Transition::Unlocked { .. }) => SectionVisibility::Visible,
            Some(Transition::Relocked) => SectionVisibility::Hidden,
            None => before,
        }
    }
}

/// Go/no-go from whoever asked the learner to confirm a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetConfirmation {
    /// The learner confirmed
    Confirmed,
    /// The learner backed out
    Declined,
}

impl From<bool> for ResetConfirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            ResetConfirmation::Confirmed
        } else {
            ResetConfirmation::Declined
        }
    }
}

/// Outcome of [`ProgressTracker::reset_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Nothing was touched
    Declined,
    /// All progress was erased
    Reset {
        /// Effects for the presentation layer
        commands: Vec<PresentationCommand>,
    },
}

/// Tracks lesson completion for one course over a key-value store.
pub struct ProgressTracker<S: KeyValueStore> {
    pub(crate) course: CourseConfig,
    pub(crate) store: S,
    pub(crate) config: TrackerConfig,
    pub(crate) cache: MemoCache,
    pub(crate) events: broadcast::Sender<CourseEvent>,
}

impl<S: KeyValueStore> ProgressTracker<S> {
    /// Create a new progress tracker.
    pub fn new(course: CourseConfig, store: S) -> Self {
        let config = TrackerConfig::default();
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            course,
            store,
            config,
            cache: MemoCache::default(),
            events,
        }
    }

    /// Replace the tracker configuration.
    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        if config.event_capacity != self.config.event_capacity {
            let (events, _) = broadcast::channel(config.event_capacity.max(1));
            self.events = events;
        }
        self.config = config;
        self
    }

    /// Tracker configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// The course being tracked.
    pub fn course(&self) -> &CourseConfig {
        &self.course
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Listen for course events. Events sent while nobody listens are lost.
    pub fn subscribe_events(&self) -> broadcast::Receiver<CourseEvent> {
        self.events.subscribe()
    }

    /// Every lesson id, module order then lesson order.
    pub fn lesson_ids(&mut self) -> &[LessonId] {
        self.cache.lesson_ids(&self.course)
    }

    /// Number of lessons whose flag is `"true"`.
    pub fn completed_count(&mut self) -> usize {
        let now = Instant::now();
        if let Some(count) = self.cache.count(now, self.config.count_ttl) {
            debug!("Completed count served from memo: {}", count);
            return count;
        }

        let store = &self.store;
        let count = self
            .cache
            .lesson_ids(&self.course)
            .iter()
            .filter(|id| store.is_true(id.as_str()))
            .count();

        self.cache.store_count(count, now);
        count
    }

    /// Whether every lesson of a module is complete. Unknown modules are
    /// reported as incomplete.
    pub fn is_module_complete(&self, key: &ModuleKey) -> bool {
        let Some(module) = self.course.module(key) else {
            warn!("Module {} not found in configuration", key);
            return false;
        };
        module.lessons.iter().all(|id| self.store.is_true(id.as_str()))
    }

    /// Whether every lesson of the course is complete.
    pub fn is_course_complete(&mut self) -> bool {
        let completed = self.completed_count();
        completed == self.lesson_ids().len()
    }

    /// Compute per-module and overall progress from the store.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let mut modules = Vec::with_capacity(self.course.modules.len());
        let mut total = 0;
        let mut completed = 0;

        for module in &self.course.modules {
            let done = module
                .lessons
                .iter()
                .filter(|id| self.store.is_true(id.as_str()))
                .count();
            let count = module.lessons.len();

            modules.push(ModuleProgress {
                key: module.key.clone(),
                name: module.name.clone(),
                icon: module.icon.clone(),
                completed: done,
                total: count,
                is_complete: done == count,
                percentage: coursetrack_core::percentage(done, count),
            });

            total += count;
            completed += done;
        }

        ProgressSnapshot {
            taken_at: Utc::now(),
            modules,
            overall: OverallProgress::new(completed, total),
        }
    }

    /// Run the congratulation-section state machine.
    ///
    /// `visibility` is what the presentation layer currently shows. The
    /// returned commands bring it in line with the store; after applying
    /// them, pass [`Evaluation::visibility_after`] on the next call.
    ///
    /// The completed count is always recomputed here; the memo only serves
    /// standalone [`completed_count`](Self::completed_count) queries.
    pub fn evaluate_and_transition(&mut self, visibility: SectionVisibility) -> Evaluation {
        self.invalidate_cache();
        let complete = self.is_course_complete();

        match (complete, visibility) {
            (true, SectionVisibility::Hidden) => {
                info!("All modules completed, revealing congratulation section");
                let timestamp = Utc::now();
                self.write(keys::COMPLETION_SECTION_UNLOCKED, keys::TRUE);
                self.write(
                    keys::COMPLETION_UNLOCKED_TIMESTAMP,
                    &keys::encode_timestamp(timestamp),
                );
                self.emit(CourseEvent::CourseCompleted { timestamp });

                Evaluation {
                    complete,
                    transition: Some(Transition::Unlocked { timestamp }),
                    commands: vec![
                        PresentationCommand::ShowSection,
                        PresentationCommand::RenderStats(self.snapshot()),
                    ],
                }
            }
            (false, SectionVisibility::Visible) => {
                info!("Course no longer complete, hiding congratulation section");
                self.erase(keys::COMPLETION_SECTION_UNLOCKED);
                self.erase(keys::COMPLETION_UNLOCKED_TIMESTAMP);

                Evaluation {
                    complete,
                    transition: Some(Transition::Relocked),
                    commands: vec![PresentationCommand::HideSection],
                }
            }
            (false, SectionVisibility::Hidden) => {
                let overall = self.snapshot().overall;
                info!(
                    "Progress: {}/{} lessons ({}%)",
                    overall.completed, overall.total, overall.percentage
                );
                Evaluation {
                    complete,
                    transition: None,
                    commands: Vec::new(),
                }
            }
            (true, SectionVisibility::Visible) => Evaluation {
                complete,
                transition: None,
                commands: Vec::new(),
            },
        }
    }

    /// Commands that re-show the section on startup when a previous session
    /// already unlocked it. Nothing is persisted or emitted.
    pub fn restore(&self) -> Vec<PresentationCommand> {
        if !self.store.is_true(keys::COMPLETION_SECTION_UNLOCKED) {
            return Vec::new();
        }
        debug!("Congratulation section was unlocked earlier, restoring");
        vec![
            PresentationCommand::ShowSection,
            PresentationCommand::RenderStats(self.snapshot()),
        ]
    }

    /// Record a finished lesson and re-evaluate. Unknown lessons are logged
    /// and ignored, returning `None`.
    pub fn complete_lesson(
        &mut self,
        lesson: &LessonId,
        visibility: SectionVisibility,
    ) -> Option<Evaluation> {
        if self.course.module_of(lesson).is_none() {
            warn!("Lesson {} not found in configuration", lesson);
            return None;
        }
        self.write(lesson.as_str(), keys::TRUE);
        self.invalidate_cache();
        Some(self.evaluate_and_transition(visibility))
    }

    /// Mark every lesson complete and re-evaluate.
    pub fn simulate_all(&mut self, visibility: SectionVisibility) -> Evaluation {
        info!("Simulating completion of all modules");
        for id in self.course.lesson_ids() {
            self.write(id.as_str(), keys::TRUE);
        }
        self.invalidate_cache();
        self.evaluate_and_transition(visibility)
    }

    /// Erase every lesson flag and every unlock/reward flag.
    ///
    /// Irreversible. The caller is responsible for asking the learner first.
    pub fn reset_all(&mut self, confirmation: ResetConfirmation) -> ResetOutcome {
        if confirmation == ResetConfirmation::Declined {
            debug!("Reset declined");
            return ResetOutcome::Declined;
        }

        info!("Resetting all progress");
        for id in self.course.lesson_ids() {
            self.erase(id.as_str());
        }
        for key in keys::DERIVED_KEYS {
            self.erase(key);
        }
        self.invalidate_cache();

        ResetOutcome::Reset {
            commands: vec![PresentationCommand::HideSection],
        }
    }

    /// Forget the memoised completed count.
    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }

    /// Forget the memoised count and the lesson list.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub(crate) fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!("Failed to write {}: {}", key, e);
        }
    }

    pub(crate) fn erase(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            warn!("Failed to remove {}: {}", key, e);
        }
    }

    pub(crate) fn emit(&self, event: CourseEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
