//! Memoised lesson universe and completed count.

use coursetrack_core::{CourseConfig, LessonId};
use std::time::{Duration, Instant};

/// Ephemeral cache owned by a tracker.
///
/// The lesson list never goes stale (the course is fixed for the tracker's
/// lifetime) and is only dropped by [`MemoCache::clear`]. The completed count
/// is valid for a short window after it was computed.
#[derive(Debug, Default)]
pub struct MemoCache {
    lesson_ids: Option<Vec<LessonId>>,
    completed_count: Option<usize>,
    computed_at: Option<Instant>,
}

impl MemoCache {
    /// Lesson ids of `course`, built on first use.
    pub fn lesson_ids(&mut self, course: &CourseConfig) -> &[LessonId] {
        self.lesson_ids.get_or_insert_with(|| course.lesson_ids())
    }

    /// The memoised count if it was computed less than `ttl` before `now`.
    /// A zero `ttl` disables memoisation.
    pub fn count(&self, now: Instant, ttl: Duration) -> Option<usize> {
        match (self.completed_count, self.computed_at) {
            (Some(count), Some(at)) if now.saturating_duration_since(at) < ttl => Some(count),
            _ => None,
        }
    }

    /// Remember a freshly computed count.
    pub fn store_count(&mut self, count: usize, now: Instant) {
        self.completed_count = Some(count);
        self.computed_at = Some(now);
    }

    /// Forget the completed count, keep the lesson list.
    pub fn invalidate(&mut self) {
        self.completed_count = None;
        self.computed_at = None;
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether the lesson list has been built.
    pub fn has_lesson_ids(&self) -> bool {
        self.lesson_ids.is_some()
    }
}
