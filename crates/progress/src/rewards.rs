//! Rewards offered once the course is complete.

use chrono::Utc;
use coursetrack_core::{keys, CourseConfig, CourseEvent, LessonId, ProgressSnapshot, Time};
use coursetrack_storage::KeyValueStore;
use serde::Serialize;
use tracing::info;

use crate::tracker::ProgressTracker;

/// A reward that can be unlocked from the congratulation section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reward {
    /// Access to the advanced project catalogue
    AdvancedProjects,
    /// Mentor mode
    MentorMode,
    /// Generated portfolio
    Portfolio,
}

impl Reward {
    /// All rewards.
    pub const ALL: [Reward; 3] = [Reward::AdvancedProjects, Reward::MentorMode, Reward::Portfolio];

    /// Store key of the reward's flag.
    pub fn flag_key(self) -> &'static str {
        match self {
            Reward::AdvancedProjects => keys::ADVANCED_PROJECTS_UNLOCKED,
            Reward::MentorMode => keys::MENTOR_MODE_UNLOCKED,
            Reward::Portfolio => keys::PORTFOLIO_GENERATED,
        }
    }

    /// Store key of the unlock date, if the reward records one.
    pub fn date_key(self) -> Option<&'static str> {
        match self {
            Reward::AdvancedProjects => Some(keys::ADVANCED_PROJECTS_UNLOCK_DATE),
            Reward::MentorMode => Some(keys::MENTOR_UNLOCK_DATE),
            Reward::Portfolio => None,
        }
    }

    fn event(self, timestamp: Time) -> CourseEvent {
        match self {
            Reward::AdvancedProjects => CourseEvent::AdvancedProjectsUnlocked { timestamp },
            Reward::MentorMode => CourseEvent::MentorModeUnlocked { timestamp },
            Reward::Portfolio => CourseEvent::PortfolioGenerated,
        }
    }
}

impl std::fmt::Display for Reward {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reward::AdvancedProjects => write!(f, "advanced projects"),
            Reward::MentorMode => write!(f, "mentor mode"),
            Reward::Portfolio => write!(f, "portfolio"),
        }
    }
}

/// Outcome of unlocking a reward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewardOutcome {
    /// Newly unlocked
    Unlocked {
        /// Unlock time
        timestamp: Time,
    },
    /// Was already unlocked; nothing changed
    AlreadyUnlocked,
    /// Rewards require a completed course
    CourseIncomplete,
}

/// Proof of completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Certificate {
    /// Lessons completed
    pub completed_lessons: usize,

    /// Modules completed
    pub modules_mastered: usize,

    /// When the course was completed
    pub completed_at: Time,
}

impl std::fmt::Display for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Course certificate")?;
        writeln!(f)?;
        writeln!(f, "Congratulations on completing the web development course!")?;
        writeln!(f)?;
        writeln!(f, "  {} lessons completed", self.completed_lessons)?;
        writeln!(f, "  {} modules mastered", self.modules_mastered)?;
        write!(f, "  Completed: {}", self.completed_at.format("%Y-%m-%d"))
    }
}

/// Everything worth looking at when progress seems wrong.
#[derive(Debug, Clone, Serialize)]
pub struct DebugReport {
    /// Course definition
    pub course: CourseConfig,
    /// Fresh progress snapshot
    pub snapshot: ProgressSnapshot,
    /// Lesson universe in order
    pub lesson_ids: Vec<LessonId>,
    /// Completed lessons
    pub completed_count: usize,
    /// Whether the course is complete
    pub all_complete: bool,
    /// Raw unlock flag
    pub unlocked: Option<String>,
    /// Raw unlock timestamp
    pub unlocked_at: Option<String>,
}

impl<S: KeyValueStore> ProgressTracker<S> {
    /// Unlock a reward. Only a completed course may unlock rewards, and each
    /// reward is unlocked at most once.
    pub fn unlock(&mut self, reward: Reward) -> RewardOutcome {
        self.invalidate_cache();
        if !self.is_course_complete() {
            return RewardOutcome::CourseIncomplete;
        }
        if self.store.is_true(reward.flag_key()) {
            return RewardOutcome::AlreadyUnlocked;
        }

        let timestamp = Utc::now();
        self.write(reward.flag_key(), keys::TRUE);
        if let Some(date_key) = reward.date_key() {
            self.write(date_key, &keys::encode_timestamp(timestamp));
        }
        self.emit(reward.event(timestamp));
        info!("Unlocked {}", reward);

        RewardOutcome::Unlocked { timestamp }
    }

    /// Unlock the advanced project catalogue.
    pub fn unlock_advanced_projects(&mut self) -> RewardOutcome {
        self.unlock(Reward::AdvancedProjects)
    }

    /// Unlock mentor mode.
    pub fn unlock_mentor_mode(&mut self) -> RewardOutcome {
        self.unlock(Reward::MentorMode)
    }

    /// Generate the portfolio.
    pub fn generate_portfolio(&mut self) -> RewardOutcome {
        self.unlock(Reward::Portfolio)
    }

    /// Whether a reward has been unlocked.
    pub fn is_unlocked(&self, reward: Reward) -> bool {
        self.store.is_true(reward.flag_key())
    }

    /// Certificate for a completed course; `None` while lessons remain.
    ///
    /// The date is the persisted completion time, or now when none was
    /// recorded.
    pub fn certificate(&mut self) -> Option<Certificate> {
        self.invalidate_cache();
        if !self.is_course_complete() {
            return None;
        }

        let snapshot = self.snapshot();
        let completed_at = self
            .store
            .get(keys::COMPLETION_UNLOCKED_TIMESTAMP)
            .and_then(|v| keys::decode_timestamp(&v))
            .unwrap_or_else(Utc::now);

        Some(Certificate {
            completed_lessons: snapshot.overall.completed,
            modules_mastered: snapshot.completed_modules(),
            completed_at,
        })
    }

    /// Collect diagnostics.
    pub fn debug_report(&mut self) -> DebugReport {
        DebugReport {
            course: self.course.clone(),
            snapshot: self.snapshot(),
            lesson_ids: self.lesson_ids().to_vec(),
            completed_count: self.completed_count(),
            all_complete: self.is_course_complete(),
            unlocked: self.store.get(keys::COMPLETION_SECTION_UNLOCKED),
            unlocked_at: self.store.get(keys::COMPLETION_UNLOCKED_TIMESTAMP),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::ResetConfirmation;
    use coursetrack_core::SectionVisibility;
    use coursetrack_storage::MemoryStore;

    fn tracker() -> ProgressTracker<MemoryStore> {
        ProgressTracker::new(CourseConfig::reference(), MemoryStore::new())
    }

    #[test]
    fn test_rewards_need_completed_course() {
        let mut tracker = tracker();
        for reward in Reward::ALL {
            assert_eq!(tracker.unlock(reward), RewardOutcome::CourseIncomplete);
            assert!(!tracker.is_unlocked(reward));
        }
        assert!(tracker.store().is_empty());
    }

    #[test]
    fn test_unlock_advanced_projects() {
        let mut tracker = tracker();
        tracker.simulate_all(SectionVisibility::Hidden);
        let mut events = tracker.subscribe_events();

        let RewardOutcome::Unlocked { timestamp } = tracker.unlock_advanced_projects() else {
            panic!("expected unlock");
        };
        assert!(tracker.is_unlocked(Reward::AdvancedProjects));
        assert_eq!(
            tracker.store().get(keys::ADVANCED_PROJECTS_UNLOCK_DATE),
            Some(keys::encode_timestamp(timestamp))
        );
        assert_eq!(
            events.try_recv().unwrap(),
            CourseEvent::AdvancedProjectsUnlocked { timestamp }
        );

        assert_eq!(tracker.unlock_advanced_projects(), RewardOutcome::AlreadyUnlocked);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_unlock_mentor_mode_and_portfolio() {
        let mut tracker = tracker();
        tracker.simulate_all(SectionVisibility::Hidden);
        let mut events = tracker.subscribe_events();

        assert!(matches!(tracker.unlock_mentor_mode(), RewardOutcome::Unlocked { .. }));
        assert!(tracker.store().get(keys::MENTOR_UNLOCK_DATE).is_some());
        assert!(matches!(events.try_recv(), Ok(CourseEvent::MentorModeUnlocked { .. })));

        assert!(matches!(tracker.generate_portfolio(), RewardOutcome::Unlocked { .. }));
        assert!(tracker.store().is_true(keys::PORTFOLIO_GENERATED));
        assert_eq!(events.try_recv().unwrap(), CourseEvent::PortfolioGenerated);
    }

    #[test]
    fn test_reset_clears_rewards() {
        let mut tracker = tracker();
        tracker.simulate_all(SectionVisibility::Hidden);
        for reward in Reward::ALL {
            tracker.unlock(reward);
        }

        tracker.reset_all(ResetConfirmation::Confirmed);
        for reward in Reward::ALL {
            assert!(!tracker.is_unlocked(reward));
            if let Some(date_key) = reward.date_key() {
                assert!(tracker.store().get(date_key).is_none());
            }
        }
    }

    #[test]
    fn test_lost_lesson_blocks_rewards() {
        let mut tracker = tracker();
        tracker.simulate_all(SectionVisibility::Hidden);
        assert!(tracker.is_course_complete());

        tracker.store().remove("modul2_layout_completed").unwrap();
        assert_eq!(tracker.unlock_mentor_mode(), RewardOutcome::CourseIncomplete);
        assert!(tracker.certificate().is_none());
    }

    #[test]
    fn test_certificate() {
        let mut tracker = tracker();
        assert!(tracker.certificate().is_none());

        tracker.simulate_all(SectionVisibility::Hidden);
        let stamp = tracker.store().get(keys::COMPLETION_UNLOCKED_TIMESTAMP).unwrap();

        let certificate = tracker.certificate().unwrap();
        assert_eq!(certificate.completed_lessons, tracker.course().total_lessons());
        assert_eq!(certificate.modules_mastered, 6);
        assert_eq!(keys::encode_timestamp(certificate.completed_at), stamp);

        let text = certificate.to_string();
        assert!(text.contains("lessons completed"));
        assert!(text.contains(&certificate.completed_at.format("%Y-%m-%d").to_string()));
    }

    #[test]
    fn test_certificate_without_recorded_time() {
        let mut tracker = tracker();
        for id in tracker.course().lesson_ids() {
            tracker.store().set(id.as_str(), "true").unwrap();
        }
        let before = Utc::now();
        let certificate = tracker.certificate().unwrap();
        assert!(certificate.completed_at >= before - chrono::Duration::seconds(1));
    }

    #[test]
    fn test_debug_report_serializes() {
        let mut tracker = tracker();
        tracker.complete_lesson(&"modul1_completed".into(), SectionVisibility::Hidden);

        let report = tracker.debug_report();
        assert_eq!(report.completed_count, 1);
        assert!(!report.all_complete);
        assert_eq!(report.lesson_ids.len(), tracker.course().total_lessons());
        assert!(report.unlocked.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["completed_count"], 1);
        assert_eq!(json["snapshot"]["overall"]["completed"], 1);
    }
}
