//! Well-known store keys and the completion-flag encoding.
//!
//! Lesson flags live under their [`LessonId`](crate::LessonId). Everything else
//! the tracker persists uses one of the fixed keys below.

/// Set to [`TRUE`] once the congratulation section has been revealed.
pub const COMPLETION_SECTION_UNLOCKED: &str = "completion_section_unlocked";

/// Epoch milliseconds of the moment the course was completed.
pub const COMPLETION_UNLOCKED_TIMESTAMP: &str = "completion_unlocked_timestamp";

/// Reward flag: advanced projects.
pub const ADVANCED_PROJECTS_UNLOCKED: &str = "advanced_projects_unlocked";

/// Epoch milliseconds of the advanced projects unlock.
pub const ADVANCED_PROJECTS_UNLOCK_DATE: &str = "advanced_projects_unlock_date";

/// Reward flag: mentor mode.
pub const MENTOR_MODE_UNLOCKED: &str = "mentor_mode_unlocked";

/// Epoch milliseconds of the mentor mode unlock.
pub const MENTOR_UNLOCK_DATE: &str = "mentor_unlock_date";

/// Reward flag: portfolio generated.
pub const PORTFOLIO_GENERATED: &str = "portfolio_generated";

/// Every non-lesson key the tracker owns, cleared on a full reset.
pub const DERIVED_KEYS: [&str; 7] = [
    COMPLETION_SECTION_UNLOCKED,
    COMPLETION_UNLOCKED_TIMESTAMP,
    ADVANCED_PROJECTS_UNLOCKED,
    ADVANCED_PROJECTS_UNLOCK_DATE,
    MENTOR_MODE_UNLOCKED,
    MENTOR_UNLOCK_DATE,
    PORTFOLIO_GENERATED,
];

/// The only value that counts as "done".
pub const TRUE: &str = "true";

/// Naming convention shared by every lesson key.
pub const LESSON_KEY_MARKER: &str = "_completed";

/// Whether a stored value marks completion. Anything but the exact literal
/// `"true"`, including `"false"`, `"TRUE"` and absence, is incomplete.
pub fn is_completion_flag(value: Option<&str>) -> bool {
    value == Some(TRUE)
}

/// Whether a key follows the lesson naming convention.
pub fn is_lesson_key(key: &str) -> bool {
    key.contains(LESSON_KEY_MARKER)
}

/// Encode a timestamp the way it is persisted: epoch milliseconds as text.
pub fn encode_timestamp(at: crate::Time) -> String {
    at.timestamp_millis().to_string()
}

/// Decode a persisted timestamp. Malformed values decode to `None`.
pub fn decode_timestamp(value: &str) -> Option<crate::Time> {
    let millis = value.trim().parse::<i64>().ok()?;
    chrono::DateTime::from_timestamp_millis(millis)
}
