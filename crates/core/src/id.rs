//! Identifiers for course entities.

use serde::{Deserialize, Serialize};

/// Identifier of a single lesson.
///
/// The identifier doubles as the store key holding the lesson's completion
/// flag, so it must be unique across every module of a course.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonId(String);

impl LessonId {
    /// Create a lesson ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The store key for this lesson.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LessonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for LessonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LessonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a course module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleKey(String);

impl ModuleKey {
    /// Create a module key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ModuleKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModuleKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}
