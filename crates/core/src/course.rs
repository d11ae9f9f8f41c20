//! Course model - modules and their ordered lessons.

use crate::id::{LessonId, ModuleKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Errors raised while loading a course definition.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed course JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Two modules share a key
    #[error("duplicate module key: {0}")]
    DuplicateModule(ModuleKey),

    /// A lesson appears more than once in the course
    #[error("duplicate lesson id: {0}")]
    DuplicateLesson(LessonId),
}

/// A named, ordered group of lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    /// Module key
    pub key: ModuleKey,

    /// Display name
    pub name: String,

    /// Display icon
    pub icon: String,

    /// Lessons in teaching order
    pub lessons: Vec<LessonId>,
}

impl ModuleDefinition {
    /// Create a module definition.
    pub fn new(
        key: impl Into<ModuleKey>,
        name: impl Into<String>,
        icon: impl Into<String>,
        lessons: impl IntoIterator<Item = impl Into<LessonId>>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            icon: icon.into(),
            lessons: lessons.into_iter().map(Into::into).collect(),
        }
    }
}

/// The full course: modules in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseConfig {
    /// Modules in display order
    pub modules: Vec<ModuleDefinition>,
}

impl CourseConfig {
    /// Build a course and validate it.
    pub fn new(modules: Vec<ModuleDefinition>) -> Result<Self, ConfigError> {
        let config = Self { modules };
        config.validate()?;
        Ok(config)
    }

    /// Parse a course definition from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a course definition from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check uniqueness of module keys and lesson ids.
    ///
    /// Empty modules are accepted with a warning; their progress is reported
    /// as 0%.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut modules = HashSet::new();
        let mut lessons = HashSet::new();

        for module in &self.modules {
            if !modules.insert(&module.key) {
                return Err(ConfigError::DuplicateModule(module.key.clone()));
            }
            if module.lessons.is_empty() {
                tracing::warn!("Module {} has no lessons", module.key);
            }
            for lesson in &module.lessons {
                if !lessons.insert(lesson) {
                    return Err(ConfigError::DuplicateLesson(lesson.clone()));
                }
            }
        }

        Ok(())
    }

    /// Look up a module by key.
    pub fn module(&self, key: &ModuleKey) -> Option<&ModuleDefinition> {
        self.modules.iter().find(|m| &m.key == key)
    }

    /// Find the module a lesson belongs to.
    pub fn module_of(&self, lesson: &LessonId) -> Option<&ModuleDefinition> {
        self.modules.iter().find(|m| m.lessons.contains(lesson))
    }

    /// All lesson ids, module order then lesson order.
    pub fn lesson_ids(&self) -> Vec<LessonId> {
        self.modules
            .iter()
            .flat_map(|m| m.lessons.iter().cloned())
            .collect()
    }

    /// Total number of lessons across all modules.
    pub fn total_lessons(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }

    /// The six-module web development course.
    pub fn reference() -> Self {
        Self {
            modules: vec![
                ModuleDefinition::new(
                    "modul0",
                    "Oppsett og verktøy",
                    "🛠️",
                    [
                        "modul0_leksjon1_completed",
                        "modul0_leksjon2_completed",
                        "modul0_leksjon3_completed",
                        "modul0_leksjon4_completed",
                        "modul0_leksjon5_completed",
                    ],
                ),
                ModuleDefinition::new(
                    "modul1",
                    "HTML Grunnleggende",
                    "📚",
                    [
                        "modul1_completed",
                        "modul1_kommentarer_completed",
                        "modul1_bilder_completed",
                        "modul1_videre_completed",
                        "modul1_tabeller_completed",
                    ],
                ),
                ModuleDefinition::new(
                    "modul2",
                    "CSS Styling",
                    "🎨",
                    [
                        "modul2_css_intro_completed",
                        "modul2_selektorer_completed",
                        "modul2_layout_completed",
                        "modul2_responsive_completed",
                    ],
                ),
                ModuleDefinition::new(
                    "modul3",
                    "JavaScript",
                    "⚡",
                    [
                        "modul3_js_intro_completed",
                        "modul3_dom_completed",
                        "modul3_events_completed",
                        "modul3_projects_completed",
                    ],
                ),
                ModuleDefinition::new(
                    "modul4",
                    "Avanserte teknikker",
                    "🎮",
                    [
                        "modul4_flexbox_completed",
                        "modul4_animasjoner_completed",
                        "modul4_tastatur_completed",
                        "modul4_spill_completed",
                    ],
                ),
                ModuleDefinition::new(
                    "modul5",
                    "API og Asynkron JS",
                    "🔥",
                    [
                        "modul5_api_intro_completed",
                        "modul5_async_js_completed",
                        "modul5_data_processing_completed",
                        "modul5_local_storage_completed",
                        "modul5_api_app_completed",
                    ],
                ),
            ],
        }
    }
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self::reference()
    }
}
