//! Skill bundle types.
//!
//! A skill is a persisted `SKILL.md`: a YAML front-matter header followed by
//! free-text markdown instructions. Its directory name is its identity and
//! must equal `metadata.name`.

use serde::{Deserialize, Serialize};

/// The front-matter header of a `SKILL.md`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMetadata {
    pub name: String,
    pub description: String,
}

/// A parsed skill bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub metadata: SkillMetadata,
    pub body: String,
    /// Where the bundle was read from, when it came from disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}
