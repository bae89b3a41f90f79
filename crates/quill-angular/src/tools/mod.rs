//! Filesystem tools offered directly to agents.

pub mod skills;
pub mod todo;

pub use skills::{parse_skill, SkillLibrary, SkillSummary};
pub use todo::TodoWriter;

use quill_verify::SchemaValidator;

/// A schema validator with the filesystem tools' own argument checks.
pub fn argument_validator() -> SchemaValidator {
    let mut validator = SchemaValidator::new();
    skills::register_checks(&mut validator);
    validator
}
