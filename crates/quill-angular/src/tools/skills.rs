//! Skill bundle tools: `write_skill`, `read_skills_descriptions` and
//! `read_example_skills`.
//!
//! A bundle is `<skills_dir>/<name>/SKILL.md`: YAML front matter between two
//! `---` lines, then a markdown body. The directory name and the front-matter
//! `name` must be equal, and an existing bundle is never overwritten.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use walkdir::WalkDir;

use quill_contracts::{
    error::{QuillError, QuillResult},
    skill::{Skill, SkillMetadata},
    tool::ToolSpec,
};
use quill_core::tool::DirectTool;
use quill_verify::SchemaValidator;

pub const WRITE_SKILL: &str = "write_skill";
pub const READ_SKILLS_DESCRIPTIONS: &str = "read_skills_descriptions";
pub const READ_EXAMPLE_SKILLS: &str = "read_example_skills";
pub const SKILL_FILE: &str = "SKILL.md";

const FENCE: &str = "---";

/// Parse a `SKILL.md` document.
pub fn parse_skill(text: &str) -> QuillResult<Skill> {
    let invalid = |reason: &str| QuillError::ToolExecutionFailure {
        tool: WRITE_SKILL.to_string(),
        reason: reason.to_string(),
    };

    let rest = text
        .trim_start()
        .strip_prefix(FENCE)
        .ok_or_else(|| invalid("SKILL.md must start with a '---' front-matter line"))?;
    let end = rest
        .find(&format!("\n{FENCE}"))
        .ok_or_else(|| invalid("front matter is not closed by a '---' line"))?;

    let header = &rest[..end];
    let body = rest[end + 1 + FENCE.len()..].trim_start_matches(['\r', '\n']);

    let metadata: SkillMetadata = serde_yaml::from_str(header).map_err(|e| QuillError::ToolExecutionFailure {
        tool: WRITE_SKILL.to_string(),
        reason: format!("front matter needs 'name' and 'description': {e}"),
    })?;

    Ok(Skill {
        metadata,
        body: body.to_string(),
        file_path: None,
    })
}

/// The listing entry for one stored skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillSummary {
    pub file_path: String,
    pub name: String,
    pub description: String,
}

/// Reads and writes skill bundles.
#[derive(Debug, Clone)]
pub struct SkillLibrary {
    skills_dir: PathBuf,
    example_skills_dir: PathBuf,
}

impl SkillLibrary {
    pub fn new(skills_dir: impl Into<PathBuf>, example_skills_dir: impl Into<PathBuf>) -> Self {
        Self {
            skills_dir: skills_dir.into(),
            example_skills_dir: example_skills_dir.into(),
        }
    }

    pub fn skills_dir(&self) -> &Path {
        &self.skills_dir
    }

    /// Create `<skills_dir>/<dir_name>/SKILL.md` and return its path.
    ///
    /// # Errors
    ///
    /// `DuplicateResource` when the directory already exists;
    /// `ToolExecutionFailure` for a bad directory name, malformed front
    /// matter, a name mismatch or an I/O error.
    pub fn create(&self, dir_name: &str, content: &str) -> QuillResult<PathBuf> {
        let fail = |reason: String| QuillError::ToolExecutionFailure {
            tool: WRITE_SKILL.to_string(),
            reason,
        };

        if let Some(reason) = check_dir_name(dir_name) {
            return Err(fail(reason));
        }
        let skill = parse_skill(content)?;
        if let Some(reason) = name_mismatch(dir_name, &skill.metadata.name) {
            return Err(fail(reason));
        }

        fs::create_dir_all(&self.skills_dir)
            .map_err(|e| fail(format!("cannot create {}: {e}", self.skills_dir.display())))?;

        let dir = self.skills_dir.join(dir_name);
        if dir.exists() {
            return Err(QuillError::DuplicateResource {
                name: dir_name.to_string(),
            });
        }

        // The file is staged next to the bundle so a failed write never
        // leaves an empty bundle directory behind.
        let staged = self.skills_dir.join(format!(".{dir_name}.{SKILL_FILE}.tmp"));
        fs::write(&staged, content).map_err(|e| fail(format!("cannot write {}: {e}", staged.display())))?;

        match fs::create_dir(&dir) {
            Ok(()) => {}
            Err(e) => {
                discard(&staged);
                if e.kind() == ErrorKind::AlreadyExists {
                    return Err(QuillError::DuplicateResource {
                        name: dir_name.to_string(),
                    });
                }
                return Err(fail(format!("cannot create {}: {e}", dir.display())));
            }
        }

        let path = dir.join(SKILL_FILE);
        if let Err(e) = fs::rename(&staged, &path) {
            discard(&staged);
            if let Err(cleanup) = fs::remove_dir_all(&dir) {
                warn!(path = %dir.display(), error = %cleanup, "could not remove partial skill bundle");
            }
            return Err(fail(format!("cannot write {}: {e}", path.display())));
        }

        info!(skill = dir_name, path = %path.display(), "skill written");
        Ok(path)
    }

    /// Name and description of every stored skill, sorted by path. Bundles
    /// that fail to parse are skipped; a missing directory lists nothing.
    pub fn descriptions(&self) -> Vec<SkillSummary> {
        skill_files(&self.skills_dir)
            .into_iter()
            .filter_map(|path| {
                let parsed = fs::read_to_string(&path)
                    .map_err(|e| e.to_string())
                    .and_then(|text| parse_skill(&text).map_err(|e| e.to_string()));
                match parsed {
                    Ok(skill) => Some(SkillSummary {
                        file_path: path.display().to_string(),
                        name: skill.metadata.name,
                        description: skill.metadata.description,
                    }),
                    Err(reason) => {
                        warn!(path = %path.display(), %reason, "skipping unreadable skill");
                        None
                    }
                }
            })
            .collect()
    }

    /// Every example bundle, concatenated in path order.
    pub fn examples(&self) -> String {
        skill_files(&self.example_skills_dir)
            .iter()
            .filter_map(|path| fs::read_to_string(path).ok())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn write_skill_tool(&self) -> DirectTool {
        let library = self.clone();
        let spec = ToolSpec::new(
            WRITE_SKILL,
            "Writes a SKILL.md file in front-matter Markdown. Returns the path of the written file.",
            json!({
                "type": "object",
                "properties": {
                    "dir_name": {
                        "type": "string",
                        "description": "A one-word lowercase name for the skill directory, equal to the front-matter name"
                    },
                    "file_content": {
                        "type": "string",
                        "description": "The content of the SKILL.md file"
                    }
                },
                "required": ["dir_name", "file_content"]
            }),
        );
        DirectTool::new(spec, move |arguments: &Value| {
            let dir_name = arguments.get("dir_name").and_then(Value::as_str).unwrap_or_default();
            let content = arguments.get("file_content").and_then(Value::as_str).unwrap_or_default();
            match library.create(dir_name, content) {
                Ok(path) => Ok(Value::String(path.display().to_string())),
                Err(QuillError::DuplicateResource { name }) => {
                    Ok(Value::String(format!("skill '{name}' already exists")))
                }
                Err(e) => Err(e),
            }
        })
    }

    pub fn read_descriptions_tool(&self) -> DirectTool {
        let library = self.clone();
        let spec = ToolSpec::new(
            READ_SKILLS_DESCRIPTIONS,
            "Lists every existing skill with its file path, name and description.",
            json!({ "type": "object", "properties": {} }),
        );
        DirectTool::new(spec, move |_: &Value| {
            serde_json::to_value(library.descriptions()).map_err(|e| QuillError::ToolExecutionFailure {
                tool: READ_SKILLS_DESCRIPTIONS.to_string(),
                reason: e.to_string(),
            })
        })
    }

    pub fn read_examples_tool(&self) -> DirectTool {
        let library = self.clone();
        let spec = ToolSpec::new(
            READ_EXAMPLE_SKILLS,
            "Reads the example SKILL.md files that show the expected format.",
            json!({ "type": "object", "properties": {} }),
        );
        DirectTool::new(spec, move |_: &Value| Ok(Value::String(library.examples())))
    }
}

/// `None` when `dir_name` is a single visible path segment.
fn check_dir_name(dir_name: &str) -> Option<String> {
    if dir_name.is_empty() || dir_name.starts_with('.') || dir_name.contains(['/', '\\']) {
        return Some(format!("'{dir_name}' is not a valid skill directory name"));
    }
    None
}

fn name_mismatch(dir_name: &str, front_matter_name: &str) -> Option<String> {
    (front_matter_name != dir_name)
        .then(|| format!("front matter name '{front_matter_name}' does not match directory '{dir_name}'"))
}

/// `None` when `content` parses and its front-matter name is `dir_name`.
fn check_front_matter_name(dir_name: &str, content: &str) -> Option<String> {
    match parse_skill(content) {
        Ok(skill) => name_mismatch(dir_name, &skill.metadata.name),
        Err(e) => Some(e.to_string()),
    }
}

/// Argument checks for `write_skill`, run by the validator before the tool
/// touches the filesystem.
pub fn register_checks(validator: &mut SchemaValidator) {
    validator.register_check(
        WRITE_SKILL,
        Box::new(|args: &Value| args.get("dir_name").and_then(Value::as_str).and_then(check_dir_name)),
    );
    validator.register_check(
        WRITE_SKILL,
        Box::new(|args: &Value| {
            let dir_name = args.get("dir_name").and_then(Value::as_str)?;
            let content = args.get("file_content").and_then(Value::as_str)?;
            check_front_matter_name(dir_name, content)
        }),
    );
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "could not remove staged skill file");
    }
}

/// Regular files under `root`, sorted by path. Hidden files are skipped.
fn skill_files(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.into_path())
        .collect()
}
