//! `write_todo`: persist a TODO list under a fresh result directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tracing::info;

use quill_contracts::{
    error::{QuillError, QuillResult},
    tool::ToolSpec,
};
use quill_core::tool::DirectTool;

pub const WRITE_TODO: &str = "write_todo";
const TODO_FILE: &str = "TODO.md";

/// Writes each TODO list to `<result_dir>/<uuid>/TODO.md`.
#[derive(Debug, Clone)]
pub struct TodoWriter {
    result_dir: PathBuf,
}

impl TodoWriter {
    pub fn new(result_dir: impl Into<PathBuf>) -> Self {
        Self {
            result_dir: result_dir.into(),
        }
    }

    pub fn result_dir(&self) -> &Path {
        &self.result_dir
    }

    /// Write `content` and return the file path. Every call gets its own
    /// directory, so nothing is ever overwritten.
    pub fn write(&self, content: &str) -> QuillResult<PathBuf> {
        let fail = |reason: String| QuillError::ToolExecutionFailure {
            tool: WRITE_TODO.to_string(),
            reason,
        };

        if content.trim().is_empty() {
            return Err(fail("file_content is empty".to_string()));
        }

        let dir = self.result_dir.join(uuid::Uuid::new_v4().to_string());
        fs::create_dir_all(&dir).map_err(|e| fail(format!("cannot create {}: {e}", dir.display())))?;

        let path = dir.join(TODO_FILE);
        fs::write(&path, content).map_err(|e| fail(format!("cannot write {}: {e}", path.display())))?;

        info!(path = %path.display(), bytes = content.len(), "TODO list written");
        Ok(path)
    }

    pub fn spec() -> ToolSpec {
        ToolSpec::new(
            WRITE_TODO,
            "Writes a TODO.md file in Markdown. Returns the path of the written file.",
            json!({
                "type": "object",
                "properties": {
                    "file_content": {
                        "type": "string",
                        "description": "The content of the TODO.md file"
                    }
                },
                "required": ["file_content"]
            }),
        )
    }

    pub fn into_tool(self) -> DirectTool {
        DirectTool::new(Self::spec(), move |arguments: &Value| {
            let content = arguments
                .get("file_content")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let path = self.write(content)?;
            Ok(Value::String(path.display().to_string()))
        })
    }
}
