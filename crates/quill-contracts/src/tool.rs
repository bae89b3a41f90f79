//! Tool descriptions and argument validation reports.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The schema-described face of a tool, as offered to the model.
///
/// Immutable once built; the name must be unique within a tool registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema of the argument object.
    pub parameters: Value,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Names listed in the schema's top-level `required` array.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// The result of validating one set of tool arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True only if no failure was found.
    pub passed: bool,
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    pub fn pass() -> Self {
        Self {
            passed: true,
            failures: Vec::new(),
        }
    }

    /// Join all failure messages into one line for a tool-result message.
    pub fn summary(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("{}: {}", f.path, f.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A single schema violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// JSON pointer into the arguments, empty for the root object.
    pub path: String,
    pub message: String,
}
