//! Schema-based argument validator.
//!
//! `SchemaValidator` implements the `ArgumentValidator` trait from
//! `quill-core`. Validation runs in two phases:
//!
//! 1. **Structural**: the argument object is validated against the tool's
//!    `parameters` JSON Schema using the `jsonschema` crate.
//! 2. **Custom**: every check registered for the tool name runs in
//!    registration order.
//!
//! All failures are collected before returning so the model sees the full
//! failure set in one tool-result message.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use quill_contracts::{
    error::{QuillError, QuillResult},
    tool::{ToolSpec, ValidationFailure, ValidationReport},
};
use quill_core::traits::ArgumentValidator;

/// A caller-supplied argument check.
///
/// Receives the full argument object. Returns `Some(message)` when the check
/// fails, or `None` on success.
pub type ArgumentCheckFn = Box<dyn Fn(&Value) -> Option<String> + Send + Sync>;

pub struct SchemaValidator {
    /// Custom checks keyed by tool name.
    checks: HashMap<String, Vec<ArgumentCheckFn>>,
}

impl SchemaValidator {
    /// Create a validator with no custom checks.
    pub fn new() -> Self {
        Self {
            checks: HashMap::new(),
        }
    }

    /// Add a check for tool `tool_name`. Checks accumulate; a tool may have
    /// several.
    pub fn register_check(&mut self, tool_name: impl Into<String>, check: ArgumentCheckFn) {
        self.checks.entry(tool_name.into()).or_default().push(check);
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ArgumentValidator for SchemaValidator {
    /// Validate `arguments` for `tool`.
    ///
    /// A `null` parameter schema means "no structural constraint". A schema
    /// that does not compile is a `SchemaValidation` error, since no call to
    /// the tool could ever be checked.
    fn validate(&self, tool: &ToolSpec, arguments: &Value) -> QuillResult<ValidationReport> {
        let mut failures: Vec<ValidationFailure> = Vec::new();

        // ── Phase 1: JSON Schema structural validation ───────────────────────
        if !tool.parameters.is_null() {
            let validator = jsonschema::validator_for(&tool.parameters).map_err(|e| {
                warn!(tool = %tool.name, error = %e, "parameter schema does not compile");
                QuillError::SchemaValidation {
                    reason: format!("tool '{}' has an invalid parameter schema: {e}", tool.name),
                }
            })?;

            for error in validator.iter_errors(arguments) {
                let path = error.instance_path.to_string();
                let message = error.to_string();
                debug!(tool = %tool.name, path = %path, %message, "argument schema violation");
                failures.push(ValidationFailure {
                    path: if path.is_empty() { "/".to_string() } else { path },
                    message,
                });
            }
        }

        // ── Phase 2: Custom checks ───────────────────────────────────────────
        if let Some(checks) = self.checks.get(&tool.name) {
            for check in checks {
                if let Some(message) = check(arguments) {
                    debug!(tool = %tool.name, %message, "custom argument check failed");
                    failures.push(ValidationFailure {
                        path: "/".to_string(),
                        message,
                    });
                }
            }
        }

        let passed = failures.is_empty();
        if !passed {
            warn!(
                tool = %tool.name,
                failure_count = failures.len(),
                "tool arguments rejected"
            );
        }

        Ok(ValidationReport { passed, failures })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use quill_contracts::{error::QuillError, tool::ToolSpec};
    use quill_core::traits::ArgumentValidator;

    use super::SchemaValidator;

    fn write_skill_spec() -> ToolSpec {
        ToolSpec::new(
            "write_skill",
            "Write a SKILL.md file",
            json!({
                "type": "object",
                "properties": {
                    "dir_name": { "type": "string" },
                    "file_content": { "type": "string" }
                },
                "required": ["dir_name", "file_content"]
            }),
        )
    }

    #[test]
    fn conforming_arguments_pass() {
        let validator = SchemaValidator::new();
        let report = validator
            .validate(
                &write_skill_spec(),
                &json!({ "dir_name": "forms", "file_content": "---\nname: forms\n---" }),
            )
            .unwrap();

        assert!(report.passed, "expected pass, failures: {:?}", report.failures);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn missing_required_argument_fails() {
        let validator = SchemaValidator::new();
        let report = validator
            .validate(&write_skill_spec(), &json!({ "dir_name": "forms" }))
            .unwrap();

        assert!(!report.passed);
        assert_eq!(report.failures.len(), 1);
        assert!(
            report.failures[0].message.contains("file_content"),
            "failure should name the missing argument: {}",
            report.failures[0].message
        );
    }

    #[test]
    fn wrong_type_reports_instance_path() {
        let validator = SchemaValidator::new();
        let report = validator
            .validate(&write_skill_spec(), &json!({ "dir_name": 7, "file_content": "x" }))
            .unwrap();

        assert!(!report.passed);
        assert_eq!(report.failures[0].path, "/dir_name");
    }

    #[test]
    fn null_schema_accepts_anything() {
        let validator = SchemaValidator::new();
        let spec = ToolSpec::new("read_skills", "no arguments", serde_json::Value::Null);
        assert!(validator.validate(&spec, &json!({ "x": 1 })).unwrap().passed);
    }

    #[test]
    fn invalid_schema_is_an_error() {
        let validator = SchemaValidator::new();
        let spec = ToolSpec::new("broken", "bad schema", json!({ "type": "not-a-type" }));
        assert!(matches!(
            validator.validate(&spec, &json!({})),
            Err(QuillError::SchemaValidation { .. })
        ));
    }

    #[test]
    fn custom_checks_run_after_schema_and_accumulate() {
        let mut validator = SchemaValidator::new();
        validator.register_check(
            "write_skill",
            Box::new(|args| match args.get("dir_name").and_then(|v| v.as_str()) {
                Some(name) if name.contains('/') => Some("dir_name must be a single path segment".to_string()),
                _ => None,
            }),
        );

        let report = validator
            .validate(&write_skill_spec(), &json!({ "dir_name": "../escape" }))
            .unwrap();

        assert!(!report.passed);
        assert_eq!(report.failures.len(), 2, "schema and custom failures: {:?}", report.failures);
        assert!(report.summary().contains("single path segment"));
    }

    #[test]
    fn checks_apply_only_to_their_tool() {
        let mut validator = SchemaValidator::new();
        validator.register_check("other_tool", Box::new(|_| Some("always fails".to_string())));

        let report = validator
            .validate(&write_skill_spec(), &json!({ "dir_name": "a", "file_content": "b" }))
            .unwrap();
        assert!(report.passed);
    }
}
