//! Loading and validating a `QuillConfig`.

use std::path::Path;

use tracing::debug;

use quill_contracts::error::{QuillError, QuillResult};

use crate::settings::QuillConfig;

impl QuillConfig {
    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `QuillError::ConfigError` if the TOML is malformed, does not
    /// match the schema, or fails `validate()`.
    pub fn from_toml_str(s: &str) -> QuillResult<Self> {
        let config: QuillConfig = toml::from_str(s).map_err(|e| QuillError::ConfigError {
            reason: format!("failed to parse config TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it with `from_toml_str`.
    pub fn from_file(path: &Path) -> QuillResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| QuillError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&contents)
    }

    /// Reject values no component could work with.
    pub fn validate(&self) -> QuillResult<()> {
        let fail = |reason: String| Err(QuillError::ConfigError { reason });

        for (role, generator) in [("thinking", &self.generators.thinking), ("coder", &self.generators.coder)] {
            if generator.model.trim().is_empty() {
                return fail(format!("generators.{role}.model must not be empty"));
            }
            if !(0.0..=2.0).contains(&generator.temperature) {
                return fail(format!(
                    "generators.{role}.temperature must be within 0.0..=2.0, got {}",
                    generator.temperature
                ));
            }
            if generator.timeout_secs == 0 {
                return fail(format!("generators.{role}.timeout_secs must be positive"));
            }
        }

        if self.embedder.model.trim().is_empty() {
            return fail("embedder.model must not be empty".to_string());
        }
        if self.embedder.dimension == 0 {
            return fail("embedder.dimension must be positive".to_string());
        }

        let docs = &self.documentation;
        if docs.chunk_size == 0 {
            return fail("documentation.chunk_size must be positive".to_string());
        }
        if docs.chunk_overlap >= docs.chunk_size {
            return fail(format!(
                "documentation.chunk_overlap ({}) must be smaller than chunk_size ({})",
                docs.chunk_overlap, docs.chunk_size
            ));
        }
        if docs.top_k == 0 {
            return fail("documentation.top_k must be positive".to_string());
        }
        if docs.cache_field.trim().is_empty() {
            return fail("documentation.cache_field must not be empty".to_string());
        }

        if self.fetch.timeout_secs == 0 {
            return fail("fetch.timeout_secs must be positive".to_string());
        }

        let agents = &self.agents;
        if agents.router_max_steps == 0 || agents.todo_max_steps == 0 || agents.default_max_steps == 0 {
            return fail("agents.*_max_steps must be positive".to_string());
        }

        Ok(())
    }
}
