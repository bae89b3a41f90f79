//! # quill-config
//!
//! TOML configuration for the Quill orchestrator.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use quill_config::QuillConfig;
//!
//! let config = QuillConfig::from_file(Path::new("quill.toml"))?;
//! let thinking = config.generators.thinking.options();
//! ```
//!
//! Every section is optional. Missing fields take the defaults documented on
//! each settings struct.

pub mod loader;
pub mod settings;

pub use settings::{
    AgentsConfig, DocumentationConfig, EmbedderConfig, FetchConfig, GeneratorConfig, GeneratorsConfig,
    OutputConfig, QuillConfig, SkillsConfig,
};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;

    use quill_contracts::error::QuillError;

    use crate::QuillConfig;

    fn expect_config_error(result: Result<QuillConfig, QuillError>, needle: &str) {
        match result {
            Err(QuillError::ConfigError { reason }) => {
                assert!(reason.contains(needle), "expected '{needle}' in: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn empty_document_yields_defaults() {
        let config = QuillConfig::from_toml_str("").unwrap();

        assert_eq!(config, QuillConfig::default());
        assert_eq!(config.generators.thinking.temperature, 0.1);
        assert_eq!(config.generators.coder.temperature, 0.5);
        assert_eq!(config.generators.thinking.options().timeout, Duration::from_secs(3600));
        assert_eq!(config.embedder.model, "nomic-embed-text");
        assert_eq!(config.embedder.dimension, 768);
        assert_eq!(config.documentation.chunk_size, 250);
        assert_eq!(config.documentation.chunk_overlap, 30);
        assert_eq!(config.documentation.top_k, 2);
        assert_eq!(config.documentation.cache_field, "url");
        assert_eq!(config.fetch.timeout(), Duration::from_secs(3));
        assert_eq!(config.fetch.retry_attempts, 2);
        assert_eq!(config.agents.router_max_steps, 12);
        assert_eq!(config.agents.todo_max_steps, 10);
        assert_eq!(config.skills.definition_sources.len(), 2);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let toml = r#"
            [documentation]
            top_k = 5
            store_path = "/tmp/quill-docs.json"

            [generators.coder]
            model = "codellama:13b"
            temperature = 0.5
        "#;

        let config = QuillConfig::from_toml_str(toml).unwrap();

        assert_eq!(config.documentation.top_k, 5);
        assert_eq!(config.documentation.chunk_size, 250);
        assert_eq!(config.documentation.store_path, Some(PathBuf::from("/tmp/quill-docs.json")));
        assert_eq!(config.generators.coder.model, "codellama:13b");
        assert_eq!(config.generators.thinking.model, "qwen3:8b");
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let toml = r#"
            [documentation]
            chunk_size = 30
            chunk_overlap = 30
        "#;
        expect_config_error(QuillConfig::from_toml_str(toml), "chunk_overlap");
    }

    #[test]
    fn zero_top_k_is_rejected() {
        expect_config_error(QuillConfig::from_toml_str("[documentation]\ntop_k = 0"), "top_k");
    }

    #[test]
    fn empty_model_is_rejected() {
        expect_config_error(
            QuillConfig::from_toml_str("[generators.thinking]\nmodel = \"  \""),
            "generators.thinking.model",
        );
    }

    #[test]
    fn zero_step_budget_is_rejected() {
        expect_config_error(QuillConfig::from_toml_str("[agents]\nrouter_max_steps = 0"), "max_steps");
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn malformed_toml_is_a_config_error() {
        expect_config_error(QuillConfig::from_toml_str("this is not valid toml ][[["), "failed to parse config TOML");
    }

    #[test]
    fn unreadable_file_is_a_config_error() {
        expect_config_error(
            QuillConfig::from_file(std::path::Path::new("/nonexistent/quill.toml")),
            "failed to read config file",
        );
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agents]\nrouter_max_steps = 4").unwrap();

        let config = QuillConfig::from_file(file.path()).unwrap();
        assert_eq!(config.agents.router_max_steps, 4);
    }
}
