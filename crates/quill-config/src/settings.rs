//! Configuration schema.
//!
//! A `QuillConfig` is deserialized from TOML. Every section and every field
//! has a default, so an empty document is a complete configuration.
//!
//! Example:
//! ```toml
//! [generators.thinking]
//! model = "qwen3:8b"
//! temperature = 0.1
//!
//! [documentation]
//! sources = ["https://angular.dev/assets/context/llms-full.txt"]
//! chunk_size = 250
//! chunk_overlap = 30
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use quill_contracts::generation::GenerationOptions;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuillConfig {
    pub generators: GeneratorsConfig,
    pub embedder: EmbedderConfig,
    pub documentation: DocumentationConfig,
    pub fetch: FetchConfig,
    pub skills: SkillsConfig,
    pub output: OutputConfig,
    pub agents: AgentsConfig,
}

/// The two model roles: `thinking` routes and summarizes, `coder` writes code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorsConfig {
    pub thinking: GeneratorConfig,
    pub coder: GeneratorConfig,
}

impl Default for GeneratorsConfig {
    fn default() -> Self {
        Self {
            thinking: GeneratorConfig {
                model: "qwen3:8b".to_string(),
                temperature: 0.1,
                ..GeneratorConfig::default()
            },
            coder: GeneratorConfig {
                model: "qwen2.5-coder:7b".to_string(),
                temperature: 0.5,
                ..GeneratorConfig::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Ollama base URL.
    pub url: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: "qwen3:8b".to_string(),
            temperature: 0.1,
            timeout_secs: 3600,
            url: "http://localhost:11434".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions::new(
            self.model.clone(),
            self.temperature,
            Duration::from_secs(self.timeout_secs),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    pub url: String,
    pub model: String,
    pub dimension: usize,
    pub timeout_secs: u64,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimension: 768,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentationConfig {
    /// Remote corpora ingested before every lookup.
    pub sources: Vec<String>,
    /// Metadata field holding a chunk's source URL.
    pub cache_field: String,
    /// Words per chunk.
    pub chunk_size: usize,
    /// Words shared by consecutive chunks.
    pub chunk_overlap: usize,
    pub top_k: usize,
    /// JSON snapshot of the document store. `None` keeps it in memory only.
    pub store_path: Option<PathBuf>,
}

impl Default for DocumentationConfig {
    fn default() -> Self {
        Self {
            sources: vec!["https://angular.dev/assets/context/llms-full.txt".to_string()],
            cache_field: "url".to_string(),
            chunk_size: 250,
            chunk_overlap: 30,
            top_k: 2,
            store_path: Some(PathBuf::from(".quill/documents.json")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Extra attempts after the first failure, per URL.
    pub retry_attempts: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 3,
            retry_attempts: 2,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillsConfig {
    /// Where `<name>/SKILL.md` bundles are written and read.
    pub skills_dir: PathBuf,
    /// Reference bundles shown to the skills agent.
    pub example_skills_dir: PathBuf,
    /// Pages describing the skill format, summarized before skill creation.
    pub definition_sources: Vec<String>,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            skills_dir: PathBuf::from("skills"),
            example_skills_dir: PathBuf::from("example_skills"),
            definition_sources: vec![
                "https://agentskills.io/what-are-skills".to_string(),
                "https://agentskills.io/specification".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Each TODO list lands in `<result_dir>/<uuid>/TODO.md`.
    pub result_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            result_dir: PathBuf::from("results"),
        }
    }
}

/// Step budgets, counted in model calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    pub router_max_steps: usize,
    pub todo_max_steps: usize,
    /// Budget for agents without their own setting (skills, coder).
    pub default_max_steps: usize,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            router_max_steps: 12,
            todo_max_steps: 10,
            default_max_steps: 100,
        }
    }
}
