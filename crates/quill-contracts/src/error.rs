//! Error types for the Quill orchestration pipeline.
//!
//! All fallible operations return `QuillResult<T>`. Which variants may reach
//! the top-level caller is decided by the agent loop: tool-local failures are
//! turned into tool-result messages, generator and configuration failures
//! propagate.

use thiserror::Error;

/// The unified error type for Quill.
#[derive(Debug, Error)]
pub enum QuillError {
    /// The chat backend was unreachable, timed out, or returned garbage.
    ///
    /// Fatal: aborts the agent loop that issued the call.
    #[error("generation failed: {reason}")]
    GenerationFailure { reason: String },

    /// Tool arguments did not match the tool's parameter schema.
    #[error("invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The tool ran but its own logic failed.
    #[error("tool '{tool}' failed: {reason}")]
    ToolExecutionFailure { tool: String, reason: String },

    /// The model asked for a tool that is not registered.
    #[error("unknown tool '{name}'")]
    UnknownTool { name: String },

    /// A single source could not be fetched. Never aborts an ingestion run.
    #[error("failed to fetch '{url}': {reason}")]
    FetchFailure { url: String, reason: String },

    /// A named resource (e.g. a skill bundle) already exists.
    #[error("resource '{name}' already exists")]
    DuplicateResource { name: String },

    /// The embedding backend failed.
    #[error("embedding failed: {reason}")]
    EmbeddingFailure { reason: String },

    /// The document store rejected an operation or is unreachable.
    #[error("document store error: {reason}")]
    StoreFailure { reason: String },

    /// A state write violated the declared state schema.
    #[error("state schema error: {reason}")]
    StateSchema { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A pipeline component exceeded its run allowance, or a pipeline was
    /// entered while already running.
    #[error("run limit exceeded for '{component}'")]
    RunLimitExceeded { component: String },

    /// A JSON Schema document could not be compiled.
    #[error("schema validation error: {reason}")]
    SchemaValidation { reason: String },
}

/// Convenience alias used throughout the Quill crates.
pub type QuillResult<T> = Result<T, QuillError>;
