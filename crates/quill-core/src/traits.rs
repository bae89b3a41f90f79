//! Core trait definitions for the Quill orchestrator.
//!
//! These traits are the seams between the orchestration core and its
//! collaborators:
//!
//! - `ChatGenerator`: the model backend (opaque network boundary)
//! - `Embedder`: text → fixed-dimension vector
//! - `DocumentStore`: persisted chunks, existence checks, vector search
//! - `ContentFetcher`: remote bytes for documentation sources
//! - `ArgumentValidator`: tool argument schema checks
//! - `TraceWriter`: append-only record of agent loop phases
//!
//! The agent loop and pipelines only ever talk to these traits; concrete
//! backends live in the outer crates.

use quill_contracts::{
    document::{ByteStream, Document, ScoredDocument},
    error::QuillResult,
    execution::StepRecord,
    generation::GenerationOptions,
    message::{Message, RunId},
    tool::{ToolSpec, ValidationReport},
};

/// A chat-completion backend.
///
/// Options are fixed per instance. Implementations must not retry on their
/// own; a timeout or backend error is returned as `GenerationFailure`.
pub trait ChatGenerator: Send + Sync {
    /// Produce the next message(s) for `messages`, offering `tools`.
    ///
    /// The returned messages are appended to the history by the caller.
    /// An assistant message with `tool_calls` requests tool invocations.
    fn generate(&self, messages: &[Message], tools: &[ToolSpec]) -> QuillResult<Vec<Message>>;

    /// The options this generator was built with.
    fn options(&self) -> &GenerationOptions;
}

/// An embedding backend. The same instance (or at least the same model) must
/// embed both documents and queries.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> QuillResult<Vec<f32>>;

    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    fn model_id(&self) -> &str;
}

/// Persistent storage for embedded documents.
pub trait DocumentStore: Send + Sync {
    /// Return every stored document whose string metadata `field` equals one
    /// of `values`, in insertion order.
    fn filter_by_meta(&self, field: &str, values: &[String]) -> QuillResult<Vec<Document>>;

    /// Persist `documents`, returning how many were actually added.
    ///
    /// Implementations that report `deduplicates_writes() == true` must skip
    /// documents whose id is already stored.
    fn write(&self, documents: Vec<Document>) -> QuillResult<usize>;

    /// Cosine nearest-neighbour search. Ties keep insertion order.
    fn search(&self, embedding: &[f32], top_k: usize) -> QuillResult<Vec<ScoredDocument>>;

    fn count(&self) -> QuillResult<usize>;

    /// True if `write` is idempotent per document id.
    fn deduplicates_writes(&self) -> bool;
}

/// The per-URL result of a fetch.
#[derive(Debug)]
pub struct FetchOutcome {
    pub url: String,
    pub result: QuillResult<ByteStream>,
}

/// Retrieves raw bytes for a list of URLs.
///
/// A failing URL never fails the whole call; it is reported in its own
/// `FetchOutcome` and the others are still fetched.
pub trait ContentFetcher: Send + Sync {
    fn fetch(&self, urls: &[String]) -> Vec<FetchOutcome>;
}

/// Validates tool arguments against the tool's parameter schema.
pub trait ArgumentValidator: Send + Sync {
    /// Return a report with `passed = false` and populated failures when the
    /// arguments do not satisfy `tool.parameters`.
    ///
    /// `Err` is reserved for a schema document that cannot be compiled.
    fn validate(&self, tool: &ToolSpec, arguments: &serde_json::Value) -> QuillResult<ValidationReport>;
}

/// The run trace: an append-only sink for agent loop phase records.
///
/// Write failures are logged by the loop and never abort a run.
pub trait TraceWriter: Send + Sync {
    fn write(&self, record: &StepRecord) -> QuillResult<()>;

    /// Mark a run as finished.
    fn finalize(&self, run_id: &RunId) -> QuillResult<()>;
}
