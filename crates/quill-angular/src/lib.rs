//! # quill-angular
//!
//! Angular code-generation agents built on the Quill runtime.
//!
//! A request goes to the router agent, which gathers documentation, creates
//! skills, writes a TODO list and, when asked, code. The crate provides:
//!
//! - [`ollama`]: chat and embedding clients for a local Ollama server
//! - [`fetch`]: the retrying HTTP fetcher for documentation sources
//! - [`tools`]: the filesystem tools (`write_todo`, `write_skill`, ...)
//! - [`agents`]: the router and its four pipeline tools
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quill_angular::Quill;
//! use quill_config::QuillConfig;
//!
//! let quill = Quill::from_config(&QuillConfig::default())?;
//! let output = quill.run("Generate a list component")?;
//! println!("{}", output.answer);
//! ```

use std::sync::Arc;

use tracing::info;

use quill_config::QuillConfig;
use quill_contracts::error::QuillResult;
use quill_core::{
    orchestrator::{Orchestrator, OrchestratorOutput},
    traits::DocumentStore,
};
use quill_rag::{DocumentSplitter, DocumentationLookup, InMemoryDocumentStore, IngestionPipeline, Retriever};
use quill_trace::InMemoryTraceWriter;

pub mod agents;
pub mod fetch;
pub mod ollama;
pub mod tools;

#[cfg(test)]
mod mock_data;

pub use agents::{prompts::SAMPLE_REQUEST, router::router_agent, AgentServices};

use fetch::{HttpFetcher, RetryPolicy};
use ollama::{OllamaChatGenerator, OllamaEmbedder};

/// Build the Ollama, fetch, store and trace backends a configuration names.
pub fn services_from_config(config: &QuillConfig, trace: Arc<InMemoryTraceWriter>) -> QuillResult<AgentServices> {
    let generators = &config.generators;
    let thinking = Arc::new(OllamaChatGenerator::new(
        generators.thinking.url.clone(),
        generators.thinking.options(),
    )?);
    let coder = Arc::new(OllamaChatGenerator::new(generators.coder.url.clone(), generators.coder.options())?);

    let embedder = Arc::new(OllamaEmbedder::new(
        config.embedder.url.clone(),
        config.embedder.model.clone(),
        config.embedder.dimension,
        std::time::Duration::from_secs(config.embedder.timeout_secs),
    )?);
    let fetcher = Arc::new(HttpFetcher::new(
        config.fetch.timeout(),
        RetryPolicy {
            retry_attempts: config.fetch.retry_attempts,
            ..RetryPolicy::default()
        },
    )?);

    let docs = &config.documentation;
    let store: Arc<dyn DocumentStore> = match &docs.store_path {
        Some(path) => Arc::new(InMemoryDocumentStore::open(path.clone())?),
        None => Arc::new(InMemoryDocumentStore::new()),
    };
    let ingestion = IngestionPipeline::new(
        store.clone(),
        fetcher.clone(),
        embedder.clone(),
        &docs.cache_field,
        DocumentSplitter::new(docs.chunk_size, docs.chunk_overlap)?,
    )?;
    let retriever = Retriever::new(embedder, store, docs.top_k)?;

    Ok(AgentServices {
        thinking,
        coder,
        documentation: Arc::new(DocumentationLookup::new(docs.sources.clone(), ingestion, retriever)),
        fetcher,
        validator: Arc::new(tools::argument_validator()),
        trace,
    })
}

/// The assembled application: the router behind an orchestrator, plus the
/// trace every nested run writes to.
pub struct Quill {
    orchestrator: Orchestrator,
    trace: Arc<InMemoryTraceWriter>,
}

impl Quill {
    /// Validate `config` and wire every agent against live backends.
    pub fn from_config(config: &QuillConfig) -> QuillResult<Self> {
        config.validate()?;
        let trace = Arc::new(InMemoryTraceWriter::new("quill"));
        let services = services_from_config(config, trace.clone())?;
        Self::assemble(config, &services, trace)
    }

    /// Wire the router from already-built services. `trace` should be the
    /// writer inside `services`.
    pub fn assemble(config: &QuillConfig, services: &AgentServices, trace: Arc<InMemoryTraceWriter>) -> QuillResult<Self> {
        let orchestrator = Orchestrator::new(router_agent(config, services)?)?;
        Ok(Self { orchestrator, trace })
    }

    pub fn run(&self, request: &str) -> QuillResult<OrchestratorOutput> {
        let output = self.orchestrator.run(request)?;
        info!(
            iterations = output.iterations,
            truncated = output.truncated,
            trace_events = self.trace.event_count().unwrap_or_default(),
            "request complete"
        );
        Ok(output)
    }

    pub fn trace(&self) -> &InMemoryTraceWriter {
        &self.trace
    }
}
