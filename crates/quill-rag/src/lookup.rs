//! Documentation lookup: ingest the configured sources, then retrieve.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use quill_contracts::{
    document::Document,
    error::{QuillError, QuillResult},
};
use quill_core::component::{Component, InputPort, PortValues};

use crate::{ingest::IngestionPipeline, retrieve::Retriever};

pub const QUERY_PORT: &str = "query";
pub const DOCUMENTATION_PORT: &str = "relevant_documentation";

pub struct DocumentationLookup {
    sources: Vec<String>,
    ingestion: IngestionPipeline,
    retriever: Retriever,
}

impl DocumentationLookup {
    pub fn new(sources: Vec<String>, ingestion: IngestionPipeline, retriever: Retriever) -> Self {
        Self {
            sources,
            ingestion,
            retriever,
        }
    }

    /// Make sure every source is indexed, then return the chunks closest to
    /// `query`, best first, without their embeddings.
    pub fn lookup(&self, query: &str) -> QuillResult<Vec<Document>> {
        let report = self.ingestion.run(&self.sources)?;
        let hits = self.retriever.retrieve(query)?;

        info!(
            sources = self.sources.len(),
            newly_indexed = report.fetched.len(),
            failed = report.failed.len(),
            hits = hits.len(),
            "documentation lookup complete"
        );

        Ok(hits
            .into_iter()
            .map(|hit| Document {
                embedding: None,
                ..hit.document
            })
            .collect())
    }
}

/// `DocumentationLookup` as a pipeline step: `query` in,
/// `relevant_documentation` (a document list) out.
pub struct DocumentationComponent {
    lookup: Arc<DocumentationLookup>,
}

impl DocumentationComponent {
    pub fn new(lookup: Arc<DocumentationLookup>) -> Self {
        Self { lookup }
    }
}

impl Component for DocumentationComponent {
    fn input_ports(&self) -> Vec<InputPort> {
        vec![InputPort::required(QUERY_PORT)]
    }

    fn output_ports(&self) -> Vec<String> {
        vec![DOCUMENTATION_PORT.to_string()]
    }

    fn run(&self, inputs: PortValues) -> QuillResult<PortValues> {
        let query = inputs
            .get(QUERY_PORT)
            .and_then(Value::as_str)
            .ok_or_else(|| QuillError::ToolExecutionFailure {
                tool: "documentation".to_string(),
                reason: "input 'query' must be a string".to_string(),
            })?;

        let documents = self.lookup.lookup(query)?;
        let encoded = serde_json::to_value(documents).map_err(|e| QuillError::StoreFailure {
            reason: format!("documents are not serializable: {e}"),
        })?;

        let mut outputs = PortValues::new();
        outputs.insert(DOCUMENTATION_PORT.to_string(), encoded);
        Ok(outputs)
    }
}
