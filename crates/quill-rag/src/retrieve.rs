//! Query-time nearest-neighbour retrieval.

use std::sync::Arc;

use tracing::debug;

use quill_contracts::{
    document::ScoredDocument,
    error::{QuillError, QuillResult},
};
use quill_core::traits::{DocumentStore, Embedder};

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DocumentStore>,
    top_k: usize,
}

impl Retriever {
    /// The embedder must be the one (or the same model as the one) used at
    /// ingestion time.
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn DocumentStore>, top_k: usize) -> QuillResult<Self> {
        if top_k == 0 {
            return Err(QuillError::ConfigError {
                reason: "retriever top_k must be positive".to_string(),
            });
        }
        Ok(Self { embedder, store, top_k })
    }

    /// The `top_k` stored chunks closest to `query`, best first. An empty
    /// store returns an empty list without embedding the query.
    pub fn retrieve(&self, query: &str) -> QuillResult<Vec<ScoredDocument>> {
        if self.store.count()? == 0 {
            debug!("document store is empty, nothing to retrieve");
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed(query)?;
        let hits = self.store.search(&embedding, self.top_k)?;
        debug!(
            model = %self.embedder.model_id(),
            hits = hits.len(),
            best = hits.first().map(|h| h.score).unwrap_or_default(),
            "retrieval complete"
        );
        Ok(hits)
    }
}
