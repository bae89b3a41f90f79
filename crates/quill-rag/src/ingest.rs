//! Cached ingestion of remote documentation.
//!
//!   cache check → fetch misses → convert → clean → split → embed → write
//!
//! Only cache misses are fetched. When every source is already cached the
//! fetcher, embedder and store writer are never called.

use std::sync::Arc;

use tracing::{debug, info, warn};

use quill_contracts::{
    document::Document,
    error::{QuillError, QuillResult},
};
use quill_core::traits::{ContentFetcher, DocumentStore, Embedder};

use crate::{
    cache::CacheChecker,
    clean::DocumentCleaner,
    convert::DocumentConverter,
    split::DocumentSplitter,
};

/// What one ingestion run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Sources already in the store.
    pub skipped: Vec<String>,
    /// Sources fetched and indexed in this run.
    pub fetched: Vec<String>,
    /// Sources whose fetch failed; they stay misses for the next run.
    pub failed: Vec<String>,
    pub chunks_written: usize,
}

pub struct IngestionPipeline {
    cache: CacheChecker,
    fetcher: Arc<dyn ContentFetcher>,
    converter: DocumentConverter,
    cleaner: DocumentCleaner,
    splitter: DocumentSplitter,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DocumentStore>,
    source_field: String,
}

impl IngestionPipeline {
    /// Build the pipeline. The cache field doubles as the metadata key the
    /// converter stores source URLs under.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        fetcher: Arc<dyn ContentFetcher>,
        embedder: Arc<dyn Embedder>,
        cache_field: &str,
        splitter: DocumentSplitter,
    ) -> QuillResult<Self> {
        Ok(Self {
            cache: CacheChecker::new(store.clone(), cache_field),
            fetcher,
            converter: DocumentConverter::new(cache_field)?,
            cleaner: DocumentCleaner::new(),
            splitter,
            embedder,
            store,
            source_field: cache_field.to_string(),
        })
    }

    pub fn run(&self, sources: &[String]) -> QuillResult<IngestReport> {
        let check = self.cache.check(sources)?;
        let mut report = IngestReport {
            skipped: check.hits,
            ..IngestReport::default()
        };

        if check.misses.is_empty() {
            debug!(skipped = report.skipped.len(), "all sources cached, nothing to ingest");
            return Ok(report);
        }

        let mut streams = Vec::new();
        for outcome in self.fetcher.fetch(&check.misses) {
            match outcome.result {
                Ok(stream) => {
                    report.fetched.push(outcome.url);
                    streams.push(stream);
                }
                Err(e) => {
                    warn!(url = %outcome.url, error = %e, "source fetch failed, skipping");
                    report.failed.push(outcome.url);
                }
            }
        }

        if streams.is_empty() {
            return Ok(report);
        }

        let converted = self.converter.convert_all(&streams);
        let (cleaned, blank): (Vec<Document>, Vec<Document>) = self
            .cleaner
            .clean_all(&converted)
            .into_iter()
            .partition(|d| !d.content.is_empty());
        let chunks = self.splitter.split_all(&cleaned);

        let mut embedded = chunks
            .into_iter()
            .map(|chunk| self.embed(chunk))
            .collect::<QuillResult<Vec<Document>>>()?;

        // A blank source is stored as one unembedded marker so the cache
        // check counts it as a hit. Search never returns unembedded documents.
        let markers = blank.len();
        for marker in blank {
            warn!(
                url = marker.meta_str(&self.source_field).unwrap_or_default(),
                "source has no text after cleaning, caching it as empty"
            );
            embedded.push(marker);
        }

        report.chunks_written = self.store.write(embedded)?.saturating_sub(markers);

        info!(
            fetched = report.fetched.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            chunks = report.chunks_written,
            "ingestion complete"
        );
        Ok(report)
    }

    fn embed(&self, chunk: Document) -> QuillResult<Document> {
        let embedding = self.embedder.embed(&chunk.content)?;
        if embedding.len() != self.embedder.dimension() {
            return Err(QuillError::EmbeddingFailure {
                reason: format!(
                    "model '{}' returned {} dimensions, expected {}",
                    self.embedder.model_id(),
                    embedding.len(),
                    self.embedder.dimension()
                ),
            });
        }
        Ok(chunk.with_embedding(embedding))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quill_contracts::error::QuillError;
    use quill_core::traits::DocumentStore;

    use crate::{
        split::DocumentSplitter,
        store::InMemoryDocumentStore,
        testing::{CountingEmbedder, CountingFetcher, CountingStore},
    };

    use super::IngestionPipeline;

    const CORPUS: &str = "https://angular.dev/assets/context/llms-full.txt";
    const OTHER: &str = "https://angular.dev/other.txt";

    fn pipeline(
        store: Arc<dyn DocumentStore>,
        fetcher: Arc<CountingFetcher>,
        embedder: Arc<CountingEmbedder>,
    ) -> IngestionPipeline {
        IngestionPipeline::new(store, fetcher, embedder, "url", DocumentSplitter::new(5, 1).unwrap()).unwrap()
    }

    fn sources(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn second_run_is_a_full_cache_hit() {
        let store = Arc::new(CountingStore::new());
        let fetcher = Arc::new(CountingFetcher::new());
        let embedder = Arc::new(CountingEmbedder::new(4));
        let ingestion = pipeline(store.clone(), fetcher.clone(), embedder.clone());

        let first = ingestion.run(&sources(&[CORPUS])).unwrap();
        assert_eq!(first.fetched, sources(&[CORPUS]));
        assert!(first.chunks_written > 0);

        let fetches = fetcher.calls();
        let embeds = embedder.calls();
        let writes = store.writes();

        let second = ingestion.run(&sources(&[CORPUS])).unwrap();
        assert_eq!(second.skipped, sources(&[CORPUS]));
        assert_eq!(second.chunks_written, 0);
        assert_eq!(fetcher.calls(), fetches);
        assert_eq!(embedder.calls(), embeds);
        assert_eq!(store.writes(), writes);
    }

    #[test]
    fn only_the_uncached_source_is_fetched() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let fetcher = Arc::new(CountingFetcher::new());
        let embedder = Arc::new(CountingEmbedder::new(4));
        let ingestion = pipeline(store.clone(), fetcher.clone(), embedder.clone());

        ingestion.run(&sources(&[CORPUS])).unwrap();
        let corpus_chunks = store.filter_by_meta("url", &sources(&[CORPUS])).unwrap();
        let report = ingestion.run(&sources(&[CORPUS, OTHER])).unwrap();

        assert_eq!(report.skipped, sources(&[CORPUS]));
        assert_eq!(report.fetched, sources(&[OTHER]));
        assert_eq!(fetcher.requested(), sources(&[CORPUS, OTHER]));

        assert!(!corpus_chunks.is_empty());
        assert_eq!(store.filter_by_meta("url", &sources(&[CORPUS])).unwrap(), corpus_chunks);
        let other_chunks = store.filter_by_meta("url", &sources(&[OTHER])).unwrap();
        assert_eq!(other_chunks.len(), report.chunks_written);
        assert!(!other_chunks.is_empty());
        assert_eq!(store.count().unwrap(), corpus_chunks.len() + other_chunks.len());
    }

    #[test]
    fn blank_source_is_cached_without_chunks() {
        let store = Arc::new(CountingStore::new());
        let fetcher = Arc::new(CountingFetcher::new().with_blank(&[OTHER]));
        let embedder = Arc::new(CountingEmbedder::new(4));
        let ingestion = pipeline(store.clone(), fetcher.clone(), embedder.clone());

        let first = ingestion.run(&sources(&[OTHER])).unwrap();
        assert_eq!(first.fetched, sources(&[OTHER]));
        assert_eq!(first.chunks_written, 0);
        assert_eq!(embedder.calls(), 0);

        let second = ingestion.run(&sources(&[OTHER])).unwrap();
        assert_eq!(second.skipped, sources(&[OTHER]));
        assert_eq!(fetcher.calls(), 1);
        assert!(store.search(&[1.0, 0.0, 0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn failed_fetch_is_reported_and_retried_next_run() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let fetcher = Arc::new(CountingFetcher::failing(&[OTHER]));
        let embedder = Arc::new(CountingEmbedder::new(4));
        let ingestion = pipeline(store.clone(), fetcher.clone(), embedder);

        let report = ingestion.run(&sources(&[CORPUS, OTHER])).unwrap();
        assert_eq!(report.fetched, sources(&[CORPUS]));
        assert_eq!(report.failed, sources(&[OTHER]));

        let again = ingestion.run(&sources(&[CORPUS, OTHER])).unwrap();
        assert_eq!(again.skipped, sources(&[CORPUS]));
        assert_eq!(again.failed, sources(&[OTHER]));
    }

    #[test]
    fn chunks_are_stored_with_embeddings_and_source() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let ingestion = pipeline(
            store.clone(),
            Arc::new(CountingFetcher::new()),
            Arc::new(CountingEmbedder::new(4)),
        );

        let report = ingestion.run(&sources(&[CORPUS])).unwrap();

        let stored = store.filter_by_meta("url", &sources(&[CORPUS])).unwrap();
        assert_eq!(stored.len(), report.chunks_written);
        assert!(stored.iter().all(|d| d.embedding.as_ref().map(Vec::len) == Some(4)));
    }

    #[test]
    fn wrong_embedding_dimension_is_an_error() {
        let ingestion = IngestionPipeline::new(
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(CountingFetcher::new()),
            Arc::new(CountingEmbedder::lying(4, 3)),
            "url",
            DocumentSplitter::new(5, 1).unwrap(),
        )
        .unwrap();

        assert!(matches!(
            ingestion.run(&sources(&[CORPUS])),
            Err(QuillError::EmbeddingFailure { .. })
        ));
    }
}
