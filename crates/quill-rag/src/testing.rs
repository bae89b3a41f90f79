//! Counting doubles for the ingestion and retrieval tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use quill_contracts::{
    document::{ByteStream, Document, ScoredDocument},
    error::{QuillError, QuillResult},
};
use quill_core::traits::{ContentFetcher, DocumentStore, Embedder, FetchOutcome};

use crate::store::InMemoryDocumentStore;

/// Bag-of-letters embedding: deterministic and similar for similar text.
pub struct CountingEmbedder {
    declared: usize,
    actual: usize,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self::lying(dimension, dimension)
    }

    /// Declares `declared` dimensions but returns `actual`.
    pub fn lying(declared: usize, actual: usize) -> Self {
        Self {
            declared,
            actual,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Embedder for CountingEmbedder {
    fn embed(&self, text: &str) -> QuillResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut vector = vec![0.0f32; self.actual];
        for byte in text.to_lowercase().bytes().filter(u8::is_ascii_alphabetic) {
            vector[(byte - b'a') as usize % self.actual] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.declared
    }

    fn model_id(&self) -> &str {
        "counting"
    }
}

/// Serves a short text for every URL except the ones told to fail or to
/// come back blank.
pub struct CountingFetcher {
    failing: Vec<String>,
    blank: Vec<String>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl CountingFetcher {
    pub fn new() -> Self {
        Self::failing(&[])
    }

    pub fn failing(urls: &[&str]) -> Self {
        Self {
            failing: urls.iter().map(|s| s.to_string()).collect(),
            blank: Vec::new(),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Serve only whitespace for `urls`.
    pub fn with_blank(mut self, urls: &[&str]) -> Self {
        self.blank = urls.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl ContentFetcher for CountingFetcher {
    fn fetch(&self, urls: &[String]) -> Vec<FetchOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().extend(urls.iter().cloned());
        urls.iter()
            .map(|url| {
                let result = if self.failing.contains(url) {
                    Err(QuillError::FetchFailure {
                        url: url.clone(),
                        reason: "connection timed out".to_string(),
                    })
                } else if self.blank.contains(url) {
                    Ok(ByteStream::new(url.clone(), b"  \n\n\t\n".to_vec(), Some("text/plain".to_string())))
                } else {
                    let body = format!(
                        "# Docs from {url}\n\nSignals are reactive values.\nComponents render templates.\n\nServices share state between components."
                    );
                    Ok(ByteStream::new(url.clone(), body.into_bytes(), Some("text/plain".to_string())))
                };
                FetchOutcome { url: url.clone(), result }
            })
            .collect()
    }
}

/// An in-memory store that counts `write` calls.
pub struct CountingStore {
    inner: InMemoryDocumentStore,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryDocumentStore::new(),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl DocumentStore for CountingStore {
    fn filter_by_meta(&self, field: &str, values: &[String]) -> QuillResult<Vec<Document>> {
        self.inner.filter_by_meta(field, values)
    }

    fn write(&self, documents: Vec<Document>) -> QuillResult<usize> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(documents)
    }

    fn search(&self, embedding: &[f32], top_k: usize) -> QuillResult<Vec<ScoredDocument>> {
        self.inner.search(embedding, top_k)
    }

    fn count(&self) -> QuillResult<usize> {
        self.inner.count()
    }

    fn deduplicates_writes(&self) -> bool {
        self.inner.deduplicates_writes()
    }
}

/// Shared handles for a lookup under test.
pub struct Rig {
    pub store: Arc<CountingStore>,
    pub fetcher: Arc<CountingFetcher>,
    pub embedder: Arc<CountingEmbedder>,
}

impl Rig {
    pub fn new() -> Self {
        Self {
            store: Arc::new(CountingStore::new()),
            fetcher: Arc::new(CountingFetcher::new()),
            embedder: Arc::new(CountingEmbedder::new(8)),
        }
    }
}
