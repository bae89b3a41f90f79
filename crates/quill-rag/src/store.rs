//! In-memory document store with optional JSON snapshot.
//!
//! Documents are kept in insertion order behind a `Mutex`. Writes skip ids
//! that are already stored. When a snapshot path is configured the whole
//! store is rewritten to it after every write that added something, and
//! loaded from it on `open`, so the ingestion cache survives restarts.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use quill_contracts::{
    document::{Document, ScoredDocument},
    error::{QuillError, QuillResult},
};
use quill_core::traits::DocumentStore;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    documents: Vec<Document>,
}

#[derive(Default)]
struct Inner {
    documents: Vec<Document>,
    ids: HashSet<String>,
}

#[derive(Default)]
pub struct InMemoryDocumentStore {
    inner: Mutex<Inner>,
    snapshot: Option<PathBuf>,
}

impl InMemoryDocumentStore {
    /// An empty store that lives only as long as the process.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store backed by the snapshot at `path`. A missing file is an empty
    /// store; an unreadable or malformed one is a `StoreFailure`.
    pub fn open(path: impl Into<PathBuf>) -> QuillResult<Self> {
        let path = path.into();
        let mut inner = Inner::default();

        if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| store_error(&path, "read", e))?;
            let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|e| store_error(&path, "parse", e))?;
            if snapshot.version != SNAPSHOT_VERSION {
                return Err(QuillError::StoreFailure {
                    reason: format!(
                        "snapshot '{}' has version {}, expected {}",
                        path.display(),
                        snapshot.version,
                        SNAPSHOT_VERSION
                    ),
                });
            }
            for document in snapshot.documents {
                if inner.ids.insert(document.id.clone()) {
                    inner.documents.push(document);
                }
            }
            info!(path = %path.display(), documents = inner.documents.len(), "document store loaded");
        }

        Ok(Self {
            inner: Mutex::new(inner),
            snapshot: Some(path),
        })
    }

    fn lock(&self) -> QuillResult<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|e| QuillError::StoreFailure {
            reason: format!("document store lock poisoned: {e}"),
        })
    }

    fn persist(&self, documents: &[Document]) -> QuillResult<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| store_error(path, "create directory for", e))?;
        }
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            documents: documents.to_vec(),
        };
        let json = serde_json::to_string(&snapshot).map_err(|e| store_error(path, "serialize", e))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| store_error(&tmp, "write", e))?;
        fs::rename(&tmp, path).map_err(|e| store_error(path, "replace", e))?;
        debug!(path = %path.display(), documents = documents.len(), "snapshot written");
        Ok(())
    }
}

fn store_error(path: &Path, action: &str, e: impl std::fmt::Display) -> QuillError {
    QuillError::StoreFailure {
        reason: format!("failed to {action} snapshot '{}': {e}", path.display()),
    }
}

/// Cosine similarity; zero when either vector has no length.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot_product = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let norm_a = norm_a.sqrt();
    let norm_b = norm_b.sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot_product / (norm_a * norm_b)
}

impl DocumentStore for InMemoryDocumentStore {
    fn filter_by_meta(&self, field: &str, values: &[String]) -> QuillResult<Vec<Document>> {
        let inner = self.lock()?;
        Ok(inner
            .documents
            .iter()
            .filter(|d| d.meta_str(field).map(|v| values.iter().any(|x| x == v)).unwrap_or(false))
            .cloned()
            .collect())
    }

    /// New documents are committed to memory only once the snapshot holding
    /// them has been written.
    fn write(&self, documents: Vec<Document>) -> QuillResult<usize> {
        let mut inner = self.lock()?;
        let mut seen = HashSet::new();
        let fresh: Vec<Document> = documents
            .into_iter()
            .filter(|d| !inner.ids.contains(&d.id) && seen.insert(d.id.clone()))
            .collect();
        let added = fresh.len();

        if added > 0 {
            let mut candidate = inner.documents.clone();
            candidate.extend(fresh);
            self.persist(&candidate)?;
            inner.ids.extend(seen);
            inner.documents = candidate;
        }
        debug!(added, total = inner.documents.len(), "documents written");
        Ok(added)
    }

    /// Scores every embedded document. Documents without an embedding are
    /// skipped; one with a different dimension than the query is a
    /// `StoreFailure`.
    fn search(&self, embedding: &[f32], top_k: usize) -> QuillResult<Vec<ScoredDocument>> {
        let inner = self.lock()?;
        let mut scored = Vec::new();
        for document in &inner.documents {
            let Some(stored) = &document.embedding else {
                continue;
            };
            if stored.len() != embedding.len() {
                return Err(QuillError::StoreFailure {
                    reason: format!(
                        "embedding dimension mismatch: query has {}, document '{}' has {}",
                        embedding.len(),
                        document.id,
                        stored.len()
                    ),
                });
            }
            scored.push(ScoredDocument {
                score: cosine_similarity(embedding, stored),
                document: document.clone(),
            });
        }

        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    fn count(&self) -> QuillResult<usize> {
        Ok(self.lock()?.documents.len())
    }

    fn deduplicates_writes(&self) -> bool {
        true
    }
}
