//! Source-level cache check against the document store.
//!
//! A source URL counts as cached once any stored chunk carries it in the
//! cache field. Ingestion only fetches the misses, so every source is
//! ingested at most once over the store's lifetime.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use quill_contracts::error::{QuillError, QuillResult};
use quill_core::traits::DocumentStore;

/// Candidates split by whether the store already holds them.
///
/// Both lists keep candidate order and contain no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheCheck {
    pub hits: Vec<String>,
    pub misses: Vec<String>,
}

pub struct CacheChecker {
    store: Arc<dyn DocumentStore>,
    cache_field: String,
}

impl CacheChecker {
    pub fn new(store: Arc<dyn DocumentStore>, cache_field: impl Into<String>) -> Self {
        Self {
            store,
            cache_field: cache_field.into(),
        }
    }

    pub fn cache_field(&self) -> &str {
        &self.cache_field
    }

    /// Partition `candidates` into hits and misses.
    ///
    /// When the store cannot be queried, a store that deduplicates its writes
    /// makes the check fail open (everything is a miss); any other store
    /// turns the failure into `StoreFailure`.
    pub fn check(&self, candidates: &[String]) -> QuillResult<CacheCheck> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = candidates
            .iter()
            .filter(|c| seen.insert(c.as_str()))
            .cloned()
            .collect();

        if unique.is_empty() {
            return Ok(CacheCheck::default());
        }

        let stored = match self.store.filter_by_meta(&self.cache_field, &unique) {
            Ok(documents) => documents,
            Err(e) if self.store.deduplicates_writes() => {
                warn!(
                    field = %self.cache_field,
                    error = %e,
                    "cache check failed, treating every source as a miss"
                );
                return Ok(CacheCheck {
                    hits: Vec::new(),
                    misses: unique,
                });
            }
            Err(QuillError::StoreFailure { reason }) => return Err(QuillError::StoreFailure { reason }),
            Err(e) => {
                return Err(QuillError::StoreFailure {
                    reason: format!("cache check on '{}' failed: {e}", self.cache_field),
                })
            }
        };

        let cached: HashSet<&str> = stored
            .iter()
            .filter_map(|d| d.meta_str(&self.cache_field))
            .collect();

        let (hits, misses): (Vec<String>, Vec<String>) =
            unique.into_iter().partition(|c| cached.contains(c.as_str()));

        debug!(hits = hits.len(), misses = misses.len(), "cache check complete");
        Ok(CacheCheck { hits, misses })
    }
}
