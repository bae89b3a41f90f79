//! Documents flowing through ingestion and retrieval.
//!
//! A `Document` is created by ingestion, persisted by a document store and
//! only ever read afterwards. Its id is derived from its content and metadata
//! so that writing the same chunk twice is detectable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// A unit of indexed text, usually one chunk of a larger source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Lowercase hex SHA-256 of content and metadata.
    pub id: String,
    pub content: String,
    /// Free-form metadata. Ingestion always stores the source URL under the
    /// configured cache field.
    #[serde(default)]
    pub meta: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Document {
    /// Build a document and derive its id.
    pub fn new(content: impl Into<String>, meta: Map<String, Value>) -> Self {
        let content = content.into();
        let id = Self::compute_id(&content, &meta);
        Self {
            id,
            content,
            meta,
            embedding: None,
        }
    }

    /// Hash `content` followed by the canonical JSON of `meta`.
    ///
    /// `serde_json::Map` keeps keys sorted, so equal metadata always hashes
    /// identically.
    pub fn compute_id(content: &str, meta: &Map<String, Value>) -> String {
        let meta_json = Value::Object(meta.clone()).to_string();
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hasher.update([0u8]);
        hasher.update(meta_json.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Read a string metadata field.
    pub fn meta_str(&self, field: &str) -> Option<&str> {
        self.meta.get(field).and_then(Value::as_str)
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// A retrieval hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub score: f32,
}

/// Raw bytes fetched from a remote source, before conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteStream {
    pub url: String,
    pub data: Vec<u8>,
    /// Value of the `Content-Type` header without parameters, if any.
    pub mime_type: Option<String>,
}

impl ByteStream {
    pub fn new(url: impl Into<String>, data: Vec<u8>, mime_type: Option<String>) -> Self {
        Self {
            url: url.into(),
            data,
            mime_type,
        }
    }
}
