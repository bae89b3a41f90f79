//! # quill-rag
//!
//! Retrieval-augmented documentation lookup for Quill.
//!
//! ## Overview
//!
//! - [`cache::CacheChecker`] splits source URLs into already-indexed hits and
//!   misses.
//! - [`ingest::IngestionPipeline`] fetches only the misses, then converts,
//!   cleans, splits, embeds and writes them.
//! - [`retrieve::Retriever`] embeds a query and returns the closest chunks.
//! - [`lookup::DocumentationLookup`] runs both on every lookup and is exposed
//!   to pipelines as [`lookup::DocumentationComponent`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quill_rag::{DocumentSplitter, DocumentationLookup, InMemoryDocumentStore, IngestionPipeline, Retriever};
//!
//! let store = Arc::new(InMemoryDocumentStore::open(".quill/documents.json")?);
//! let ingestion = IngestionPipeline::new(store.clone(), fetcher, embedder.clone(), "url", DocumentSplitter::new(250, 30)?)?;
//! let retriever = Retriever::new(embedder, store, 2)?;
//! let lookup = DocumentationLookup::new(sources, ingestion, retriever);
//! let docs = lookup.lookup("signal inputs")?;
//! ```

pub mod cache;
pub mod clean;
pub mod convert;
pub mod ingest;
pub mod lookup;
pub mod retrieve;
pub mod split;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheCheck, CacheChecker};
pub use clean::DocumentCleaner;
pub use convert::DocumentConverter;
pub use ingest::{IngestReport, IngestionPipeline};
pub use lookup::{DocumentationComponent, DocumentationLookup};
pub use retrieve::Retriever;
pub use split::DocumentSplitter;
pub use store::InMemoryDocumentStore;
