//! Whitespace normalization for converted documents.

use quill_contracts::document::Document;

/// Drops empty lines and collapses runs of whitespace inside each line to a
/// single space. Line structure is otherwise kept, so markdown headings and
/// list items survive.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCleaner;

impl DocumentCleaner {
    pub fn new() -> Self {
        Self
    }

    /// Return a cleaned copy with a fresh id. Metadata is kept.
    pub fn clean(&self, document: &Document) -> Document {
        let content = document
            .content
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        Document::new(content, document.meta.clone())
    }

    pub fn clean_all(&self, documents: &[Document]) -> Vec<Document> {
        documents.iter().map(|d| self.clean(d)).collect()
    }
}
