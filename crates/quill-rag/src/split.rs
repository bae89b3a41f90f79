//! Word-based document splitting with overlap.
//!
//! The text is cut into word units, each word keeping the whitespace that
//! follows it (the first unit also keeps any leading whitespace), so that
//! concatenating all units gives back the text exactly. Chunks are windows of
//! `length` units advancing by `length - overlap` units.
//!
//! Every chunk records, in its metadata:
//!
//! - `split_id`: position of the chunk in the document
//! - `split_idx_start`: byte offset of the chunk in the source text
//! - `overlap_len`: bytes shared with the previous chunk
//!
//! so that `chunks[0] + Σ chunks[i][overlap_len..]` rebuilds the source.

use serde_json::{json, Value};
use tracing::debug;

use quill_contracts::{
    document::Document,
    error::{QuillError, QuillResult},
};

pub const SPLIT_ID: &str = "split_id";
pub const SPLIT_IDX_START: &str = "split_idx_start";
pub const OVERLAP_LEN: &str = "overlap_len";
pub const SOURCE_ID: &str = "source_id";

#[derive(Debug, Clone)]
pub struct DocumentSplitter {
    length: usize,
    overlap: usize,
}

impl DocumentSplitter {
    /// `length` words per chunk, `overlap` words shared between neighbours.
    ///
    /// Errors with `ConfigError` unless `0 <= overlap < length`.
    pub fn new(length: usize, overlap: usize) -> QuillResult<Self> {
        if length == 0 {
            return Err(QuillError::ConfigError {
                reason: "split length must be positive".to_string(),
            });
        }
        if overlap >= length {
            return Err(QuillError::ConfigError {
                reason: format!("split overlap ({overlap}) must be smaller than split length ({length})"),
            });
        }
        Ok(Self { length, overlap })
    }

    /// Split one document. Chunks inherit the source metadata plus the split
    /// fields and `source_id`. An empty document yields no chunks.
    pub fn split(&self, document: &Document) -> Vec<Document> {
        let text = document.content.as_str();
        let units = word_units(text);
        if units.is_empty() {
            return Vec::new();
        }

        let step = self.length - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut previous_end: Option<usize> = None;

        loop {
            let end = (start + self.length).min(units.len());
            let byte_start = units[start].0;
            let byte_end = units[end - 1].1;

            let overlap_len = match previous_end {
                Some(prev) if prev > start => units[prev - 1].1 - byte_start,
                _ => 0,
            };

            let mut meta = document.meta.clone();
            meta.insert(SPLIT_ID.to_string(), json!(chunks.len()));
            meta.insert(SPLIT_IDX_START.to_string(), json!(byte_start));
            meta.insert(OVERLAP_LEN.to_string(), json!(overlap_len));
            meta.insert(SOURCE_ID.to_string(), Value::String(document.id.clone()));
            chunks.push(Document::new(&text[byte_start..byte_end], meta));

            if end == units.len() {
                break;
            }
            previous_end = Some(end);
            start += step;
        }

        debug!(source = %document.id, units = units.len(), chunks = chunks.len(), "document split");
        chunks
    }

    pub fn split_all(&self, documents: &[Document]) -> Vec<Document> {
        documents.iter().flat_map(|d| self.split(d)).collect()
    }
}

/// Byte ranges of word units covering `text` without gaps.
fn word_units(text: &str) -> Vec<(usize, usize)> {
    let mut units = Vec::new();
    let mut start = 0;
    let mut seen_word = false;
    let mut trailing_space = false;

    for (i, ch) in text.char_indices() {
        if ch.is_whitespace() {
            trailing_space = seen_word;
        } else {
            if trailing_space {
                units.push((start, i));
                start = i;
                trailing_space = false;
            }
            seen_word = true;
        }
    }
    if start < text.len() {
        units.push((start, text.len()));
    }
    units
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};

    use quill_contracts::{document::Document, error::QuillError};

    use super::{word_units, DocumentSplitter, OVERLAP_LEN, SPLIT_ID, SPLIT_IDX_START};

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    fn meta_usize(doc: &Document, key: &str) -> usize {
        doc.meta[key].as_u64().unwrap() as usize
    }

    fn rebuild(chunks: &[Document]) -> String {
        let mut text = String::new();
        for chunk in chunks {
            text.push_str(&chunk.content[meta_usize(chunk, OVERLAP_LEN)..]);
        }
        text
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(matches!(DocumentSplitter::new(0, 0), Err(QuillError::ConfigError { .. })));
        assert!(matches!(DocumentSplitter::new(30, 30), Err(QuillError::ConfigError { .. })));
        assert!(DocumentSplitter::new(250, 30).is_ok());
    }

    #[test]
    fn units_cover_text_exactly() {
        let text = "  lead in\n\nthe  middle \t end ";
        let units = word_units(text);
        let joined: String = units.iter().map(|(s, e)| &text[*s..*e]).collect();
        assert_eq!(joined, text);
        assert_eq!(units.len(), 5);
        assert_eq!(&text[units[0].0..units[0].1], "  lead ");
    }

    #[test]
    fn round_trip_with_overlap() {
        let text = format!("  {}\n\nextra   spacing here ", words(57));
        let mut meta = Map::new();
        meta.insert("url".to_string(), json!("https://a"));
        let doc = Document::new(text.clone(), meta);

        let chunks = DocumentSplitter::new(10, 3).unwrap().split(&doc);

        assert_eq!(rebuild(&chunks), text);
        assert_eq!(meta_usize(&chunks[0], OVERLAP_LEN), 0);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(meta_usize(chunk, SPLIT_ID), i);
            assert_eq!(chunk.meta_str("url"), Some("https://a"));
            let start = meta_usize(chunk, SPLIT_IDX_START);
            assert_eq!(&text[start..start + chunk.content.len()], chunk.content);
        }
    }

    #[test]
    fn window_arithmetic_matches_length_and_overlap() {
        let doc = Document::new(words(10), Map::new());
        let chunks = DocumentSplitter::new(4, 2).unwrap().split(&doc);

        // windows start at words 0, 2, 4, 6; the last one reaches the end
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].content, "w0 w1 w2 w3 ");
        assert_eq!(chunks[1].content, "w2 w3 w4 w5 ");
        assert_eq!(chunks[3].content, "w6 w7 w8 w9");
        assert_eq!(meta_usize(&chunks[1], OVERLAP_LEN), "w2 w3 ".len());
    }

    #[test]
    fn short_document_is_one_chunk() {
        let doc = Document::new("just three words", Map::new());
        let chunks = DocumentSplitter::new(250, 30).unwrap().split(&doc);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "just three words");
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        let doc = Document::new("", Map::new());
        assert!(DocumentSplitter::new(5, 1).unwrap().split(&doc).is_empty());
    }

    #[test]
    fn zero_overlap_chunks_do_not_share_text() {
        let doc = Document::new(words(9), Map::new());
        let chunks = DocumentSplitter::new(3, 0).unwrap().split(&doc);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| meta_usize(c, OVERLAP_LEN) == 0));
        assert_eq!(rebuild(&chunks), words(9));
    }
}
