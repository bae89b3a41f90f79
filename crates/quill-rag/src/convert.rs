//! Byte stream → document conversion.
//!
//! Markdown and plain text are kept as they are. HTML is reduced to its
//! visible text: scripts, styles and tags are removed, block-level closers
//! become line breaks and the common entities are decoded.

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use quill_contracts::{
    document::{ByteStream, Document},
    error::{QuillError, QuillResult},
};

pub struct DocumentConverter {
    source_field: String,
    invisible: Regex,
    block_break: Regex,
    tag: Regex,
}

impl DocumentConverter {
    /// `source_field` is the metadata key that receives the stream URL; it
    /// must match the cache field used for cache checks.
    pub fn new(source_field: impl Into<String>) -> QuillResult<Self> {
        Ok(Self {
            source_field: source_field.into(),
            invisible: compile(r"(?is)<(script|style|head|noscript)\b[^>]*>.*?</(script|style|head|noscript)\s*>|<!--.*?-->")?,
            block_break: compile(r"(?i)<br\s*/?>|</(p|div|li|tr|h[1-6]|pre|section|article|blockquote)\s*>")?,
            tag: compile(r"(?s)<[^>]+>")?,
        })
    }

    pub fn convert(&self, stream: &ByteStream) -> Document {
        let raw = String::from_utf8_lossy(&stream.data);
        let html = is_html(stream, &raw);
        let content = if html { self.strip_html(&raw) } else { raw.into_owned() };

        let mut meta = Map::new();
        meta.insert(self.source_field.clone(), Value::String(stream.url.clone()));
        if let Some(mime) = &stream.mime_type {
            meta.insert("mime_type".to_string(), Value::String(mime.clone()));
        }

        debug!(url = %stream.url, html, bytes = stream.data.len(), "converted stream");
        Document::new(content, meta)
    }

    pub fn convert_all(&self, streams: &[ByteStream]) -> Vec<Document> {
        streams.iter().map(|s| self.convert(s)).collect()
    }

    fn strip_html(&self, html: &str) -> String {
        let visible = self.invisible.replace_all(html, "");
        let broken = self.block_break.replace_all(&visible, "\n");
        let text = self.tag.replace_all(&broken, " ");
        decode_entities(&text)
    }
}

fn compile(pattern: &str) -> QuillResult<Regex> {
    Regex::new(pattern).map_err(|e| QuillError::ConfigError {
        reason: format!("converter pattern: {e}"),
    })
}

fn is_html(stream: &ByteStream, raw: &str) -> bool {
    if let Some(mime) = &stream.mime_type {
        return mime.contains("html");
    }
    let head = raw.trim_start();
    let prefix: String = head.chars().take(15).collect::<String>().to_ascii_lowercase();
    prefix.starts_with("<!doctype html") || prefix.starts_with("<html")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use quill_contracts::document::ByteStream;

    use super::DocumentConverter;

    #[test]
    fn markdown_is_kept_verbatim() {
        let converter = DocumentConverter::new("url").unwrap();
        let stream = ByteStream::new(
            "https://angular.dev/llms-full.txt",
            b"# Signals\n\nUse `signal()`.".to_vec(),
            Some("text/plain".to_string()),
        );

        let doc = converter.convert(&stream);

        assert_eq!(doc.content, "# Signals\n\nUse `signal()`.");
        assert_eq!(doc.meta_str("url"), Some("https://angular.dev/llms-full.txt"));
        assert_eq!(doc.meta_str("mime_type"), Some("text/plain"));
    }

    #[test]
    fn html_is_stripped_to_text() {
        let converter = DocumentConverter::new("url").unwrap();
        let html = r#"<html><head><title>x</title><style>p{}</style></head>
<body><h1>What are skills?</h1><script>track()</script><p>A skill is a <b>folder</b> &amp; a file.</p></body></html>"#;
        let stream = ByteStream::new("https://agentskills.io/what-are-skills", html.as_bytes().to_vec(), Some("text/html".to_string()));

        let doc = converter.convert(&stream);

        assert!(doc.content.contains("What are skills?"));
        assert!(doc.content.contains("folder"));
        assert!(doc.content.contains("& a file."));
        assert!(!doc.content.contains('<'));
        assert!(!doc.content.contains("track()"));
        assert!(!doc.content.contains("p{}"));
    }

    #[test]
    fn html_is_sniffed_without_mime_type() {
        let converter = DocumentConverter::new("source").unwrap();
        let stream = ByteStream::new("https://x", b"<!DOCTYPE html><p>hi</p>".to_vec(), None);

        let doc = converter.convert(&stream);

        assert_eq!(doc.content.trim(), "hi");
        assert_eq!(doc.meta_str("source"), Some("https://x"));
    }
}
