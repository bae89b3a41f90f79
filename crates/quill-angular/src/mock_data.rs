//! Offline stand-ins for the Ollama and HTTP backends.
//!
//! Nothing here talks to the network: generators replay a script, the
//! embedder counts letters and the fetcher serves fixed bodies.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use quill_config::QuillConfig;
use quill_contracts::{
    document::ByteStream,
    error::{QuillError, QuillResult},
    generation::GenerationOptions,
    message::{Message, ToolCall},
    tool::ToolSpec,
};
use quill_core::traits::{ChatGenerator, ContentFetcher, Embedder, FetchOutcome};
use quill_rag::{DocumentSplitter, DocumentationLookup, InMemoryDocumentStore, IngestionPipeline, Retriever};
use quill_trace::InMemoryTraceWriter;

use crate::agents::AgentServices;

pub const CORPUS_URL: &str = "https://angular.dev/assets/context/llms-full.txt";
pub const DEFINITION_URL: &str = "https://agentskills.io/specification";

pub const CORPUS: &str = "# Angular\n\nSignals hold reactive state.\n\nComponents render templates.\n";

pub const ANGULAR_SKILL: &str =
    "---\nname: angular\ndescription: Build Angular components\n---\n\n# Angular\n\nUse standalone components.\n";

// ── Generator ─────────────────────────────────────────────────────────────────

/// Replays scripted replies in order and records every history it was
/// given. Running past the end of the script is a `GenerationFailure`.
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Message>>,
    seen: Mutex<Vec<Vec<Message>>>,
    options: GenerationOptions,
}

impl ScriptedGenerator {
    pub fn new(script: Vec<Message>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
            options: GenerationOptions::new("scripted", 0.0, Duration::from_secs(1)),
        })
    }

    /// Every history passed to `generate`, oldest call first.
    pub fn seen(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl ChatGenerator for ScriptedGenerator {
    fn generate(&self, messages: &[Message], _tools: &[ToolSpec]) -> QuillResult<Vec<Message>> {
        self.seen.lock().unwrap().push(messages.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .map(|reply| vec![reply])
            .ok_or_else(|| QuillError::GenerationFailure {
                reason: "script exhausted".to_string(),
            })
    }

    fn options(&self) -> &GenerationOptions {
        &self.options
    }
}

/// An assistant turn calling one tool.
pub fn call(tool: &str, arguments: Value) -> Message {
    Message::with_tool_calls(
        "",
        vec![ToolCall {
            id: format!("call-{tool}"),
            tool_name: tool.to_string(),
            arguments,
        }],
    )
}

// ── Embedder ──────────────────────────────────────────────────────────────────

/// One dimension per ASCII letter.
pub struct LetterEmbedder;

impl Embedder for LetterEmbedder {
    fn embed(&self, text: &str) -> QuillResult<Vec<f32>> {
        let mut vector = vec![0.0f32; 26];
        for byte in text.to_ascii_lowercase().bytes().filter(u8::is_ascii_lowercase) {
            vector[(byte - b'a') as usize] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        26
    }

    fn model_id(&self) -> &str {
        "letters"
    }
}

// ── Fetcher ───────────────────────────────────────────────────────────────────

/// Serves fixed bodies; any other URL fails.
pub struct StaticFetcher {
    pages: HashMap<String, (String, &'static str)>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self { pages: HashMap::new() }
    }

    pub fn with_page(mut self, url: &str, body: &str, mime: &'static str) -> Self {
        self.pages.insert(url.to_string(), (body.to_string(), mime));
        self
    }
}

impl ContentFetcher for StaticFetcher {
    fn fetch(&self, urls: &[String]) -> Vec<FetchOutcome> {
        urls.iter()
            .map(|url| FetchOutcome {
                url: url.clone(),
                result: self
                    .pages
                    .get(url)
                    .map(|(body, mime)| ByteStream::new(url.clone(), body.clone().into_bytes(), Some(mime.to_string())))
                    .ok_or_else(|| QuillError::FetchFailure {
                        url: url.clone(),
                        reason: "not found".to_string(),
                    }),
            })
            .collect()
    }
}

// ── Wiring ────────────────────────────────────────────────────────────────────

/// Defaults with every path under `root`, one corpus and one definition
/// page, and no store snapshot.
pub fn config(root: &Path) -> QuillConfig {
    let mut config = QuillConfig::default();
    config.output.result_dir = root.join("results");
    config.skills.skills_dir = root.join("skills");
    config.skills.example_skills_dir = root.join("example_skills");
    config.skills.definition_sources = vec![DEFINITION_URL.to_string()];
    config.documentation.sources = vec![CORPUS_URL.to_string()];
    config.documentation.store_path = None;
    config
}

/// Services over an in-memory store, the letter embedder and `fetcher`.
pub fn services(
    thinking: Arc<ScriptedGenerator>,
    coder: Arc<ScriptedGenerator>,
    fetcher: StaticFetcher,
) -> (AgentServices, Arc<InMemoryTraceWriter>) {
    let fetcher = Arc::new(fetcher);
    let embedder = Arc::new(LetterEmbedder);
    let store = Arc::new(InMemoryDocumentStore::new());
    let ingestion = IngestionPipeline::new(
        store.clone(),
        fetcher.clone(),
        embedder.clone(),
        "url",
        DocumentSplitter::new(20, 5).unwrap(),
    )
    .unwrap();
    let retriever = Retriever::new(embedder, store, 2).unwrap();
    let trace = Arc::new(InMemoryTraceWriter::new("test"));

    let services = AgentServices {
        thinking,
        coder,
        documentation: Arc::new(DocumentationLookup::new(vec![CORPUS_URL.to_string()], ingestion, retriever)),
        fetcher,
        validator: Arc::new(crate::tools::argument_validator()),
        trace: trace.clone(),
    };
    (services, trace)
}
