//! Ollama clients: chat generation (`/api/chat`) and embeddings
//! (`/api/embeddings`).
//!
//! Both are blocking. A request that times out or returns a non-success
//! status is reported once; nothing here retries.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use quill_contracts::{
    error::{QuillError, QuillResult},
    generation::GenerationOptions,
    message::{Message, Role, ToolCall},
    tool::ToolSpec,
};
use quill_core::traits::{ChatGenerator, Embedder};

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    stream: bool,
    options: WireOptions,
}

#[derive(Debug, Serialize)]
struct WireOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct WireToolCall {
    function: WireCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct WireCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: WireMessage,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
        Role::System => "system",
    }
}

fn to_wire(message: &Message) -> WireMessage {
    WireMessage {
        role: role_name(message.role).to_string(),
        content: message.text.clone(),
        tool_calls: message
            .tool_calls
            .iter()
            .map(|call| WireToolCall {
                function: WireCall {
                    name: call.tool_name.clone(),
                    arguments: call.arguments.clone(),
                },
            })
            .collect(),
        tool_name: message
            .tool_result
            .as_ref()
            .map(|r| r.origin.tool_name.clone()),
    }
}

/// Ollama does not assign call ids, so each call gets a fresh one. Some
/// models send arguments as a JSON string instead of an object.
fn from_wire(message: WireMessage) -> Message {
    let calls: Vec<ToolCall> = message
        .tool_calls
        .into_iter()
        .map(|call| {
            let arguments = match call.function.arguments {
                Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
                Value::Null => Value::Object(Default::default()),
                other => other,
            };
            ToolCall {
                id: format!("call_{}", uuid::Uuid::new_v4().simple()),
                tool_name: call.function.name,
                arguments,
            }
        })
        .collect();

    if calls.is_empty() {
        Message::from_assistant(message.content)
    } else {
        Message::with_tool_calls(message.content, calls)
    }
}

fn build_client(timeout: Duration) -> QuillResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| QuillError::ConfigError {
            reason: format!("failed to build HTTP client: {e}"),
        })
}

/// Read a non-success body for the error message.
fn error_body(response: reqwest::blocking::Response) -> String {
    let status = response.status();
    let text = response.text().unwrap_or_else(|_| "unknown error".to_string());
    format!("HTTP {}: {}", status.as_u16(), text)
}

// ── Chat generator ────────────────────────────────────────────────────────────

/// A `ChatGenerator` backed by a local Ollama server.
pub struct OllamaChatGenerator {
    client: Client,
    base_url: String,
    options: GenerationOptions,
}

impl OllamaChatGenerator {
    /// `base_url` is the server root, e.g. `http://localhost:11434`.
    pub fn new(base_url: impl Into<String>, options: GenerationOptions) -> QuillResult<Self> {
        Ok(Self {
            client: build_client(options.timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            options,
        })
    }

    fn request_failed(&self, e: reqwest::Error) -> QuillError {
        let reason = if e.is_timeout() {
            format!(
                "model '{}' timed out after {}s",
                self.options.model,
                self.options.timeout.as_secs()
            )
        } else {
            format!("model '{}' request failed: {e}", self.options.model)
        };
        QuillError::GenerationFailure { reason }
    }
}

impl ChatGenerator for OllamaChatGenerator {
    fn generate(&self, messages: &[Message], tools: &[ToolSpec]) -> QuillResult<Vec<Message>> {
        let request = ChatRequest {
            model: &self.options.model,
            messages: messages.iter().map(to_wire).collect(),
            tools: tools
                .iter()
                .map(|spec| WireTool {
                    kind: "function",
                    function: WireFunction {
                        name: &spec.name,
                        description: &spec.description,
                        parameters: &spec.parameters,
                    },
                })
                .collect(),
            stream: false,
            options: WireOptions {
                temperature: self.options.temperature,
            },
        };

        debug!(
            model = %self.options.model,
            messages = messages.len(),
            tools = tools.len(),
            "calling ollama chat"
        );

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .map_err(|e| self.request_failed(e))?;

        if !response.status().is_success() {
            return Err(QuillError::GenerationFailure {
                reason: error_body(response),
            });
        }

        let body: ChatResponse = response.json().map_err(|e| QuillError::GenerationFailure {
            reason: format!("failed to parse chat response: {e}"),
        })?;

        Ok(vec![from_wire(body.message)])
    }

    fn options(&self) -> &GenerationOptions {
        &self.options
    }
}

impl std::fmt::Debug for OllamaChatGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaChatGenerator")
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .finish()
    }
}

// ── Embedder ──────────────────────────────────────────────────────────────────

/// An `Embedder` backed by a local Ollama server.
pub struct OllamaEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
}

impl OllamaEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
        timeout: Duration,
    ) -> QuillResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimension,
        })
    }
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, text: &str) -> QuillResult<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .map_err(|e| QuillError::EmbeddingFailure {
                reason: format!("HTTP request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(QuillError::EmbeddingFailure {
                reason: error_body(response),
            });
        }

        let body: EmbeddingResponse = response.json().map_err(|e| QuillError::EmbeddingFailure {
            reason: format!("failed to parse embedding response: {e}"),
        })?;
        Ok(body.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for OllamaEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaEmbedder")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use quill_contracts::{
        error::QuillError,
        generation::GenerationOptions,
        message::{Message, Role, ToolCall},
    };
    use quill_core::traits::{ChatGenerator, Embedder};

    use super::*;

    // ── Wire conversion ──────────────────────────────────────────────────────

    #[test]
    fn assistant_tool_calls_are_sent_as_functions() {
        let message = Message::with_tool_calls(
            "",
            vec![ToolCall {
                id: "call_1".to_string(),
                tool_name: "todo_tool".to_string(),
                arguments: json!({ "query": "list items" }),
            }],
        );
        let wire = serde_json::to_value(to_wire(&message)).unwrap();

        assert_eq!(wire["role"], "assistant");
        assert_eq!(wire["tool_calls"][0]["function"]["name"], "todo_tool");
        assert_eq!(wire["tool_calls"][0]["function"]["arguments"]["query"], "list items");
    }

    #[test]
    fn tool_results_carry_the_tool_name() {
        let call = ToolCall {
            id: "call_1".to_string(),
            tool_name: "write_todo".to_string(),
            arguments: json!({}),
        };
        let wire = to_wire(&Message::from_tool("results/x/TODO.md", call, false));

        assert_eq!(wire.role, "tool");
        assert_eq!(wire.content, "results/x/TODO.md");
        assert_eq!(wire.tool_name.as_deref(), Some("write_todo"));
    }

    #[test]
    fn reply_without_calls_is_plain_assistant_text() {
        let body: ChatResponse = serde_json::from_value(json!({
            "model": "qwen3:8b",
            "message": { "role": "assistant", "content": "done" },
            "done": true
        }))
        .unwrap();
        let message = from_wire(body.message);

        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.text, "done");
        assert!(!message.has_tool_calls());
    }

    #[test]
    fn reply_tool_calls_get_ids_and_parsed_arguments() {
        let body: ChatResponse = serde_json::from_value(json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    { "function": { "name": "documentation_tool", "arguments": { "query": "signals" } } },
                    { "function": { "name": "todo_tool", "arguments": "{\"query\":\"steps\"}" } }
                ]
            }
        }))
        .unwrap();
        let message = from_wire(body.message);

        assert_eq!(message.tool_calls.len(), 2);
        assert_eq!(message.tool_calls[0].arguments["query"], "signals");
        assert_eq!(message.tool_calls[1].arguments["query"], "steps");
        assert!(message.tool_calls[0].id.starts_with("call_"));
        assert_ne!(message.tool_calls[0].id, message.tool_calls[1].id);
    }

    // ── Backend failures ─────────────────────────────────────────────────────

    #[test]
    fn unreachable_server_is_a_generation_failure() {
        let generator = OllamaChatGenerator::new(
            "http://127.0.0.1:9/",
            GenerationOptions::new("qwen3:8b", 0.1, Duration::from_secs(2)),
        )
        .unwrap();

        let result = generator.generate(&[Message::from_user("hi")], &[]);
        assert!(matches!(result, Err(QuillError::GenerationFailure { .. })));
    }

    #[test]
    fn unreachable_server_is_an_embedding_failure() {
        let embedder =
            OllamaEmbedder::new("http://127.0.0.1:9", "nomic-embed-text", 768, Duration::from_secs(2)).unwrap();

        assert_eq!(embedder.dimension(), 768);
        assert!(matches!(embedder.embed("hi"), Err(QuillError::EmbeddingFailure { .. })));
    }
}
