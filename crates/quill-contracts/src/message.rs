//! Conversation and identity types.
//!
//! A conversation is an ordered `Vec<Message>`. Messages are never edited in
//! place; every step of an agent run only appends.

use serde::{Deserialize, Serialize};

/// Stable, human-readable name of an agent (e.g. "router", "todo").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Unique identifier for one agent loop run.
///
/// Nested agents get their own run id; every trace record carries one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub uuid::Uuid);

impl RunId {
    /// Create a new, unique run ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
    System,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Backend-assigned call id, echoed back in the matching result.
    pub id: String,
    /// Name of the tool to invoke.
    pub tool_name: String,
    /// Raw JSON arguments, validated against the tool schema before use.
    pub arguments: serde_json::Value,
}

/// The outcome of one `ToolCall`, carried by a `Role::Tool` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub origin: ToolCall,
    pub result: String,
    /// True when `result` describes a failure instead of a tool output.
    pub error: bool,
}

/// One turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolCallResult>,
}

impl Message {
    fn plain(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            tool_calls: Vec::new(),
            tool_result: None,
        }
    }

    pub fn from_user(text: impl Into<String>) -> Self {
        Self::plain(Role::User, text)
    }

    pub fn from_system(text: impl Into<String>) -> Self {
        Self::plain(Role::System, text)
    }

    pub fn from_assistant(text: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, text)
    }

    /// An assistant turn that requests tool invocations.
    pub fn with_tool_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::plain(Role::Assistant, text)
        }
    }

    /// A tool-result turn answering `origin`.
    pub fn from_tool(result: impl Into<String>, origin: ToolCall, error: bool) -> Self {
        let result = result.into();
        Self {
            tool_result: Some(ToolCallResult {
                origin,
                result: result.clone(),
                error,
            }),
            ..Self::plain(Role::Tool, result)
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
