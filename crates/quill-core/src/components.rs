//! Reusable pipeline components: prompt templating and a bare generator call.

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use quill_contracts::{
    error::{QuillError, QuillResult},
    message::Message,
    state::MESSAGES_KEY,
};

use crate::{
    component::{Component, InputPort, PortValues},
    traits::ChatGenerator,
};

pub const PROMPT_PORT: &str = "prompt";
pub const REPLIES_PORT: &str = "replies";
pub const TEXT_PORT: &str = "text";

const PLACEHOLDER: &str = r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}";

/// Renders a `{{ variable }}` template.
///
/// Every placeholder becomes an input port. Outputs are `prompt` (the
/// rendered string) and `messages` (the prompt as a single user message).
pub struct PromptBuilder {
    template: String,
    pattern: Regex,
    variables: Vec<String>,
    required: Vec<String>,
}

impl PromptBuilder {
    /// Parse `template`. Every name in `required` must appear in it.
    pub fn new(template: impl Into<String>, required: &[&str]) -> QuillResult<Self> {
        let template = template.into();
        let pattern = Regex::new(PLACEHOLDER).map_err(|e| QuillError::ConfigError {
            reason: format!("placeholder pattern: {e}"),
        })?;

        let mut variables: Vec<String> = Vec::new();
        for captures in pattern.captures_iter(&template) {
            let name = captures[1].to_string();
            if !variables.contains(&name) {
                variables.push(name);
            }
        }

        for name in required {
            if !variables.iter().any(|v| v == name) {
                return Err(QuillError::ConfigError {
                    reason: format!("required variable '{name}' does not appear in the template"),
                });
            }
        }

        Ok(Self {
            template,
            pattern,
            variables,
            required: required.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Placeholder names in order of first appearance.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Render with `values`. Missing optional variables render empty.
    pub fn render(&self, values: &PortValues) -> String {
        self.pattern
            .replace_all(&self.template, |captures: &regex::Captures<'_>| {
                values.get(&captures[1]).map(render_value).unwrap_or_default()
            })
            .into_owned()
    }
}

/// Text form of a template value.
///
/// Documents render as their contents (one per line), message lists as the
/// text of their first message, scalars as themselves and anything else as
/// compact JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(is_message) && !items.is_empty() => items[0]
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Value::Array(items) if items.iter().all(is_document) => items
            .iter()
            .filter_map(|d| d.get("content").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(_) if is_document(value) => value
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        other => other.to_string(),
    }
}

fn is_message(value: &Value) -> bool {
    value.get("role").is_some() && value.get("text").is_some()
}

fn is_document(value: &Value) -> bool {
    value.get("content").map(Value::is_string).unwrap_or(false)
}

impl Component for PromptBuilder {
    fn input_ports(&self) -> Vec<InputPort> {
        self.variables
            .iter()
            .map(|v| {
                if self.required.contains(v) {
                    InputPort::required(v.clone())
                } else {
                    InputPort::optional(v.clone())
                }
            })
            .collect()
    }

    fn output_ports(&self) -> Vec<String> {
        vec![PROMPT_PORT.to_string(), MESSAGES_KEY.to_string()]
    }

    fn run(&self, inputs: PortValues) -> QuillResult<PortValues> {
        let prompt = self.render(&inputs);
        debug!(variables = inputs.len(), length = prompt.len(), "prompt rendered");

        let messages = serde_json::to_value(vec![Message::from_user(prompt.clone())]).map_err(|e| {
            QuillError::StateSchema {
                reason: format!("messages are not serializable: {e}"),
            }
        })?;

        let mut outputs = PortValues::new();
        outputs.insert(PROMPT_PORT.to_string(), Value::String(prompt));
        outputs.insert(MESSAGES_KEY.to_string(), messages);
        Ok(outputs)
    }
}

/// A single generator call with no tools.
///
/// Takes `messages` and/or a `prompt` (appended as a user message); outputs
/// `replies` and the `text` of the last reply.
pub struct GeneratorComponent {
    generator: Arc<dyn ChatGenerator>,
    system_prompt: Option<String>,
}

impl GeneratorComponent {
    pub fn new(generator: Arc<dyn ChatGenerator>) -> Self {
        Self {
            generator,
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

impl Component for GeneratorComponent {
    fn input_ports(&self) -> Vec<InputPort> {
        vec![InputPort::optional(MESSAGES_KEY), InputPort::optional(PROMPT_PORT)]
    }

    fn output_ports(&self) -> Vec<String> {
        vec![REPLIES_PORT.to_string(), TEXT_PORT.to_string()]
    }

    fn run(&self, mut inputs: PortValues) -> QuillResult<PortValues> {
        let mut messages = Vec::new();
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::from_system(prompt.clone()));
        }
        if let Some(value) = inputs.remove(MESSAGES_KEY) {
            let history: Vec<Message> = serde_json::from_value(value).map_err(|e| QuillError::StateSchema {
                reason: format!("input 'messages' is not a message list: {e}"),
            })?;
            messages.extend(history);
        }
        if let Some(prompt) = inputs.remove(PROMPT_PORT) {
            messages.push(Message::from_user(render_value(&prompt)));
        }
        if messages.is_empty() {
            return Err(QuillError::ConfigError {
                reason: "generator component received neither messages nor a prompt".to_string(),
            });
        }

        let options = self.generator.options();
        debug!(model = %options.model, messages = messages.len(), "generator component calling model");
        let replies = self.generator.generate(&messages, &[])?;

        let text = replies.last().map(|m| m.text.clone()).unwrap_or_default();
        let replies = serde_json::to_value(&replies).map_err(|e| QuillError::StateSchema {
            reason: format!("replies are not serializable: {e}"),
        })?;

        let mut outputs = PortValues::new();
        outputs.insert(REPLIES_PORT.to_string(), replies);
        outputs.insert(TEXT_PORT.to_string(), Value::String(text));
        Ok(outputs)
    }
}
