//! Schema-checked agent state.
//!
//! One `State` lives for exactly one agent loop run. Only the loop writes to
//! it; tools hand back updates and the loop merges them.

use std::collections::BTreeMap;

use serde_json::Value;

use quill_contracts::{
    document::Document,
    error::{QuillError, QuillResult},
    message::Message,
    state::{StateSchema, ValueType, MESSAGES_KEY},
};

#[derive(Debug, Clone)]
pub struct State {
    schema: StateSchema,
    values: BTreeMap<String, Value>,
}

impl State {
    /// Create an empty state. Every list key, `messages` included, starts as
    /// an empty list; other keys start unset.
    pub fn new(schema: StateSchema) -> Self {
        let values = schema
            .keys()
            .filter(|key| schema.type_of(key) == Some(ValueType::List))
            .map(|key| (key.to_string(), Value::Array(Vec::new())))
            .collect();
        Self { schema, values }
    }

    /// Create a state and `set` every initial value.
    pub fn with_values(schema: StateSchema, initial: BTreeMap<String, Value>) -> QuillResult<Self> {
        let mut state = Self::new(schema);
        for (key, value) in initial {
            state.set(&key, value)?;
        }
        Ok(state)
    }

    pub fn schema(&self) -> &StateSchema {
        &self.schema
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn into_values(self) -> BTreeMap<String, Value> {
        self.values
    }

    /// Replace the value under `key`.
    pub fn set(&mut self, key: &str, value: Value) -> QuillResult<()> {
        let expected = self.declared_type(key)?;
        if !expected.matches(&value) {
            return Err(QuillError::StateSchema {
                reason: format!("key '{key}' expects {expected:?}, got {}", json_kind(&value)),
            });
        }
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Merge `value` into `key`.
    ///
    /// List keys are extended (a non-array value is appended as one element);
    /// every other key is replaced.
    pub fn merge(&mut self, key: &str, value: Value) -> QuillResult<()> {
        if self.declared_type(key)? != ValueType::List {
            return self.set(key, value);
        }
        let slot = self
            .values
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(existing) = slot {
            match value {
                Value::Array(items) => existing.extend(items),
                other => existing.push(other),
            }
        }
        Ok(())
    }

    /// Append messages to the conversation.
    pub fn push_messages(&mut self, messages: &[Message]) -> QuillResult<()> {
        let encoded = serde_json::to_value(messages).map_err(|e| QuillError::StateSchema {
            reason: format!("messages are not serializable: {e}"),
        })?;
        self.merge(MESSAGES_KEY, encoded)
    }

    pub fn messages(&self) -> QuillResult<Vec<Message>> {
        self.decode_list(MESSAGES_KEY)
    }

    /// Decode a list key holding documents. A key never written yields an
    /// empty list.
    pub fn documents(&self, key: &str) -> QuillResult<Vec<Document>> {
        self.decode_list(key)
    }

    fn decode_list<T: serde::de::DeserializeOwned>(&self, key: &str) -> QuillResult<Vec<T>> {
        match self.values.get(key) {
            None => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| QuillError::StateSchema {
                reason: format!("key '{key}' does not hold the expected items: {e}"),
            }),
        }
    }

    fn declared_type(&self, key: &str) -> QuillResult<ValueType> {
        self.schema.type_of(key).ok_or_else(|| QuillError::StateSchema {
            reason: format!("key '{key}' is not declared in the state schema"),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
