//! State schema types.
//!
//! The schema is declared once per agent and fixes which keys its state may
//! hold and the JSON shape of each. `messages` is always declared.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The key under which every agent state keeps its conversation.
pub const MESSAGES_KEY: &str = "messages";

/// The JSON shape a state key accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Bool,
    Integer,
    Number,
    List,
    Object,
    Any,
}

impl ValueType {
    /// Return true if `value` conforms to this type. `null` never conforms
    /// except for `Any`.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueType::String => value.is_string(),
            ValueType::Bool => value.is_boolean(),
            ValueType::Integer => value.is_i64() || value.is_u64(),
            ValueType::Number => value.is_number(),
            ValueType::List => value.is_array(),
            ValueType::Object => value.is_object(),
            ValueType::Any => true,
        }
    }
}

/// Declared keys and their types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSchema {
    fields: BTreeMap<String, ValueType>,
}

impl StateSchema {
    /// A schema holding only `messages`.
    pub fn new() -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(MESSAGES_KEY.to_string(), ValueType::List);
        Self { fields }
    }

    /// Declare `key` with type `value_type`.
    ///
    /// Redeclaring `messages` with anything but `List` is ignored.
    pub fn with(mut self, key: impl Into<String>, value_type: ValueType) -> Self {
        let key = key.into();
        if key != MESSAGES_KEY {
            self.fields.insert(key, value_type);
        }
        self
    }

    pub fn type_of(&self, key: &str) -> Option<ValueType> {
        self.fields.get(key).copied()
    }

    pub fn declares(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Declared keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl Default for StateSchema {
    fn default() -> Self {
        Self::new()
    }
}
