//! Generator options.

use std::time::Duration;

/// Settings fixed for the lifetime of one generator instance.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub model: String,
    pub temperature: f32,
    /// Upper bound on a single request. Expiry is a `GenerationFailure`.
    pub timeout: Duration,
}

impl GenerationOptions {
    pub fn new(model: impl Into<String>, temperature: f32, timeout: Duration) -> Self {
        Self {
            model: model.into(),
            temperature,
            timeout,
        }
    }
}
