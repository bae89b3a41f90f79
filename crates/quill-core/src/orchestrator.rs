//! The orchestrator: a top-level agent exposed as one runnable unit.

use std::collections::BTreeMap;

use serde_json::{json, Value};
use tracing::info;

use quill_contracts::{
    error::{QuillError, QuillResult},
    message::Message,
    state::MESSAGES_KEY,
};

use crate::{
    agent_loop::{AgentLoop, ITERATIONS_PORT, TEXT_PORT, TRUNCATED_PORT},
    component::PortRef,
    pipeline::Pipeline,
};

const AGENT: &str = "agent";

/// The result of one orchestrated request.
#[derive(Debug, Clone)]
pub struct OrchestratorOutput {
    pub answer: String,
    /// Final values of the agent's declared state keys, `messages` included.
    pub state: BTreeMap<String, Value>,
    pub truncated: bool,
    pub iterations: usize,
}

/// Wraps an agent in a pipeline that runs each component at most once per
/// request and refuses re-entrant runs.
pub struct Orchestrator {
    pipeline: Pipeline,
    state_keys: Vec<String>,
}

impl Orchestrator {
    pub fn new(agent: AgentLoop) -> QuillResult<Self> {
        let state_keys = agent.state_keys();
        let mut pipeline = Pipeline::new(format!("{}_orchestrator", agent.name())).with_max_runs_per_component(1);
        pipeline.add_component(AGENT, agent)?;
        Ok(Self { pipeline, state_keys })
    }

    /// Run the agent on `request`, seeded as a single user message.
    pub fn run(&self, request: &str) -> QuillResult<OrchestratorOutput> {
        info!(pipeline = %self.pipeline.name(), request_len = request.len(), "orchestrating request");

        let mut inputs = BTreeMap::new();
        inputs.insert(
            PortRef::new(AGENT, MESSAGES_KEY),
            json!([Message::from_user(request)]),
        );
        let mut outputs = self.pipeline.run(inputs)?;

        let missing = |port: &str| QuillError::ConfigError {
            reason: format!("agent produced no '{port}' output"),
        };

        let answer = outputs
            .take(&PortRef::new(AGENT, TEXT_PORT))
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| missing(TEXT_PORT))?;
        let truncated = outputs
            .take(&PortRef::new(AGENT, TRUNCATED_PORT))
            .and_then(|v| v.as_bool())
            .ok_or_else(|| missing(TRUNCATED_PORT))?;
        let iterations = outputs
            .take(&PortRef::new(AGENT, ITERATIONS_PORT))
            .and_then(|v| v.as_u64())
            .ok_or_else(|| missing(ITERATIONS_PORT))? as usize;

        let mut state = BTreeMap::new();
        for key in self.state_keys.iter().map(String::as_str).chain([MESSAGES_KEY]) {
            if let Some(value) = outputs.take(&PortRef::new(AGENT, key)) {
                state.insert(key.to_string(), value);
            }
        }

        Ok(OrchestratorOutput {
            answer,
            state,
            truncated,
            iterations,
        })
    }
}
