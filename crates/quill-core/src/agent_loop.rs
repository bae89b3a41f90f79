//! The agent loop: a bounded, state-carrying, tool-selecting state machine.
//!
//! One call to `run` drives a single conversation:
//!
//!   AwaitingModel → ModelResponded → (ToolRequested → ToolExecuting →
//!   ToolResultMerged → AwaitingModel) | Terminated
//!
//! The step budget counts model calls. Generator errors end the run with
//! `Err`; tool-local errors are fed back to the model as error tool messages
//! and the loop carries on.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use quill_contracts::{
    error::{QuillError, QuillResult},
    execution::{LoopPhase, StepRecord},
    message::{AgentId, Message, RunId, Role, ToolCall},
    state::{StateSchema, MESSAGES_KEY},
};

use crate::{
    component::{Component, InputPort, PortValues},
    state::State,
    tool::ToolRegistry,
    traits::{ArgumentValidator, ChatGenerator, TraceWriter},
};

/// Output port names of an agent loop used as a component.
pub const TEXT_PORT: &str = "text";
pub const TRUNCATED_PORT: &str = "truncated";
pub const ITERATIONS_PORT: &str = "iterations";

/// When the loop stops before its budget runs out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitCondition {
    /// A model reply without tool calls. Always active.
    Text,
    /// Stop right after the named tool has run successfully.
    Tool(String),
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub name: String,
    pub system_prompt: Option<String>,
    /// Maximum number of model calls per run.
    pub max_steps: usize,
    pub exit_conditions: Vec<ExitCondition>,
    pub state_schema: StateSchema,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, max_steps: usize) -> Self {
        Self {
            name: name.into(),
            system_prompt: None,
            max_steps,
            exit_conditions: vec![ExitCondition::Text],
            state_schema: StateSchema::new(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_state_schema(mut self, schema: StateSchema) -> Self {
        self.state_schema = schema;
        self
    }

    pub fn with_exit_condition(mut self, condition: ExitCondition) -> Self {
        if !self.exit_conditions.contains(&condition) {
            self.exit_conditions.push(condition);
        }
        self
    }
}

/// Everything a finished run hands back.
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    pub run_id: RunId,
    /// Full history, system prompt included.
    pub messages: Vec<Message>,
    pub state: State,
    /// Text of the last assistant reply, or of the tool result that
    /// triggered a tool exit.
    pub text: String,
    /// True when the step budget ran out while tools were still requested.
    pub truncated: bool,
    /// Number of model calls made.
    pub iterations: usize,
}

pub struct AgentLoop {
    config: AgentConfig,
    agent_id: AgentId,
    generator: Arc<dyn ChatGenerator>,
    tools: ToolRegistry,
    validator: Arc<dyn ArgumentValidator>,
    trace: Arc<dyn TraceWriter>,
}

impl AgentLoop {
    /// Build an agent loop.
    ///
    /// # Errors
    ///
    /// `ConfigError` when the budget is zero, an exit condition names an
    /// unregistered tool, or a tool touches a state key the schema does not
    /// declare.
    pub fn new(
        config: AgentConfig,
        generator: Arc<dyn ChatGenerator>,
        tools: ToolRegistry,
        validator: Arc<dyn ArgumentValidator>,
        trace: Arc<dyn TraceWriter>,
    ) -> QuillResult<Self> {
        let fail = |reason: String| QuillError::ConfigError {
            reason: format!("agent '{}': {reason}", config.name),
        };

        if config.max_steps == 0 {
            return Err(fail("max_steps must be at least 1".to_string()));
        }
        for condition in &config.exit_conditions {
            if let ExitCondition::Tool(name) = condition {
                if tools.get(name).is_none() {
                    return Err(fail(format!("exit condition names unknown tool '{name}'")));
                }
            }
        }
        for tool in tools.iter() {
            for key in tool.state_reads().into_iter().chain(tool.state_writes()) {
                if !config.state_schema.declares(key) {
                    return Err(fail(format!(
                        "tool '{}' uses undeclared state key '{key}'",
                        tool.name()
                    )));
                }
            }
        }

        Ok(Self {
            agent_id: AgentId::new(config.name.clone()),
            config,
            generator,
            tools,
            validator,
            trace,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Declared state keys other than `messages`.
    pub fn state_keys(&self) -> Vec<String> {
        self.config
            .state_schema
            .keys()
            .filter(|k| *k != MESSAGES_KEY)
            .map(str::to_string)
            .collect()
    }

    /// Run the loop over `messages`, with `initial` state values.
    ///
    /// A `messages` entry in `initial` is ignored; the history is seeded from
    /// the system prompt and `messages` only.
    pub fn run(
        &self,
        messages: Vec<Message>,
        mut initial: BTreeMap<String, Value>,
    ) -> QuillResult<LoopOutcome> {
        let run_id = RunId::new();
        initial.remove(MESSAGES_KEY);
        let mut state = State::with_values(self.config.state_schema.clone(), initial)?;

        let mut history = Vec::with_capacity(messages.len() + 1);
        if let Some(prompt) = &self.config.system_prompt {
            history.push(Message::from_system(prompt.clone()));
        }
        history.extend(messages);
        state.push_messages(&history)?;

        let specs = self.tools.specs();

        info!(
            agent = %self.config.name,
            run_id = %run_id.0,
            tools = specs.len(),
            max_steps = self.config.max_steps,
            "agent loop starting"
        );

        let mut iterations = 0;
        let mut truncated = false;
        let mut text = String::new();

        loop {
            if iterations == self.config.max_steps {
                warn!(
                    agent = %self.config.name,
                    run_id = %run_id.0,
                    iterations,
                    "step budget exhausted with tools still requested"
                );
                truncated = true;
                text = last_assistant_text(&history);
                break;
            }

            // ── Model call ───────────────────────────────────────────────────
            self.record(&run_id, iterations, LoopPhase::AwaitingModel, json!({ "messages": history.len() }));

            let replies = match self.generator.generate(&history, &specs) {
                Ok(replies) => replies,
                Err(e) => {
                    warn!(agent = %self.config.name, run_id = %run_id.0, error = %e, "generator failed");
                    self.record(&run_id, iterations, LoopPhase::Terminated, json!({ "error": e.to_string() }));
                    self.finish(&run_id);
                    return Err(e);
                }
            };
            iterations += 1;

            let calls: Vec<ToolCall> = replies
                .iter()
                .flat_map(|m| m.tool_calls.iter().cloned())
                .collect();

            self.record(
                &run_id,
                iterations,
                LoopPhase::ModelResponded,
                json!({ "replies": replies.len(), "tool_calls": calls.len() }),
            );

            state.push_messages(&replies)?;
            history.extend(replies);

            if calls.is_empty() {
                text = last_assistant_text(&history);
                debug!(agent = %self.config.name, iterations, "text reply, exiting");
                break;
            }

            // ── Tool execution ───────────────────────────────────────────────
            let names: Vec<&str> = calls.iter().map(|c| c.tool_name.as_str()).collect();
            self.record(&run_id, iterations, LoopPhase::ToolRequested, json!({ "tools": names }));

            let mut exit_text = None;
            for call in calls {
                self.record(
                    &run_id,
                    iterations,
                    LoopPhase::ToolExecuting,
                    json!({ "tool": call.tool_name, "call_id": call.id }),
                );

                let invoked = self
                    .tools
                    .invoke(&call.tool_name, &call.arguments, &state, self.validator.as_ref())
                    .and_then(|outcome| {
                        // All of a call's updates land, or none do.
                        let mut staged = state.clone();
                        for (key, value) in outcome.state_updates.iter() {
                            staged.merge(key, value.clone())?;
                        }
                        Ok((outcome, staged))
                    });

                let message = match invoked {
                    Ok((outcome, staged)) => {
                        state = staged;
                        let rendered = outcome.render();
                        if self.exits_after(&call.tool_name) {
                            exit_text = Some(rendered.clone());
                        }
                        Message::from_tool(rendered, call.clone(), false)
                    }
                    Err(e) => {
                        warn!(
                            agent = %self.config.name,
                            tool = %call.tool_name,
                            error = %e,
                            "tool call failed, reporting to model"
                        );
                        Message::from_tool(e.to_string(), call.clone(), true)
                    }
                };

                let error = message.tool_result.as_ref().map(|r| r.error).unwrap_or(false);
                state.push_messages(std::slice::from_ref(&message))?;
                history.push(message);

                self.record(
                    &run_id,
                    iterations,
                    LoopPhase::ToolResultMerged,
                    json!({ "tool": call.tool_name, "error": error }),
                );
            }

            if let Some(result) = exit_text {
                debug!(agent = %self.config.name, iterations, "exit tool ran, exiting");
                text = result;
                break;
            }
        }

        self.record(
            &run_id,
            iterations,
            LoopPhase::Terminated,
            json!({ "truncated": truncated, "iterations": iterations }),
        );
        self.finish(&run_id);

        info!(
            agent = %self.config.name,
            run_id = %run_id.0,
            iterations,
            truncated,
            "agent loop finished"
        );

        Ok(LoopOutcome {
            run_id,
            messages: history,
            state,
            text,
            truncated,
            iterations,
        })
    }

    fn exits_after(&self, tool_name: &str) -> bool {
        self.config
            .exit_conditions
            .iter()
            .any(|c| matches!(c, ExitCondition::Tool(name) if name == tool_name))
    }

    fn record(&self, run_id: &RunId, iteration: usize, phase: LoopPhase, detail: Value) {
        let record = StepRecord {
            run_id: run_id.clone(),
            agent: self.agent_id.clone(),
            iteration,
            phase,
            detail,
            timestamp: Utc::now(),
        };
        if let Err(e) = self.trace.write(&record) {
            warn!(agent = %self.config.name, phase = ?phase, error = %e, "trace write failed");
        }
    }

    fn finish(&self, run_id: &RunId) {
        if let Err(e) = self.trace.finalize(run_id) {
            warn!(agent = %self.config.name, error = %e, "trace finalize failed");
        }
    }
}

fn last_assistant_text(history: &[Message]) -> String {
    history
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .map(|m| m.text.clone())
        .unwrap_or_default()
}

impl Component for AgentLoop {
    fn input_ports(&self) -> Vec<InputPort> {
        let mut ports = vec![InputPort::optional(MESSAGES_KEY)];
        ports.extend(self.state_keys().into_iter().map(InputPort::optional));
        ports
    }

    fn output_ports(&self) -> Vec<String> {
        let mut ports = vec![
            MESSAGES_KEY.to_string(),
            TEXT_PORT.to_string(),
            TRUNCATED_PORT.to_string(),
            ITERATIONS_PORT.to_string(),
        ];
        ports.extend(self.state_keys());
        ports
    }

    fn run(&self, mut inputs: PortValues) -> QuillResult<PortValues> {
        let messages: Vec<Message> = match inputs.remove(MESSAGES_KEY) {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value(value).map_err(|e| QuillError::StateSchema {
                reason: format!("agent '{}' input 'messages' is not a message list: {e}", self.config.name),
            })?,
        };

        let outcome = AgentLoop::run(self, messages, inputs)?;

        let mut outputs = PortValues::new();
        for key in self.state_keys() {
            if let Some(value) = outcome.state.get(&key) {
                outputs.insert(key, value.clone());
            }
        }
        let history = serde_json::to_value(&outcome.messages).map_err(|e| QuillError::StateSchema {
            reason: format!("messages are not serializable: {e}"),
        })?;
        outputs.insert(MESSAGES_KEY.to_string(), history);
        outputs.insert(TEXT_PORT.to_string(), Value::String(outcome.text));
        outputs.insert(TRUNCATED_PORT.to_string(), Value::Bool(outcome.truncated));
        outputs.insert(ITERATIONS_PORT.to_string(), json!(outcome.iterations));
        Ok(outputs)
    }
}
