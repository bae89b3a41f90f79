//! # quill-core
//!
//! The orchestration runtime for Quill agents.
//!
//! This crate provides:
//! - The collaborator traits (`ChatGenerator`, `Embedder`, `DocumentStore`,
//!   `ContentFetcher`, `ArgumentValidator`, `TraceWriter`)
//! - Schema-checked `State`
//! - Components and forward-only `Pipeline`s
//! - `Tool`s and the name-keyed `ToolRegistry`
//! - The bounded `AgentLoop` and the `Orchestrator` that wraps it
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quill_core::{AgentConfig, AgentLoop, Orchestrator, ToolRegistry};
//! ```

pub mod agent_loop;
pub mod component;
pub mod components;
pub mod orchestrator;
pub mod pipeline;
pub mod state;
pub mod tool;
pub mod traits;

pub use agent_loop::{AgentConfig, AgentLoop, ExitCondition, LoopOutcome};
pub use component::{Component, InputPort, PortRef, PortValues};
pub use components::{GeneratorComponent, PromptBuilder};
pub use orchestrator::{Orchestrator, OrchestratorOutput};
pub use pipeline::{Pipeline, PipelineOutputs};
pub use state::State;
pub use tool::{DirectTool, PipelineTool, Tool, ToolOutcome, ToolRegistry};
