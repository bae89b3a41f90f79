//! Agent assembly.
//!
//! The router agent owns four pipeline tools:
//!
//! ```text
//! router ─┬─ documentation_tool  lookup → prompt → thinking generator
//!         ├─ skill_tool          definitions → summary → prompt → skills agent
//!         ├─ todo_tool           prompt (+ relevant_documentation) → todo agent
//!         └─ coder_tool          prompt → coder agent
//! ```
//!
//! Every nested agent is its own `AgentLoop` with isolated state, sharing
//! the validator and trace writer of the router.

use std::sync::Arc;

use quill_core::traits::{ArgumentValidator, ChatGenerator, ContentFetcher, TraceWriter};
use quill_rag::DocumentationLookup;

pub mod coder;
pub mod documentation;
pub mod prompts;
pub mod router;
pub mod skills;
pub mod todo;

/// Names of the pipeline components used by the tool pipelines.
pub(crate) const BUILDER: &str = "builder";
pub(crate) const AGENT: &str = "agent";

/// The collaborators every agent is built from.
#[derive(Clone)]
pub struct AgentServices {
    /// Routes, summarizes and plans.
    pub thinking: Arc<dyn ChatGenerator>,
    /// Writes code.
    pub coder: Arc<dyn ChatGenerator>,
    pub documentation: Arc<DocumentationLookup>,
    /// Fetches the skill definition pages.
    pub fetcher: Arc<dyn ContentFetcher>,
    pub validator: Arc<dyn ArgumentValidator>,
    pub trace: Arc<dyn TraceWriter>,
}
