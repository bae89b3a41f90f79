//! Agent loop phases and trace records.
//!
//! `StepRecord` is what the agent loop hands to its trace writer: one per
//! phase transition. Records are never modified after being written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{AgentId, RunId};

/// The states of the agent loop state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    AwaitingModel,
    ModelResponded,
    ToolRequested,
    ToolExecuting,
    ToolResultMerged,
    Terminated,
}

/// An immutable record of one phase transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub run_id: RunId,
    pub agent: AgentId,
    /// 1-based model-invocation counter; 0 before the first call.
    pub iteration: usize,
    pub phase: LoopPhase,
    /// Phase-specific payload (tool name, reply text, truncation flag, ...).
    pub detail: serde_json::Value,
    /// Wall-clock time the record was created (UTC).
    pub timestamp: DateTime<Utc>,
}
