//! Trace event and log types.
//!
//! `TraceEvent` wraps one `StepRecord` with its position in the trace.
//! `TraceLog` is the exported view of everything recorded so far, across
//! every agent run that shared the writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quill_contracts::{execution::StepRecord, message::RunId};

/// A single entry in the trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Position across the whole trace, starting at 0. Nested runs interleave
    /// with their parent, so sequence order is wall-clock order.
    pub sequence: u64,

    pub record: StepRecord,
}

/// An exported trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceLog {
    /// Label given to the writer, e.g. the top-level pipeline name.
    pub name: String,

    /// All events in sequence order.
    pub events: Vec<TraceEvent>,

    /// Runs that reached `finalize`, in finishing order.
    pub finished_runs: Vec<RunId>,

    pub exported_at: DateTime<Utc>,
}

impl TraceLog {
    /// Events belonging to one run, in order.
    pub fn run(&self, run_id: &RunId) -> impl Iterator<Item = &TraceEvent> {
        let run_id = run_id.clone();
        self.events.iter().filter(move |e| e.record.run_id == run_id)
    }
}
