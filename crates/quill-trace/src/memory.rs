//! In-memory implementation of `TraceWriter`.
//!
//! `InMemoryTraceWriter` keeps every `StepRecord` in a `Vec` behind a
//! `Mutex`. One writer is shared by a top-level agent and all agents nested
//! inside its tools, so a single export shows the whole request.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::info;

use quill_contracts::{
    error::{QuillError, QuillResult},
    execution::{LoopPhase, StepRecord},
    message::RunId,
};
use quill_core::traits::TraceWriter;

use crate::event::{TraceEvent, TraceLog};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct InMemoryState {
    pub(crate) events: Vec<TraceEvent>,
    pub(crate) sequence: u64,
    pub(crate) finished_runs: Vec<RunId>,
}

// ── Public writer ─────────────────────────────────────────────────────────────

pub struct InMemoryTraceWriter {
    name: String,
    pub(crate) state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryTraceWriter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(InMemoryState {
                events: Vec::new(),
                sequence: 0,
                finished_runs: Vec::new(),
            })),
        }
    }

    /// Export everything written so far.
    pub fn export_log(&self) -> QuillResult<TraceLog> {
        let state = self.lock()?;
        Ok(TraceLog {
            name: self.name.clone(),
            events: state.events.clone(),
            finished_runs: state.finished_runs.clone(),
            exported_at: Utc::now(),
        })
    }

    pub fn event_count(&self) -> QuillResult<usize> {
        Ok(self.lock()?.events.len())
    }

    fn lock(&self) -> QuillResult<MutexGuard<'_, InMemoryState>> {
        self.state.lock().map_err(|e| QuillError::StoreFailure {
            reason: format!("trace state lock poisoned: {}", e),
        })
    }
}

// ── TraceWriter impl ──────────────────────────────────────────────────────────

impl TraceWriter for InMemoryTraceWriter {
    /// Append one record and advance the sequence counter.
    fn write(&self, record: &StepRecord) -> QuillResult<()> {
        let mut state = self.lock()?;
        let sequence = state.sequence;
        state.events.push(TraceEvent {
            sequence,
            record: record.clone(),
        });
        state.sequence += 1;
        Ok(())
    }

    /// Mark `run_id` as finished. A run finalized twice is recorded once.
    fn finalize(&self, run_id: &RunId) -> QuillResult<()> {
        let mut state = self.lock()?;
        if !state.finished_runs.contains(run_id) {
            state.finished_runs.push(run_id.clone());
        }

        let run_events = state.events.iter().filter(|e| e.record.run_id == *run_id).count();
        let terminated = state
            .events
            .iter()
            .rev()
            .find(|e| e.record.run_id == *run_id)
            .map(|e| e.record.phase == LoopPhase::Terminated)
            .unwrap_or(false);

        info!(
            trace = %self.name,
            run_id = %run_id.0,
            event_count = run_events,
            terminated,
            "run trace finalized"
        );

        Ok(())
    }
}
