//! # quill-trace
//!
//! Append-only run trace for Quill agent loops.
//!
//! ## Overview
//!
//! Every phase transition of an agent loop is written as a `StepRecord`.
//! `InMemoryTraceWriter` wraps each record in a sequenced `TraceEvent`, keeps
//! the runs that finished, and exports the lot as a `TraceLog`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quill_trace::InMemoryTraceWriter;
//!
//! let trace = Arc::new(InMemoryTraceWriter::new("angular"));
//! // hand `trace.clone()` to every AgentLoop, then after the run:
//! let log = trace.export_log()?;
//! ```

pub mod event;
pub mod memory;

pub use event::{TraceEvent, TraceLog};
pub use memory::InMemoryTraceWriter;

// ── Tests ─────────────────────────────────────────────────────────────────────
