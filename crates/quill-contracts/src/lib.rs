//! # quill-contracts
//!
//! Shared types, schemas, and contracts for the Quill agent orchestrator.
//!
//! All crates in the workspace import from here. No orchestration logic lives
//! in this crate: only data definitions and error types.

pub mod document;
pub mod error;
pub mod execution;
pub mod generation;
pub mod message;
pub mod skill;
pub mod state;
pub mod tool;
