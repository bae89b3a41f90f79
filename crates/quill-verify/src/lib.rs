//! # quill-verify
//!
//! Tool argument validation for Quill.
//!
//! This crate provides [`engine::SchemaValidator`], which implements the
//! [`quill_core::traits::ArgumentValidator`] trait. Arguments are checked in
//! two phases:
//!
//! 1. **Structural**: JSON Schema validation of the argument object against
//!    the tool's `parameters` via the `jsonschema` crate.
//! 2. **Custom**: per-tool checks registered by the hosting application.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use quill_verify::engine::SchemaValidator;
//!
//! let mut validator = SchemaValidator::new();
//! validator.register_check("write_skill", Box::new(|args| {
//!     match args.get("dir_name").and_then(|v| v.as_str()) {
//!         Some(name) if name.contains('/') => Some("dir_name must be a single path segment".to_string()),
//!         _ => None,
//!     }
//! }));
//! ```

pub mod engine;

pub use engine::SchemaValidator;
