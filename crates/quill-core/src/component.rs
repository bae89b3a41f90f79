//! Pipeline components and port addressing.
//!
//! A component is a named step with declared input and output ports. Values
//! travelling between ports are plain JSON; messages and documents are
//! carried in their serde form.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use quill_contracts::error::QuillResult;

/// Values keyed by port name, for a single component.
pub type PortValues = BTreeMap<String, Value>;

/// A typed reference to one port of one component in a pipeline.
///
/// Replaces stringly `"component.port"` paths: a `PortRef` is checked against
/// the pipeline when a connection or tool binding is built, never at run time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortRef {
    pub component: String,
    pub port: String,
}

impl PortRef {
    pub fn new(component: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            port: port.into(),
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.port)
    }
}

/// One declared input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPort {
    pub name: String,
    /// A required port must receive a value before the component may run.
    pub required: bool,
}

impl InputPort {
    pub fn required(name: impl Into<String>) -> Self {
        Self { name: name.into(), required: true }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self { name: name.into(), required: false }
    }
}

/// A pipeline step.
pub trait Component: Send + Sync {
    fn input_ports(&self) -> Vec<InputPort>;

    fn output_ports(&self) -> Vec<String>;

    /// Run once with the collected inputs. Required inputs are guaranteed to
    /// be present; outputs not declared in `output_ports` are dropped.
    fn run(&self, inputs: PortValues) -> QuillResult<PortValues>;
}
