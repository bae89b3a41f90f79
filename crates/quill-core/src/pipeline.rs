//! Sequential component pipelines.
//!
//! Components run in insertion order, each exactly once per `run()`.
//! Connections may only point forward, so insertion order is a valid
//! topological order and no component can be scheduled twice. A pipeline
//! also refuses to be entered while it is already running, which stops a
//! nested tool from re-entering the pipeline that invoked it.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tracing::debug;

use quill_contracts::error::{QuillError, QuillResult};

use crate::component::{Component, PortRef, PortValues};

/// Every output produced during one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutputs {
    values: BTreeMap<PortRef, Value>,
}

impl PipelineOutputs {
    pub fn get(&self, port: &PortRef) -> Option<&Value> {
        self.values.get(port)
    }

    pub fn take(&mut self, port: &PortRef) -> Option<Value> {
        self.values.remove(port)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

struct Connection {
    from: PortRef,
    to: PortRef,
}

/// A named, forward-only graph of components.
pub struct Pipeline {
    name: String,
    components: Vec<(String, Box<dyn Component>)>,
    connections: Vec<Connection>,
    max_runs_per_component: usize,
    running: AtomicBool,
}

/// Clears the running flag when a run ends, including on error.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Pipeline {
    /// Create an empty pipeline allowing one run per component.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
            connections: Vec::new(),
            max_runs_per_component: 1,
            running: AtomicBool::new(false),
        }
    }

    pub fn with_max_runs_per_component(mut self, max_runs: usize) -> Self {
        self.max_runs_per_component = max_runs;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a component. Names must be unique within the pipeline.
    pub fn add_component(
        &mut self,
        name: impl Into<String>,
        component: impl Component + 'static,
    ) -> QuillResult<()> {
        let name = name.into();
        if self.position(&name).is_some() {
            return Err(QuillError::ConfigError {
                reason: format!("pipeline '{}' already has a component named '{}'", self.name, name),
            });
        }
        self.components.push((name, Box::new(component)));
        Ok(())
    }

    /// Connect an output port to an input port of a later component.
    pub fn connect(&mut self, from: PortRef, to: PortRef) -> QuillResult<()> {
        if !self.has_output(&from) {
            return Err(self.unresolved("output", &from));
        }
        if !self.has_input(&to) {
            return Err(self.unresolved("input", &to));
        }
        let (from_idx, to_idx) = match (self.position(&from.component), self.position(&to.component)) {
            (Some(f), Some(t)) => (f, t),
            _ => return Err(self.unresolved("component", &from)),
        };
        if from_idx >= to_idx {
            return Err(QuillError::ConfigError {
                reason: format!("connection {from} -> {to} does not point forward"),
            });
        }
        if self.is_connected(&to) {
            return Err(QuillError::ConfigError {
                reason: format!("input {to} is already connected"),
            });
        }
        self.connections.push(Connection { from, to });
        Ok(())
    }

    /// True if `port` names a declared input of a component in this pipeline.
    pub fn has_input(&self, port: &PortRef) -> bool {
        self.component(&port.component)
            .map(|c| c.input_ports().iter().any(|p| p.name == port.port))
            .unwrap_or(false)
    }

    /// True if `port` names a declared output of a component in this pipeline.
    pub fn has_output(&self, port: &PortRef) -> bool {
        self.component(&port.component)
            .map(|c| c.output_ports().iter().any(|p| *p == port.port))
            .unwrap_or(false)
    }

    /// True if `port` is fed by a connection rather than from outside.
    pub fn is_connected(&self, port: &PortRef) -> bool {
        self.connections.iter().any(|c| c.to == *port)
    }

    /// Run every component once, in order.
    ///
    /// `inputs` feeds unconnected input ports from outside. A missing
    /// required input is a `ConfigError`; entering a pipeline that is
    /// already running is `RunLimitExceeded`.
    pub fn run(&self, inputs: BTreeMap<PortRef, Value>) -> QuillResult<PipelineOutputs> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(QuillError::RunLimitExceeded {
                component: self.name.clone(),
            });
        }
        let _guard = RunGuard(&self.running);

        for port in inputs.keys() {
            if !self.has_input(port) {
                return Err(self.unresolved("input", port));
            }
            if self.is_connected(port) {
                return Err(QuillError::ConfigError {
                    reason: format!("input {port} is connected and cannot be fed from outside"),
                });
            }
        }

        let mut runs: HashMap<&str, usize> = HashMap::new();
        let mut produced: BTreeMap<PortRef, Value> = BTreeMap::new();

        for (name, component) in &self.components {
            let mut collected = PortValues::new();
            for port in component.input_ports() {
                let target = PortRef::new(name.as_str(), port.name.as_str());
                let value = match self.connections.iter().find(|c| c.to == target) {
                    Some(conn) => produced.get(&conn.from).cloned(),
                    None => inputs.get(&target).cloned(),
                };
                match value {
                    Some(v) => {
                        collected.insert(port.name, v);
                    }
                    None if port.required => {
                        return Err(QuillError::ConfigError {
                            reason: format!(
                                "pipeline '{}': required input {} was not provided",
                                self.name, target
                            ),
                        });
                    }
                    None => {}
                }
            }

            let count = runs.entry(name.as_str()).or_insert(0);
            *count += 1;
            if *count > self.max_runs_per_component {
                return Err(QuillError::RunLimitExceeded {
                    component: format!("{}.{}", self.name, name),
                });
            }

            debug!(pipeline = %self.name, component = %name, "running component");
            let declared = component.output_ports();
            for (port, value) in component.run(collected)? {
                if declared.contains(&port) {
                    produced.insert(PortRef::new(name.as_str(), port), value);
                }
            }
        }

        Ok(PipelineOutputs { values: produced })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|(n, _)| n == name)
    }

    fn component(&self, name: &str) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_ref())
    }

    fn unresolved(&self, what: &str, port: &PortRef) -> QuillError {
        QuillError::ConfigError {
            reason: format!("pipeline '{}' has no {} {}", self.name, what, port),
        }
    }
}
