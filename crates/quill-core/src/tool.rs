//! Tools and tool dispatch.
//!
//! A tool is one of two closed variants behind a single `invoke`:
//!
//! - `Tool::Direct`: a plain function with explicit side effects
//! - `Tool::Pipeline`: a component pipeline with declared argument, state
//!   and output bindings
//!
//! All bindings are `PortRef`s checked against the pipeline when the tool is
//! built. A tool never sees state keys it did not declare and never writes
//! state itself: it returns `state_updates` and the agent loop merges them.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tracing::debug;

use quill_contracts::{
    error::{QuillError, QuillResult},
    tool::ToolSpec,
};

use crate::{
    component::PortRef,
    pipeline::Pipeline,
    state::State,
    traits::ArgumentValidator,
};

/// The function behind a direct tool. Receives the validated arguments.
pub type ToolFn = Box<dyn Fn(&Value) -> QuillResult<Value> + Send + Sync>;

/// What a successful invocation hands back to the agent loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub result: Value,
    /// `(state key, value)` pairs to merge, in declaration order.
    pub state_updates: Vec<(String, Value)>,
}

impl ToolOutcome {
    /// Text for the tool-result message: strings verbatim, anything else as
    /// compact JSON.
    pub fn render(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Routes a direct tool's result (or one field of it) into state.
#[derive(Debug, Clone)]
struct DirectStateBinding {
    field: Option<String>,
    state_key: String,
}

pub struct DirectTool {
    spec: ToolSpec,
    function: ToolFn,
    outputs_to_state: Vec<DirectStateBinding>,
}

impl DirectTool {
    pub fn new(
        spec: ToolSpec,
        function: impl Fn(&Value) -> QuillResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            spec,
            function: Box::new(function),
            outputs_to_state: Vec::new(),
        }
    }

    /// Merge the whole result, or `field` of an object result, into
    /// `state_key` after every successful call.
    pub fn output_to_state(mut self, field: Option<&str>, state_key: impl Into<String>) -> Self {
        self.outputs_to_state.push(DirectStateBinding {
            field: field.map(str::to_string),
            state_key: state_key.into(),
        });
        self
    }

    fn invoke(&self, arguments: &Value) -> QuillResult<ToolOutcome> {
        let result = (self.function)(arguments)?;
        let state_updates = self
            .outputs_to_state
            .iter()
            .filter_map(|b| {
                let value = match &b.field {
                    None => Some(result.clone()),
                    Some(field) => result.get(field).cloned(),
                };
                value.map(|v| (b.state_key.clone(), v))
            })
            .collect();
        Ok(ToolOutcome { result, state_updates })
    }
}

pub struct PipelineTool {
    spec: ToolSpec,
    pipeline: Pipeline,
    input_bindings: Vec<(String, Vec<PortRef>)>,
    inputs_from_state: Vec<(String, PortRef)>,
    output_bindings: Vec<(PortRef, String)>,
    outputs_to_state: Vec<(PortRef, String)>,
}

impl PipelineTool {
    pub fn builder(spec: ToolSpec, pipeline: Pipeline) -> PipelineToolBuilder {
        PipelineToolBuilder {
            tool: PipelineTool {
                spec,
                pipeline,
                input_bindings: Vec::new(),
                inputs_from_state: Vec::new(),
                output_bindings: Vec::new(),
                outputs_to_state: Vec::new(),
            },
        }
    }

    fn invoke(&self, arguments: &Value, state: &State) -> QuillResult<ToolOutcome> {
        let mut inputs = BTreeMap::new();
        for (argument, ports) in &self.input_bindings {
            if let Some(value) = arguments.get(argument) {
                for port in ports {
                    inputs.insert(port.clone(), value.clone());
                }
            }
        }
        for (key, port) in &self.inputs_from_state {
            if let Some(value) = state.get(key) {
                inputs.insert(port.clone(), value.clone());
            }
        }

        debug!(tool = %self.spec.name, pipeline = %self.pipeline.name(), inputs = inputs.len(), "running pipeline tool");
        let mut outputs = self.pipeline.run(inputs)?;

        let state_updates = self
            .outputs_to_state
            .iter()
            .filter_map(|(port, key)| outputs.get(port).map(|v| (key.clone(), v.clone())))
            .collect();

        let result = if let [(port, _)] = self.output_bindings.as_slice() {
            outputs.take(port).unwrap_or(Value::Null)
        } else {
            let fields = self
                .output_bindings
                .iter()
                .map(|(port, name)| (name.clone(), outputs.take(port).unwrap_or(Value::Null)))
                .collect();
            Value::Object(fields)
        };

        Ok(ToolOutcome { result, state_updates })
    }
}

/// Collects bindings for a `PipelineTool` and resolves them in `build()`.
pub struct PipelineToolBuilder {
    tool: PipelineTool,
}

impl PipelineToolBuilder {
    /// Route argument `name` to one or more pipeline inputs.
    pub fn bind_argument(mut self, name: impl Into<String>, ports: Vec<PortRef>) -> Self {
        self.tool.input_bindings.push((name.into(), ports));
        self
    }

    /// Seed pipeline input `port` from state key `key` on every call.
    pub fn input_from_state(mut self, key: impl Into<String>, port: PortRef) -> Self {
        self.tool.inputs_from_state.push((key.into(), port));
        self
    }

    /// Expose pipeline output `port` as result field `name`. With exactly one
    /// output binding the result is the bare value.
    pub fn output(mut self, port: PortRef, name: impl Into<String>) -> Self {
        self.tool.output_bindings.push((port, name.into()));
        self
    }

    /// Merge pipeline output `port` into state key `key` after every call.
    pub fn output_to_state(mut self, port: PortRef, key: impl Into<String>) -> Self {
        self.tool.outputs_to_state.push((port, key.into()));
        self
    }

    /// Resolve every binding against the pipeline.
    pub fn build(self) -> QuillResult<Tool> {
        let tool = self.tool;
        let name = tool.spec.name.clone();
        let fail = |reason: String| QuillError::ConfigError {
            reason: format!("tool '{name}': {reason}"),
        };

        let properties = tool.spec.parameters.get("properties").and_then(Value::as_object);
        let mut fed: Vec<&PortRef> = Vec::new();

        for (argument, ports) in &tool.input_bindings {
            if let Some(props) = properties {
                if !props.contains_key(argument) {
                    return Err(fail(format!("argument '{argument}' is not a declared parameter")));
                }
            }
            if ports.is_empty() {
                return Err(fail(format!("argument '{argument}' is bound to no input")));
            }
            fed.extend(ports.iter());
        }
        fed.extend(tool.inputs_from_state.iter().map(|(_, port)| port));

        for (i, port) in fed.iter().enumerate() {
            if !tool.pipeline.has_input(port) {
                return Err(fail(format!("no pipeline input {port}")));
            }
            if tool.pipeline.is_connected(port) {
                return Err(fail(format!("input {port} is already fed by a connection")));
            }
            if fed[..i].contains(port) {
                return Err(fail(format!("input {port} is bound twice")));
            }
        }

        if tool.output_bindings.is_empty() {
            return Err(fail("at least one output must be bound".to_string()));
        }
        for (port, _) in tool.output_bindings.iter().chain(tool.outputs_to_state.iter()) {
            if !tool.pipeline.has_output(port) {
                return Err(fail(format!("no pipeline output {port}")));
            }
        }

        Ok(Tool::Pipeline(tool))
    }
}

/// A callable capability exposed to an agent.
pub enum Tool {
    Direct(DirectTool),
    Pipeline(PipelineTool),
}

impl Tool {
    pub fn spec(&self) -> &ToolSpec {
        match self {
            Tool::Direct(t) => &t.spec,
            Tool::Pipeline(t) => &t.spec,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec().name
    }

    /// State keys this tool reads.
    pub fn state_reads(&self) -> Vec<&str> {
        match self {
            Tool::Direct(_) => Vec::new(),
            Tool::Pipeline(t) => t.inputs_from_state.iter().map(|(k, _)| k.as_str()).collect(),
        }
    }

    /// State keys this tool writes.
    pub fn state_writes(&self) -> Vec<&str> {
        match self {
            Tool::Direct(t) => t.outputs_to_state.iter().map(|b| b.state_key.as_str()).collect(),
            Tool::Pipeline(t) => t.outputs_to_state.iter().map(|(_, k)| k.as_str()).collect(),
        }
    }

    /// Invoke with already-validated arguments.
    pub fn invoke(&self, arguments: &Value, state: &State) -> QuillResult<ToolOutcome> {
        match self {
            Tool::Direct(t) => t.invoke(arguments),
            Tool::Pipeline(t) => t.invoke(arguments, state),
        }
    }
}

impl From<DirectTool> for Tool {
    fn from(tool: DirectTool) -> Self {
        Tool::Direct(tool)
    }
}

/// Name-keyed tool lookup table.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. A second tool with the same name is rejected.
    pub fn register(&mut self, tool: impl Into<Tool>) -> QuillResult<()> {
        let tool = tool.into();
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(QuillError::ConfigError {
                reason: format!("tool '{name}' is already registered"),
            });
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tool> {
        self.tools.iter()
    }

    /// Specs in registration order, as offered to the generator.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up, validate and invoke `name`.
    ///
    /// Errors: `UnknownTool`, `InvalidArguments` when validation fails, or
    /// whatever the tool itself returns.
    pub fn invoke(
        &self,
        name: &str,
        arguments: &Value,
        state: &State,
        validator: &dyn ArgumentValidator,
    ) -> QuillResult<ToolOutcome> {
        let tool = self.get(name).ok_or_else(|| QuillError::UnknownTool {
            name: name.to_string(),
        })?;

        let report = validator.validate(tool.spec(), arguments)?;
        if !report.passed {
            return Err(QuillError::InvalidArguments {
                tool: name.to_string(),
                reason: report.summary(),
            });
        }

        tool.invoke(arguments, state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::{json, Value};

    use quill_contracts::{
        error::{QuillError, QuillResult},
        state::{StateSchema, ValueType},
        tool::{ToolSpec, ValidationFailure, ValidationReport},
    };

    use crate::{
        component::{Component, InputPort, PortRef, PortValues},
        pipeline::Pipeline,
        state::State,
        traits::ArgumentValidator,
    };

    use super::{DirectTool, PipelineTool, Tool, ToolRegistry};

    /// Checks only the schema's `required` list.
    struct RequiredOnly;

    impl ArgumentValidator for RequiredOnly {
        fn validate(&self, tool: &ToolSpec, arguments: &Value) -> QuillResult<ValidationReport> {
            let failures: Vec<ValidationFailure> = tool
                .required_parameters()
                .into_iter()
                .filter(|name| arguments.get(name).is_none())
                .map(|name| ValidationFailure {
                    path: String::new(),
                    message: format!("'{name}' is a required property"),
                })
                .collect();
            Ok(ValidationReport { passed: failures.is_empty(), failures })
        }
    }

    /// Joins `query` and `documentation` into `prompt`.
    struct Join {
        seen: Arc<Mutex<Vec<PortValues>>>,
    }

    impl Component for Join {
        fn input_ports(&self) -> Vec<InputPort> {
            vec![InputPort::required("query"), InputPort::optional("documentation")]
        }

        fn output_ports(&self) -> Vec<String> {
            vec!["prompt".to_string(), "length".to_string()]
        }

        fn run(&self, inputs: PortValues) -> QuillResult<PortValues> {
            self.seen.lock().unwrap().push(inputs.clone());
            let prompt = format!(
                "{} | {}",
                inputs["query"].as_str().unwrap_or_default(),
                inputs.get("documentation").map(|d| d.to_string()).unwrap_or_default()
            );
            Ok(PortValues::from([
                ("length".to_string(), json!(prompt.len())),
                ("prompt".to_string(), json!(prompt)),
            ]))
        }
    }

    fn query_spec(name: &str) -> ToolSpec {
        ToolSpec::new(
            name,
            "test tool",
            json!({
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": ["query"]
            }),
        )
    }

    fn join_pipeline() -> (Pipeline, Arc<Mutex<Vec<PortValues>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new("join");
        pipeline.add_component("builder", Join { seen: seen.clone() }).unwrap();
        (pipeline, seen)
    }

    fn state() -> State {
        State::new(StateSchema::new().with("relevant_documentation", ValueType::List))
    }

    #[test]
    fn duplicate_tool_names_are_rejected() {
        let mut registry = ToolRegistry::new();
        registry
            .register(DirectTool::new(query_spec("echo"), |args| Ok(args.clone())))
            .unwrap();
        let again = registry.register(DirectTool::new(query_spec("echo"), |args| Ok(args.clone())));
        assert!(matches!(again, Err(QuillError::ConfigError { .. })));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_required_argument_yields_invalid_arguments() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let mut registry = ToolRegistry::new();
        registry
            .register(DirectTool::new(query_spec("echo"), move |args| {
                *counter.lock().unwrap() += 1;
                Ok(args.clone())
            }))
            .unwrap();

        let result = registry.invoke("echo", &json!({}), &state(), &RequiredOnly);
        match result {
            Err(QuillError::InvalidArguments { tool, reason }) => {
                assert_eq!(tool, "echo");
                assert!(reason.contains("query"));
            }
            other => panic!("expected InvalidArguments, got {:?}", other),
        }
        assert_eq!(*calls.lock().unwrap(), 0, "tool must not run on invalid arguments");
    }

    #[test]
    fn unknown_tool_is_reported() {
        let registry = ToolRegistry::new();
        assert!(matches!(
            registry.invoke("ghost", &json!({}), &state(), &RequiredOnly),
            Err(QuillError::UnknownTool { .. })
        ));
    }

    #[test]
    fn direct_tool_routes_field_to_state() {
        let tool = DirectTool::new(query_spec("lookup"), |_| Ok(json!({ "docs": ["a"], "note": "ok" })))
            .output_to_state(Some("docs"), "relevant_documentation");
        let tool = Tool::from(tool);

        let outcome = tool.invoke(&json!({ "query": "q" }), &state()).unwrap();
        assert_eq!(
            outcome.state_updates,
            vec![("relevant_documentation".to_string(), json!(["a"]))]
        );
        assert_eq!(tool.state_writes(), vec!["relevant_documentation"]);
    }

    #[test]
    fn pipeline_tool_routes_arguments_state_and_outputs() {
        let (pipeline, seen) = join_pipeline();
        let tool = PipelineTool::builder(query_spec("join_tool"), pipeline)
            .bind_argument("query", vec![PortRef::new("builder", "query")])
            .input_from_state("relevant_documentation", PortRef::new("builder", "documentation"))
            .output(PortRef::new("builder", "prompt"), "prompt")
            .output_to_state(PortRef::new("builder", "length"), "relevant_documentation")
            .build()
            .unwrap();

        let mut st = state();
        st.set("relevant_documentation", json!(["doc"])).unwrap();

        let outcome = tool.invoke(&json!({ "query": "build a list" }), &st).unwrap();

        assert_eq!(outcome.render(), "build a list | [\"doc\"]");
        assert_eq!(outcome.state_updates.len(), 1);
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(tool.state_reads(), vec!["relevant_documentation"]);
    }

    #[test]
    fn pipeline_tool_with_several_outputs_returns_an_object() {
        let (pipeline, _) = join_pipeline();
        let tool = PipelineTool::builder(query_spec("join_tool"), pipeline)
            .bind_argument("query", vec![PortRef::new("builder", "query")])
            .output(PortRef::new("builder", "prompt"), "prompt")
            .output(PortRef::new("builder", "length"), "length")
            .build()
            .unwrap();

        let outcome = tool.invoke(&json!({ "query": "x" }), &state()).unwrap();
        assert_eq!(outcome.result["prompt"], "x | ");
        assert_eq!(outcome.result["length"], 4);
    }

    #[test]
    fn unresolvable_bindings_fail_at_build_time() {
        let (pipeline, _) = join_pipeline();
        let bad_port = PipelineTool::builder(query_spec("t"), pipeline)
            .bind_argument("query", vec![PortRef::new("builder", "nope")])
            .output(PortRef::new("builder", "prompt"), "prompt")
            .build();
        assert!(matches!(bad_port, Err(QuillError::ConfigError { .. })));

        let (pipeline, _) = join_pipeline();
        let bad_argument = PipelineTool::builder(query_spec("t"), pipeline)
            .bind_argument("topic", vec![PortRef::new("builder", "query")])
            .output(PortRef::new("builder", "prompt"), "prompt")
            .build();
        assert!(matches!(bad_argument, Err(QuillError::ConfigError { .. })));

        let (pipeline, _) = join_pipeline();
        let bad_output = PipelineTool::builder(query_spec("t"), pipeline)
            .bind_argument("query", vec![PortRef::new("builder", "query")])
            .output(PortRef::new("agent", "messages"), "messages")
            .build();
        assert!(matches!(bad_output, Err(QuillError::ConfigError { .. })));

        let (pipeline, _) = join_pipeline();
        let twice = PipelineTool::builder(query_spec("t"), pipeline)
            .bind_argument("query", vec![PortRef::new("builder", "query")])
            .input_from_state("relevant_documentation", PortRef::new("builder", "query"))
            .output(PortRef::new("builder", "prompt"), "prompt")
            .build();
        assert!(matches!(twice, Err(QuillError::ConfigError { .. })));
    }

    #[test]
    fn specs_keep_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["b_tool", "a_tool", "c_tool"] {
            registry
                .register(DirectTool::new(query_spec(name), |_| Ok(Value::Null)))
                .unwrap();
        }
        let names: Vec<String> = registry.specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["b_tool", "a_tool", "c_tool"]);
    }
}
