//! `todo_tool`: plan the request as a TODO list and save it with
//! `write_todo`. Reads the router's `relevant_documentation`.

use serde_json::json;

use quill_config::QuillConfig;
use quill_contracts::{error::QuillResult, state::MESSAGES_KEY, tool::ToolSpec};
use quill_core::{
    agent_loop::{AgentConfig, AgentLoop, TEXT_PORT},
    component::PortRef,
    components::PromptBuilder,
    pipeline::Pipeline,
    tool::{PipelineTool, Tool, ToolRegistry},
};

use super::{documentation::RELEVANT_DOCUMENTATION, prompts, AgentServices, AGENT, BUILDER};
use crate::tools::TodoWriter;

pub const TODO_TOOL: &str = "todo_tool";

pub fn todo_agent(config: &QuillConfig, services: &AgentServices) -> QuillResult<AgentLoop> {
    let mut tools = ToolRegistry::new();
    tools.register(TodoWriter::new(config.output.result_dir.clone()).into_tool())?;

    AgentLoop::new(
        AgentConfig::new("todo", config.agents.todo_max_steps).with_system_prompt(prompts::TODO_SYSTEM),
        services.thinking.clone(),
        tools,
        services.validator.clone(),
        services.trace.clone(),
    )
}

pub fn todo_tool(config: &QuillConfig, services: &AgentServices) -> QuillResult<Tool> {
    let mut pipeline = Pipeline::new(TODO_TOOL);
    pipeline.add_component(BUILDER, PromptBuilder::new(prompts::TODO_TEMPLATE, &["query", "documentation"])?)?;
    pipeline.add_component(AGENT, todo_agent(config, services)?)?;
    pipeline.connect(PortRef::new(BUILDER, MESSAGES_KEY), PortRef::new(AGENT, MESSAGES_KEY))?;

    let spec = ToolSpec::new(
        TODO_TOOL,
        "Generates and saves a TODO list for the user's request, using the documentation already loaded.",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The user's request to plan"
                }
            },
            "required": ["query"]
        }),
    );

    PipelineTool::builder(spec, pipeline)
        .bind_argument("query", vec![PortRef::new(BUILDER, "query")])
        .input_from_state(RELEVANT_DOCUMENTATION, PortRef::new(BUILDER, "documentation"))
        .output(PortRef::new(AGENT, TEXT_PORT), "text")
        .build()
}
