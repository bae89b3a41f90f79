//! `coder_tool`: write Angular code for a request with the coder model.

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

use super::{prompts, AgentServices, AGENT, BUILDER};

pub const CODER_TOOL: &str = "coder_tool";

pub fn coder_tool(config: &QuillConfig, services: &AgentServices) -> QuillResult<Tool> {
    let agent = AgentLoop::new(
        AgentConfig::new("coder", config.agents.default_max_steps).with_system_prompt(prompts::CODER_SYSTEM),
        services.coder.clone(),
        ToolRegistry::new(),
        services.validator.clone(),
        services.trace.clone(),
    )?;

    let mut pipeline = Pipeline::new(CODER_TOOL);
    pipeline.add_component(BUILDER, PromptBuilder::new(prompts::CODER_TEMPLATE, &["query"])?)?;
    pipeline.add_component(AGENT, agent)?;
    pipeline.connect(PortRef::new(BUILDER, MESSAGES_KEY), PortRef::new(AGENT, MESSAGES_KEY))?;

    let spec = ToolSpec::new(
        CODER_TOOL,
        "Writes Angular code for the user's request.",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The user's request, with any documentation the code must follow"
                }
            },
            "required": ["query"]
        }),
    );

    PipelineTool::builder(spec, pipeline)
        .bind_argument("query", vec![PortRef::new(BUILDER, "query")])
        .output(PortRef::new(AGENT, TEXT_PORT), "code")
        .build()
}
