//! The router: the top-level agent that decides which tool runs next.

use quill_config::QuillConfig;
use quill_contracts::{
    error::QuillResult,
    state::{StateSchema, ValueType},
};
use quill_core::{
    agent_loop::{AgentConfig, AgentLoop},
    tool::ToolRegistry,
};

use super::{
    coder::coder_tool,
    documentation::{documentation_tool, RELEVANT_DOCUMENTATION},
    prompts,
    skills::skill_tool,
    todo::todo_tool,
    AgentServices,
};

pub const ROUTER: &str = "router";

/// Build the router with its four tools, offered in this order:
/// documentation, skills, todo, coder.
pub fn router_agent(config: &QuillConfig, services: &AgentServices) -> QuillResult<AgentLoop> {
    let mut tools = ToolRegistry::new();
    tools.register(documentation_tool(services)?)?;
    tools.register(skill_tool(config, services)?)?;
    tools.register(todo_tool(config, services)?)?;
    tools.register(coder_tool(config, services)?)?;

    AgentLoop::new(
        AgentConfig::new(ROUTER, config.agents.router_max_steps)
            .with_system_prompt(prompts::ROUTER_SYSTEM)
            .with_state_schema(StateSchema::new().with(RELEVANT_DOCUMENTATION, ValueType::List)),
        services.thinking.clone(),
        tools,
        services.validator.clone(),
        services.trace.clone(),
    )
}
