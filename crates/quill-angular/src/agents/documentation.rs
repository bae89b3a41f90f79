//! `documentation_tool`: retrieve relevant documentation, summarize it and
//! keep the raw chunks in the router's `relevant_documentation` state.

use serde_json::json;

use quill_contracts::{error::QuillResult, state::MESSAGES_KEY, tool::ToolSpec};
use quill_core::{
    component::PortRef,
    components::{GeneratorComponent, PromptBuilder, TEXT_PORT},
    pipeline::Pipeline,
    tool::{PipelineTool, Tool},
};
use quill_rag::lookup::{DocumentationComponent, DOCUMENTATION_PORT, QUERY_PORT};

use super::{prompts, AgentServices, BUILDER};

pub const DOCUMENTATION_TOOL: &str = "documentation_tool";
/// Router state key holding the retrieved chunks.
pub const RELEVANT_DOCUMENTATION: &str = "relevant_documentation";

const LOOKUP: &str = "documentation";
const GENERATOR: &str = "generator";

pub fn documentation_tool(services: &AgentServices) -> QuillResult<Tool> {
    let mut pipeline = Pipeline::new(DOCUMENTATION_TOOL);
    pipeline.add_component(LOOKUP, DocumentationComponent::new(services.documentation.clone()))?;
    pipeline.add_component(BUILDER, PromptBuilder::new(prompts::DOCUMENTATION_TEMPLATE, &["docs", "query"])?)?;
    pipeline.add_component(GENERATOR, GeneratorComponent::new(services.thinking.clone()))?;

    pipeline.connect(PortRef::new(LOOKUP, DOCUMENTATION_PORT), PortRef::new(BUILDER, "docs"))?;
    pipeline.connect(PortRef::new(BUILDER, MESSAGES_KEY), PortRef::new(GENERATOR, MESSAGES_KEY))?;

    let spec = ToolSpec::new(
        DOCUMENTATION_TOOL,
        "Retrieves Angular documentation and guidelines relevant to a request and loads them into the shared state.",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The user request to find documentation and guidelines for"
                }
            },
            "required": ["query"]
        }),
    );

    PipelineTool::builder(spec, pipeline)
        .bind_argument("query", vec![PortRef::new(BUILDER, "query"), PortRef::new(LOOKUP, QUERY_PORT)])
        .output(PortRef::new(GENERATOR, TEXT_PORT), "summary")
        .output_to_state(PortRef::new(LOOKUP, DOCUMENTATION_PORT), RELEVANT_DOCUMENTATION)
        .build()
}
