//! `skill_tool`: summarize the skill format, then let the skills agent
//! create any missing `SKILL.md` bundles for the request.
//!
//!   definitions → summarizer prompt → thinking generator → request prompt → skills agent

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use quill_config::QuillConfig;
use quill_contracts::{
    error::{QuillError, QuillResult},
    state::MESSAGES_KEY,
    tool::ToolSpec,
};
use quill_core::{
    agent_loop::{AgentConfig, AgentLoop, TEXT_PORT},
    component::{Component, InputPort, PortRef, PortValues},
    components::{GeneratorComponent, PromptBuilder, REPLIES_PORT},
    pipeline::Pipeline,
    tool::{PipelineTool, Tool, ToolRegistry},
    traits::ContentFetcher,
};
use quill_rag::{DocumentCleaner, DocumentConverter};

use super::{prompts, AgentServices, AGENT, BUILDER};
use crate::tools::SkillLibrary;

pub const SKILL_TOOL: &str = "skill_tool";
pub const DOCUMENTS_PORT: &str = "documents";

const DEFINITIONS: &str = "definitions";
const SUMMARIZER: &str = "summarizer";
const CHAT_SUMMARIZER: &str = "chat_summarizer";

/// Fetches a fixed list of pages and outputs them as cleaned documents.
/// Pages that fail to fetch are left out.
pub struct DefinitionFetcher {
    urls: Vec<String>,
    fetcher: Arc<dyn ContentFetcher>,
    converter: DocumentConverter,
    cleaner: DocumentCleaner,
}

impl DefinitionFetcher {
    pub fn new(urls: Vec<String>, fetcher: Arc<dyn ContentFetcher>) -> QuillResult<Self> {
        Ok(Self {
            urls,
            fetcher,
            converter: DocumentConverter::new("url")?,
            cleaner: DocumentCleaner::new(),
        })
    }
}

impl Component for DefinitionFetcher {
    fn input_ports(&self) -> Vec<InputPort> {
        Vec::new()
    }

    fn output_ports(&self) -> Vec<String> {
        vec![DOCUMENTS_PORT.to_string()]
    }

    fn run(&self, _inputs: PortValues) -> QuillResult<PortValues> {
        let mut streams = Vec::new();
        for outcome in self.fetcher.fetch(&self.urls) {
            match outcome.result {
                Ok(stream) => streams.push(stream),
                Err(e) => warn!(url = %outcome.url, error = %e, "skill definition fetch failed"),
            }
        }
        let documents = self.cleaner.clean_all(&self.converter.convert_all(&streams));
        debug!(requested = self.urls.len(), documents = documents.len(), "skill definitions loaded");

        let encoded = serde_json::to_value(documents).map_err(|e| QuillError::StoreFailure {
            reason: format!("documents are not serializable: {e}"),
        })?;
        let mut outputs = PortValues::new();
        outputs.insert(DOCUMENTS_PORT.to_string(), encoded);
        Ok(outputs)
    }
}

pub fn skills_agent(config: &QuillConfig, services: &AgentServices) -> QuillResult<AgentLoop> {
    let library = SkillLibrary::new(config.skills.skills_dir.clone(), config.skills.example_skills_dir.clone());

    let mut tools = ToolRegistry::new();
    tools.register(library.read_examples_tool())?;
    tools.register(library.read_descriptions_tool())?;
    tools.register(library.write_skill_tool())?;

    AgentLoop::new(
        AgentConfig::new("skills", config.agents.default_max_steps).with_system_prompt(prompts::SKILLS_SYSTEM),
        services.thinking.clone(),
        tools,
        services.validator.clone(),
        services.trace.clone(),
    )
}

pub fn skill_tool(config: &QuillConfig, services: &AgentServices) -> QuillResult<Tool> {
    let mut pipeline = Pipeline::new(SKILL_TOOL);
    pipeline.add_component(
        DEFINITIONS,
        DefinitionFetcher::new(config.skills.definition_sources.clone(), services.fetcher.clone())?,
    )?;
    pipeline.add_component(SUMMARIZER, PromptBuilder::new(prompts::SKILL_SUMMARY_TEMPLATE, &["docs"])?)?;
    pipeline.add_component(CHAT_SUMMARIZER, GeneratorComponent::new(services.thinking.clone()))?;
    pipeline.add_component(
        BUILDER,
        PromptBuilder::new(prompts::SKILL_REQUEST_TEMPLATE, &["replies", "query"])?,
    )?;
    pipeline.add_component(AGENT, skills_agent(config, services)?)?;

    pipeline.connect(PortRef::new(DEFINITIONS, DOCUMENTS_PORT), PortRef::new(SUMMARIZER, "docs"))?;
    pipeline.connect(PortRef::new(SUMMARIZER, MESSAGES_KEY), PortRef::new(CHAT_SUMMARIZER, MESSAGES_KEY))?;
    pipeline.connect(PortRef::new(CHAT_SUMMARIZER, REPLIES_PORT), PortRef::new(BUILDER, "replies"))?;
    pipeline.connect(PortRef::new(BUILDER, MESSAGES_KEY), PortRef::new(AGENT, MESSAGES_KEY))?;

    let spec = ToolSpec::new(
        SKILL_TOOL,
        "Identifies the skills a request needs and creates the ones that do not exist yet.",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The user request to identify skills for"
                }
            },
            "required": ["query"]
        }),
    );

    PipelineTool::builder(spec, pipeline)
        .bind_argument("query", vec![PortRef::new(BUILDER, "query")])
        .output(PortRef::new(AGENT, TEXT_PORT), "text")
        .build()
}
