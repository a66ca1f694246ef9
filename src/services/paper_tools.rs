//! Built-in Paper Tools
//!
//! Tools every Paper Desk host gets out of the box:
//! - `get_document_info` - metadata of the focused paper (requires focus)
//! - `cite` - formats a citation from supplied fields

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use paper_desk_core::{
    CoreResult, ExecutionContext, ParameterType, Tool, ToolArguments, ToolDefinition,
    ToolOutcome, ToolParameter,
};
use paper_desk_tools::ToolRegistry;

use crate::services::focus::FocusResolver;

/// Register the built-in tools.
pub fn register_builtin_tools(
    registry: &mut ToolRegistry,
    focus: Arc<dyn FocusResolver>,
) -> CoreResult<()> {
    registry.register(Arc::new(DocumentInfoTool::new(focus)))?;
    registry.register(Arc::new(CiteTool::new()))?;
    Ok(())
}

/// Returns metadata for the focused paper.
pub struct DocumentInfoTool {
    definition: ToolDefinition,
    focus: Arc<dyn FocusResolver>,
}

impl DocumentInfoTool {
    pub fn new(focus: Arc<dyn FocusResolver>) -> Self {
        Self {
            definition: ToolDefinition::new(
                "get_document_info",
                "Get the title, authors, year and abstract of the paper the user has open.",
            )
            .with_requires_focus(true),
            focus,
        }
    }
}

#[async_trait]
impl Tool for DocumentInfoTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, _args: &ToolArguments, ctx: &ExecutionContext) -> ToolOutcome {
        let Some(focus_id) = ctx.focus_id() else {
            return ToolOutcome::err("no document is open");
        };
        match self.focus.lookup_focus_entity(focus_id).await {
            Some(entity) => match serde_json::to_value(&entity) {
                Ok(value) => ToolOutcome::ok(value),
                Err(e) => ToolOutcome::err(format!("failed to serialize document info: {}", e)),
            },
            None => ToolOutcome::err(format!("document '{}' was not found", focus_id)),
        }
    }
}

/// Citation styles understood by `cite`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationStyle {
    Apa,
    Mla,
}

impl CitationStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "apa" => Some(Self::Apa),
            "mla" => Some(Self::Mla),
            _ => None,
        }
    }
}

/// Formats a citation string.
pub struct CiteTool {
    definition: ToolDefinition,
}

impl CiteTool {
    pub fn new() -> Self {
        Self {
            definition: ToolDefinition::new(
                "cite",
                "Format a citation for a paper from its title, authors and year.",
            )
            .with_parameter(ToolParameter::required(
                "title",
                ParameterType::String,
                "Paper title",
            ))
            .with_parameter(ToolParameter::required(
                "authors",
                ParameterType::Array,
                "Author names in order",
            ))
            .with_parameter(ToolParameter::optional(
                "year",
                ParameterType::Number,
                "Publication year",
            ))
            .with_parameter(
                ToolParameter::optional("style", ParameterType::String, "Citation style: apa or mla")
                    .with_default("apa"),
            ),
        }
    }
}

impl Default for CiteTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CiteTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: &ToolArguments, _ctx: &ExecutionContext) -> ToolOutcome {
        let title = args.get_str("title").unwrap_or_default().trim();
        if title.is_empty() {
            return ToolOutcome::err("title cannot be empty");
        }
        let authors: Vec<&str> = args
            .get_list("authors")
            .unwrap_or_default()
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect();
        if authors.is_empty() {
            return ToolOutcome::err("at least one author is required");
        }
        let style_name = args.get_str("style").unwrap_or("apa");
        let Some(style) = CitationStyle::parse(style_name) else {
            return ToolOutcome::err(format!(
                "unsupported citation style '{}'; use apa or mla",
                style_name
            ));
        };
        let year = args.get_i64("year");

        let citation = format_citation(style, title, &authors, year);
        ToolOutcome::ok(json!({ "citation": citation })).with_metadata("style", style_name)
    }
}

/// Render a citation in the given style.
pub fn format_citation(
    style: CitationStyle,
    title: &str,
    authors: &[&str],
    year: Option<i64>,
) -> String {
    let title = title.trim_end_matches('.');
    match style {
        CitationStyle::Apa => {
            let names = match authors {
                [] => String::new(),
                [only] => only.to_string(),
                [first, second] => format!("{} & {}", first, second),
                [rest @ .., last] => format!("{}, & {}", rest.join(", "), last),
            };
            let year = year.map(|y| y.to_string()).unwrap_or_else(|| "n.d.".to_string());
            format!("{} ({}). {}.", names, year, title)
        }
        CitationStyle::Mla => {
            let names = match authors {
                [] => String::new(),
                [only] => only.to_string(),
                [first, second] => format!("{} and {}", first, second),
                [first, ..] => format!("{}, et al", first),
            };
            match year {
                Some(year) => format!("{}. \"{}.\" {}.", names, title, year),
                None => format!("{}. \"{}.\"", names, title),
            }
        }
    }
}
