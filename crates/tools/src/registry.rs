//! Tool Registry
//!
//! Name-keyed catalogue of the capabilities the model may invoke, plus
//! `FunctionTool` for building a tool from an async closure.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use paper_desk_core::{
    CoreError, CoreResult, ExecutionContext, Tool, ToolArguments, ToolDefinition, ToolOutcome,
};

/// Registry of available tools.
///
/// Provides O(1) lookup by name and keeps registration order so the
/// catalogue rendered into prompts is deterministic.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Insertion order for deterministic iteration
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a tool. Names are unique; a second tool with the same name
    /// is rejected and the registry is left unchanged. A definition that
    /// fails `ToolDefinition::validate` is rejected as well.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> CoreResult<()> {
        tool.definition().validate()?;
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(CoreError::duplicate_tool(name));
        }
        tracing::debug!(tool = %name, requires_focus = tool.requires_focus(), "registered tool");
        self.order.push(name.clone());
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Definitions the model may use right now, in registration order.
    ///
    /// Focus-requiring tools are omitted when no focus entity is set.
    pub fn available_definitions(&self, has_focus: bool) -> Vec<ToolDefinition> {
        self.iter()
            .filter(|tool| has_focus || !tool.requires_focus())
            .map(|tool| tool.definition().clone())
            .collect()
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered names in registration order.
    ///
    /// `Some(flag)` keeps only tools whose `requires_focus` equals `flag`.
    pub fn names(&self, requires_focus: Option<bool>) -> Vec<String> {
        self.iter()
            .filter(|tool| match requires_focus {
                Some(flag) => tool.requires_focus() == flag,
                None => true,
            })
            .map(|tool| tool.name().to_string())
            .collect()
    }

    /// Remove every tool.
    pub fn unregister_all(&mut self) {
        self.tools.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.order.iter().filter_map(|name| self.tools.get(name))
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ── FunctionTool ─────────────────────────────────────────────────────

/// Async handler used by `FunctionTool`.
///
/// Receives owned copies of the coerced arguments and the execution context.
pub type FunctionToolHandler =
    Box<dyn Fn(ToolArguments, ExecutionContext) -> BoxFuture<'static, ToolOutcome> + Send + Sync>;

/// A tool created from an async closure.
///
/// ```ignore
/// let tool = FunctionTool::new(
///     ToolDefinition::new("echo", "Echoes the input")
///         .with_parameter(ToolParameter::required("message", ParameterType::String, "Text")),
///     |args, _ctx| Box::pin(async move {
///         ToolOutcome::ok(args.get_str("message").unwrap_or_default().to_string())
///     }),
/// );
/// ```
pub struct FunctionTool {
    definition: ToolDefinition,
    handler: FunctionToolHandler,
}

impl FunctionTool {
    pub fn new<F>(definition: ToolDefinition, handler: F) -> Self
    where
        F: Fn(ToolArguments, ExecutionContext) -> BoxFuture<'static, ToolOutcome>
            + Send
            + Sync
            + 'static,
    {
        Self {
            definition,
            handler: Box::new(handler),
        }
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ExecutionContext) -> ToolOutcome {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}
