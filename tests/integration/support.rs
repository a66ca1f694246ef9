//! Test doubles shared by the integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use paper_desk::{ChatService, ChatSettings};
use paper_desk_core::{
    ExecutionContext, ParameterType, Tool, ToolArguments, ToolDefinition, ToolOutcome,
    ToolParameter,
};
use paper_desk_llm::{CompletionClient, LlmResult};
use paper_desk_tools::{MemoryExecutionLog, ToolRegistry};

/// Model stub replying from a script; the last reply repeats forever.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<LlmResult<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<LlmResult<String>>) -> Arc<Self> {
        assert!(!replies.is_empty(), "script needs at least one reply");
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn texts(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().unwrap()
        }
    }
}

/// Tool that counts invocations and echoes its coerced arguments.
pub struct CountingTool {
    definition: ToolDefinition,
    calls: AtomicUsize,
}

impl CountingTool {
    pub fn new(definition: ToolDefinition) -> Arc<Self> {
        Arc::new(Self {
            definition,
            calls: AtomicUsize::new(0),
        })
    }

    /// `get_page(page: number, required)`, bound to the focused paper.
    pub fn get_page() -> Arc<Self> {
        Self::new(
            ToolDefinition::new("get_page", "Read one page of the open paper")
                .with_parameter(ToolParameter::required(
                    "page",
                    ParameterType::Number,
                    "1-based page number",
                ))
                .with_requires_focus(true),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for CountingTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, args: &ToolArguments, _ctx: &ExecutionContext) -> ToolOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ToolOutcome::ok(args.to_json())
    }
}

/// Tool that never completes.
pub struct HangingTool {
    definition: ToolDefinition,
    calls: AtomicUsize,
}

impl HangingTool {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            definition: ToolDefinition::new("wait_forever", "Never returns"),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for HangingTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, _args: &ToolArguments, _ctx: &ExecutionContext) -> ToolOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<ToolOutcome>().await
    }
}

/// Build a service over `model` and `tools`, logging into memory.
pub fn service_with(
    model: Arc<ScriptedModel>,
    tools: Vec<Arc<dyn Tool>>,
    settings: ChatSettings,
) -> (Arc<ChatService>, Arc<MemoryExecutionLog>) {
    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(tool).unwrap();
    }
    let log = Arc::new(MemoryExecutionLog::new());
    let service = ChatService::new(model, Arc::new(registry), settings)
        .with_execution_log(log.clone());
    (Arc::new(service), log)
}

/// A response consisting of one `tool` block.
pub fn tool_block(json: &str) -> String {
    format!("```tool\n{}\n```", json)
}
