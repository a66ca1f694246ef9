//! Chat Service
//!
//! Drives one chat turn through the tool-calling loop:
//! build prompt, call the model, parse tool blocks, then either finish or
//! execute the valid calls and continue with their results. The same loop
//! backs the collect form (`send_message`) and the streaming form
//! (`send_message_stream`).

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use paper_desk_core::{ChatStreamEvent, ExecutionContext, ExecutionRecord};
use paper_desk_llm::{CompletionClient, Message, OllamaClient};
use paper_desk_tools::{
    parse_tool_calls, ExecutionLog, ExecutionLogEntry, SharedExecutionLog, ToolExecutor,
    ToolRegistry, TracingExecutionLog,
};

use super::prompt::{
    append_note, history_tail, iteration_limit_note, parse_error_note, TurnPrompt,
    DEFAULT_SYSTEM_PREAMBLE,
};
use super::stream::{until_cancelled, ChatStream, EventSink};
use crate::models::settings::ChatSettings;
use crate::services::focus::{FocusResolver, NoFocusResolver};
use crate::utils::error::{AppError, AppResult};

/// Execution-log purpose for model calls
pub const CHAT_COMPLETION_PURPOSE: &str = "chat.completion";

/// One user message to process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Prior conversation, oldest first
    #[serde(default)]
    pub history: Vec<Message>,
}

impl ChatRequest {
    pub fn new(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            message: message.into(),
            focus_id: None,
            user_id: None,
            history: Vec::new(),
        }
    }

    pub fn with_focus(mut self, focus_id: impl Into<String>) -> Self {
        self.focus_id = Some(focus_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    fn context(&self) -> ExecutionContext {
        ExecutionContext::new(self.session_id.clone())
            .with_focus_opt(self.focus_id.clone())
            .with_user_opt(self.user_id.clone())
    }
}

/// Result of a completed turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    /// Final answer text shown to the user
    pub content: String,
    /// Every executed tool call, in execution order
    pub records: Vec<ExecutionRecord>,
    /// Number of model calls made
    pub iterations: u32,
}

/// Tool-calling chat orchestrator.
///
/// Holds only shared read-only collaborators, so one instance serves any
/// number of concurrent turns.
pub struct ChatService {
    model: Arc<dyn CompletionClient>,
    registry: Arc<ToolRegistry>,
    executor: ToolExecutor,
    focus: Arc<dyn FocusResolver>,
    log: SharedExecutionLog,
    settings: ChatSettings,
}

impl ChatService {
    /// Create a service with no focus resolution and tracing-based audit logging.
    pub fn new(
        model: Arc<dyn CompletionClient>,
        registry: Arc<ToolRegistry>,
        settings: ChatSettings,
    ) -> Self {
        let log: SharedExecutionLog = Arc::new(TracingExecutionLog::new());
        Self {
            model,
            executor: ToolExecutor::new(registry.clone(), log.clone()),
            registry,
            focus: Arc::new(NoFocusResolver),
            log,
            settings,
        }
    }

    /// Create a service backed by an Ollama client built from `settings.model`.
    pub fn from_settings(settings: ChatSettings, registry: Arc<ToolRegistry>) -> AppResult<Self> {
        settings.validate().map_err(AppError::validation)?;
        let model = OllamaClient::new(settings.model.clone())?;
        Ok(Self::new(Arc::new(model), registry, settings))
    }

    pub fn with_focus_resolver(mut self, focus: Arc<dyn FocusResolver>) -> Self {
        self.focus = focus;
        self
    }

    pub fn with_execution_log(mut self, log: SharedExecutionLog) -> Self {
        self.executor = ToolExecutor::new(self.registry.clone(), log.clone());
        self.log = log;
        self
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Run a turn to completion.
    ///
    /// A failed model call fails the turn with `AppError::Model`; everything
    /// else ends in readable content.
    pub async fn send_message(&self, request: ChatRequest) -> AppResult<TurnResult> {
        self.run_turn(&request, None, &CancellationToken::new()).await
    }

    /// Run a turn on a spawned task, returning its event stream.
    ///
    /// Must be called from within a tokio runtime.
    pub fn send_message_stream(self: &Arc<Self>, request: ChatRequest) -> ChatStream {
        let (tx, rx) = mpsc::channel(self.settings.stream_buffer.max(1));
        let cancel = CancellationToken::new();
        let sink = EventSink::new(tx, cancel.clone());
        let service = Arc::clone(self);

        tokio::spawn(async move {
            service.drive_stream(request, sink).await;
        });

        ChatStream::new(rx, cancel)
    }

    async fn drive_stream(&self, request: ChatRequest, sink: EventSink) {
        if sink.emit(ChatStreamEvent::Start).await.is_err() {
            return;
        }

        let outcome = AssertUnwindSafe(self.run_turn(&request, Some(&sink), sink.token()))
            .catch_unwind()
            .await;

        let terminal = match outcome {
            Ok(Ok(turn)) => ChatStreamEvent::Done {
                content: turn.content,
                records: turn.records,
            },
            Ok(Err(AppError::Cancelled(reason))) => {
                tracing::debug!(session_id = %request.session_id, reason = %reason, "chat stream cancelled");
                return;
            }
            Ok(Err(e)) => ChatStreamEvent::Error {
                message: e.to_string(),
            },
            Err(_) => {
                tracing::error!(session_id = %request.session_id, "chat turn panicked");
                ChatStreamEvent::Error {
                    message: AppError::internal("chat turn panicked").to_string(),
                }
            }
        };

        if let Err(e) = sink.emit(terminal).await {
            tracing::debug!(session_id = %request.session_id, error = %e, "terminal event not delivered");
        }
    }

    /// The turn loop shared by both consumption modes.
    async fn run_turn(
        &self,
        request: &ChatRequest,
        events: Option<&EventSink>,
        cancel: &CancellationToken,
    ) -> AppResult<TurnResult> {
        let ctx = request.context();
        let tools = self.registry.available_definitions(ctx.has_focus());
        let focus_entity = match ctx.focus_id() {
            Some(id) => self.focus.lookup_focus_entity(id).await,
            None => None,
        };
        let preamble = self
            .settings
            .system_preamble
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PREAMBLE);
        let prompt = TurnPrompt::new(
            preamble,
            &tools,
            ctx.focus_id(),
            focus_entity.as_ref(),
            history_tail(&request.history, self.settings.history_window),
            &request.message,
        );

        tracing::info!(
            session_id = %request.session_id,
            has_focus = ctx.has_focus(),
            tools = tools.len(),
            "chat turn started"
        );

        let max_iterations = self.settings.max_iterations.max(1);
        let mut next_prompt = prompt.initial();
        let mut records: Vec<ExecutionRecord> = Vec::new();
        let mut iterations = 0u32;

        loop {
            iterations += 1;
            let raw = self.complete(&ctx, &next_prompt, cancel).await?;
            let parsed = parse_tool_calls(&raw);

            if !parsed.has_calls() {
                tracing::info!(session_id = %request.session_id, iterations, "chat turn finished");
                return Ok(TurnResult {
                    content: parsed.clean_text,
                    records,
                    iterations,
                });
            }

            let valid_calls = parsed.valid_calls();
            if valid_calls.is_empty() {
                tracing::warn!(
                    session_id = %request.session_id,
                    invalid = parsed.calls.len(),
                    "model emitted only malformed tool calls"
                );
                let note = parse_error_note(&parsed.parse_errors());
                return Ok(TurnResult {
                    content: append_note(&parsed.clean_text, &note),
                    records,
                    iterations,
                });
            }

            if let Some(sink) = events {
                sink.emit(ChatStreamEvent::Delta {
                    text: parsed.clean_text.clone(),
                })
                .await?;
            }

            tracing::debug!(
                session_id = %request.session_id,
                iteration = iterations,
                calls = valid_calls.len(),
                ignored = parsed.calls.len() - valid_calls.len(),
                "executing tool calls"
            );

            let mut round = Vec::with_capacity(valid_calls.len());
            for call in valid_calls {
                if let Some(sink) = events {
                    sink.emit(ChatStreamEvent::ToolCallStarted {
                        name: call.name.clone(),
                    })
                    .await?;
                }

                let record = until_cancelled(cancel, self.executor.execute(call, &ctx)).await?;

                if let Some(sink) = events {
                    sink.emit(ChatStreamEvent::ToolCallFinished {
                        name: record.tool_name.clone(),
                        success: record.success,
                        error: record.error.clone(),
                    })
                    .await?;
                }
                round.push(record);
            }
            records.extend(round.iter().cloned());

            if iterations >= max_iterations {
                tracing::warn!(
                    session_id = %request.session_id,
                    max_iterations,
                    "chat turn hit the iteration ceiling"
                );
                return Ok(TurnResult {
                    content: append_note(&parsed.clean_text, &iteration_limit_note(max_iterations)),
                    records,
                    iterations,
                });
            }

            next_prompt = prompt.continuation(&raw, &round);
        }
    }

    /// One model call, reported to the execution log.
    async fn complete(
        &self,
        ctx: &ExecutionContext,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        let start = Instant::now();
        let result = until_cancelled(cancel, self.model.complete(prompt)).await?;
        let elapsed = start.elapsed();

        match result {
            Ok(text) => {
                self.log.log(ExecutionLogEntry::new(
                    CHAT_COMPLETION_PURPOSE,
                    ctx.session_id(),
                    prompt,
                    &text,
                    elapsed,
                ));
                Ok(text)
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %ctx.session_id(),
                    model = %self.model.model(),
                    error = %e,
                    "model call failed"
                );
                self.log.log(
                    ExecutionLogEntry::new(CHAT_COMPLETION_PURPOSE, ctx.session_id(), prompt, "", elapsed)
                        .with_error(e.to_string()),
                );
                Err(AppError::Model(e))
            }
        }
    }
}
