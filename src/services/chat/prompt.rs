//! Prompt Assembly
//!
//! Builds the text prompts for one chat turn. The model sees a single text
//! document: preamble, tool catalogue, focused paper, recent history and the
//! user message. Continuations append the previous raw response and the
//! execution results.

use paper_desk_core::{ExecutionRecord, ToolDefinition};
use paper_desk_llm::Message;
use paper_desk_tools::{build_tool_call_instructions, format_execution_results};

use crate::services::focus::FocusEntity;

/// Preamble used unless settings override it
pub const DEFAULT_SYSTEM_PREAMBLE: &str = "You are Paper Desk, a research assistant that helps \
the user read, organise and cite academic papers. Answer accurately and concisely. When a tool \
can give you facts you do not have, call it instead of guessing.";

/// The prompt parts fixed for the whole turn.
#[derive(Debug, Clone)]
pub struct TurnPrompt {
    context: String,
    user_message: String,
}

impl TurnPrompt {
    pub fn new(
        preamble: &str,
        tools: &[ToolDefinition],
        focus_id: Option<&str>,
        focus: Option<&FocusEntity>,
        history: &[Message],
        user_message: &str,
    ) -> Self {
        let mut context = String::new();
        context.push_str(preamble.trim());
        context.push_str("\n\n");
        context.push_str(build_tool_call_instructions(tools).trim_end());
        context.push_str("\n\n");

        match (focus_id, focus) {
            (_, Some(entity)) => {
                context.push_str("## Open Document\n\nThe user currently has this paper open:\n");
                context.push_str(&entity.summary());
                context.push_str("\n\n");
            }
            (Some(id), None) => {
                context.push_str(&format!(
                    "## Open Document\n\nThe user has a document open (id: {}), but its details are unavailable.\n\n",
                    id
                ));
            }
            (None, None) => {}
        }

        if !history.is_empty() {
            context.push_str("## Conversation So Far\n\n");
            for message in history {
                context.push_str(&format!(
                    "{}: {}\n\n",
                    message.role.label(),
                    message.content.trim()
                ));
            }
        }

        Self {
            context,
            user_message: user_message.trim().to_string(),
        }
    }

    /// Prompt for the first model call of the turn.
    pub fn initial(&self) -> String {
        format!(
            "{}User: {}\n\nAssistant:",
            self.context, self.user_message
        )
    }

    /// Prompt for a follow-up model call after tools ran.
    pub fn continuation(&self, last_response: &str, records: &[ExecutionRecord]) -> String {
        format!(
            "{}User: {}\n\nAssistant: {}\n\n## Tool Results\n\n{}\n\n\
Use these results to continue. Call another tool only if you still need information; \
otherwise answer the user directly without any tool block.\n\nAssistant:",
            self.context,
            self.user_message,
            last_response.trim(),
            format_execution_results(records)
        )
    }
}

/// The trailing `window` messages of `history`.
pub fn history_tail(history: &[Message], window: usize) -> &[Message] {
    &history[history.len().saturating_sub(window)..]
}

/// Note appended when every tool block in a response was malformed.
pub fn parse_error_note(errors: &[&str]) -> String {
    let mut note = String::from(
        "Note: a tool request in this answer could not be understood, so no tool was run.",
    );
    for error in errors {
        note.push_str(&format!("\n- {}", error));
    }
    note
}

/// Note appended when the turn stops at the iteration ceiling.
pub fn iteration_limit_note(max_iterations: u32) -> String {
    format!(
        "Note: I stopped after {} rounds of tool use without reaching a final answer. \
Please try rephrasing or narrowing your question.",
        max_iterations
    )
}

/// Join answer text and a trailing note.
pub fn append_note(text: &str, note: &str) -> String {
    if text.trim().is_empty() {
        note.to_string()
    } else {
        format!("{}\n\n{}", text.trim_end(), note)
    }
}
