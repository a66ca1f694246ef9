//! Chat Stream Event Types
//!
//! Events emitted by the streaming form of a chat turn. They are serde-tagged
//! so a UI bridge can forward them as-is.
//!
//! Ordering guarantees for one turn:
//! - `Start` is emitted first and exactly once
//! - every `ToolCallFinished` follows its matching `ToolCallStarted`
//! - exactly one terminal event (`Done` or `Error`) is emitted last

use serde::{Deserialize, Serialize};

use crate::tool_trait::ExecutionRecord;

/// Streaming event for one chat turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatStreamEvent {
    /// The turn has started
    Start,

    /// Text of an intermediate model response (tool blocks removed)
    Delta { text: String },

    /// A validated tool call is about to run
    ToolCallStarted { name: String },

    /// A tool call has finished
    ToolCallFinished {
        name: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Turn complete with the final answer
    Done {
        content: String,
        records: Vec<ExecutionRecord>,
    },

    /// Turn failed
    Error { message: String },
}

impl ChatStreamEvent {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatStreamEvent::Done { .. } | ChatStreamEvent::Error { .. })
    }

    /// Snake-case event name, matching the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatStreamEvent::Start => "start",
            ChatStreamEvent::Delta { .. } => "delta",
            ChatStreamEvent::ToolCallStarted { .. } => "tool_call_started",
            ChatStreamEvent::ToolCallFinished { .. } => "tool_call_finished",
            ChatStreamEvent::Done { .. } => "done",
            ChatStreamEvent::Error { .. } => "error",
        }
    }
}
