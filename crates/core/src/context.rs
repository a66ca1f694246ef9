//! Execution Context
//!
//! The per-turn context handed to every tool invocation. A context is built
//! once by the orchestrator at the start of a turn and is read-only from then
//! on: fields are private and there are no setters, so tools cannot mutate
//! session state or leak it into another turn.

use serde::{Deserialize, Serialize};

/// Immutable context for a single chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    focus_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

impl ExecutionContext {
    /// Create a context for the given session with no focus entity.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            focus_id: None,
            user_id: None,
        }
    }

    /// Set the focus entity (e.g. the open paper).
    pub fn with_focus(mut self, focus_id: impl Into<String>) -> Self {
        self.focus_id = Some(focus_id.into());
        self
    }

    /// Set the focus entity from an optional id.
    pub fn with_focus_opt(mut self, focus_id: Option<String>) -> Self {
        self.focus_id = focus_id;
        self
    }

    /// Set the acting user.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the acting user from an optional id.
    pub fn with_user_opt(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn focus_id(&self) -> Option<&str> {
        self.focus_id.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Whether a focus entity is set for this turn.
    pub fn has_focus(&self) -> bool {
        self.focus_id.is_some()
    }
}
