//! Execution Log
//!
//! Append-only record of every model call and tool execution, kept for audit.
//!
//! Implementations:
//! - `TracingExecutionLog`: emits one `tracing` event per entry
//! - `MemoryExecutionLog`: keeps entries in memory, for tests and inspection

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tracing target used for audit events.
pub const AUDIT_TARGET: &str = "paper_desk::audit";

/// Summaries longer than this are truncated.
pub const MAX_SUMMARY_CHARS: usize = 500;

/// One audited operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    /// What ran: `chat.completion` for model calls, `tool.<name>` for tools
    pub purpose: String,
    pub session_id: String,
    pub input_summary: String,
    pub output_summary: String,
    pub duration_ms: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionLogEntry {
    pub fn new(
        purpose: impl Into<String>,
        session_id: impl Into<String>,
        input_summary: &str,
        output_summary: &str,
        duration: Duration,
    ) -> Self {
        Self {
            purpose: purpose.into(),
            session_id: session_id.into(),
            input_summary: truncate_summary(input_summary),
            output_summary: truncate_summary(output_summary),
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            success: true,
            error: None,
        }
    }

    /// Mark the entry as failed.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// Sink for execution log entries.
///
/// Logging must never fail the operation being logged, so `log` is infallible.
pub trait ExecutionLog: Send + Sync {
    fn log(&self, entry: ExecutionLogEntry);
}

/// Type alias for a shared execution log
pub type SharedExecutionLog = Arc<dyn ExecutionLog>;

/// Writes entries as structured `tracing` events on [`AUDIT_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingExecutionLog;

impl TracingExecutionLog {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutionLog for TracingExecutionLog {
    fn log(&self, entry: ExecutionLogEntry) {
        if entry.success {
            tracing::info!(
                target: AUDIT_TARGET,
                purpose = %entry.purpose,
                session_id = %entry.session_id,
                duration_ms = entry.duration_ms,
                input = %entry.input_summary,
                output = %entry.output_summary,
                "operation succeeded"
            );
        } else {
            tracing::warn!(
                target: AUDIT_TARGET,
                purpose = %entry.purpose,
                session_id = %entry.session_id,
                duration_ms = entry.duration_ms,
                input = %entry.input_summary,
                error = entry.error.as_deref().unwrap_or(""),
                "operation failed"
            );
        }
    }
}

/// Keeps every entry in memory.
#[derive(Debug, Default)]
pub struct MemoryExecutionLog {
    entries: Mutex<Vec<ExecutionLogEntry>>,
}

impl MemoryExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries in append order.
    pub fn entries(&self) -> Vec<ExecutionLogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Entries whose purpose matches exactly.
    pub fn entries_for(&self, purpose: &str) -> Vec<ExecutionLogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.purpose == purpose)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExecutionLog for MemoryExecutionLog {
    fn log(&self, entry: ExecutionLogEntry) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

/// Truncate to [`MAX_SUMMARY_CHARS`] characters on a char boundary.
pub fn truncate_summary(text: &str) -> String {
    match text.char_indices().nth(MAX_SUMMARY_CHARS) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}
