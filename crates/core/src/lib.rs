//! Paper Desk Core
//!
//! Foundational types for the Paper Desk tool-calling chat orchestrator. This
//! crate has no dependencies on model clients, storage, or the application
//! crate.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `context` - Per-turn `ExecutionContext`
//! - `tool_trait` - Tool capability model (`Tool`, `ToolDefinition`, `ToolOutcome`, ...)
//! - `streaming` - Stream events for the incremental chat mode

pub mod context;
pub mod error;
pub mod streaming;
pub mod tool_trait;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Execution Context ──────────────────────────────────────────────────
pub use context::ExecutionContext;

// ── Tool Capability Model ──────────────────────────────────────────────
pub use tool_trait::{
    ExecutionRecord, ParameterType, Tool, ToolArguments, ToolDefinition, ToolOutcome,
    ToolParameter, ToolValue,
};

// ── Streaming Types ────────────────────────────────────────────────────
pub use streaming::ChatStreamEvent;
