//! Paper Desk Tools
//!
//! Text-protocol tool calling for models without native function calling:
//! - `parser` - `tool` block parsing, prompt instructions and result formatting
//! - `ToolRegistry` - name-keyed catalogue with focus-aware listing
//! - `FunctionTool` - closure-based tool creation
//! - `ToolExecutor` - validation, coercion and isolated execution of calls
//! - `ExecutionLog` - audit sink for model calls and tool executions

pub mod executor;
pub mod log;
pub mod parser;
pub mod registry;

// Re-export core types
pub use executor::{coerce_arguments, ToolExecutor};
pub use log::{
    ExecutionLog, ExecutionLogEntry, MemoryExecutionLog, SharedExecutionLog, TracingExecutionLog,
};
pub use parser::{
    build_tool_call_instructions, extract_text_without_tool_calls, format_execution_results,
    parse_tool_calls, ParseResult, ParsedCall, INVALID_CALL_NAME,
};
pub use registry::{FunctionTool, FunctionToolHandler, ToolRegistry};
