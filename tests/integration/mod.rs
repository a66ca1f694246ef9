//! Integration Tests Module
//!
//! End-to-end tests for the Paper Desk chat orchestrator: the text tool
//! protocol, the registry and executor, and both consumption modes of a turn.

// Shared scripted model and counting tools
mod support;

// Tool block protocol, registry and executor through the public API
mod prompt_protocol_test;

// Collect-mode turn scenarios
mod chat_orchestrator_test;
