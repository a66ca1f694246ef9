//! Tool Protocol Integration Tests
//!
//! Exercises the parser, registry and executor together through the public
//! API, the way the chat service wires them.

use std::sync::Arc;

use paper_desk::{register_builtin_tools, FocusEntity, StaticFocusResolver};
use paper_desk_core::{ExecutionContext, Tool, ToolDefinition};
use paper_desk_tools::{
    build_tool_call_instructions, parse_tool_calls, MemoryExecutionLog, ToolExecutor,
    ToolRegistry,
};

use crate::support::{tool_block, CountingTool};

// ============================================================================
// Parser
// ============================================================================

#[test]
fn test_text_without_blocks_is_only_normalized() {
    let text = "First line.<!-- hidden -->\n\n\n\nSecond line.\n";
    let result = parse_tool_calls(text);
    assert!(!result.has_calls());
    assert_eq!(result.clean_text, "First line.\n\nSecond line.");
}

#[test]
fn test_well_formed_block_yields_one_valid_call() {
    let text = format!(
        "Let me check.\n{}\n",
        tool_block(r#"{"name": "get_page", "arguments": {"page": 3}}"#)
    );
    let result = parse_tool_calls(&text);
    assert_eq!(result.valid_calls().len(), 1);
    assert_eq!(result.calls[0].name, "get_page");
    assert_eq!(result.calls[0].arguments["page"], 3);
    assert!(!result.clean_text.contains("```"));
    assert_eq!(result.clean_text, "Let me check.");
}

#[test]
fn test_malformed_block_is_excluded_from_valid_calls() {
    let result = parse_tool_calls(&tool_block(r#"{"name": "get_page", "arguments": {"page": }"#));
    assert_eq!(result.calls.len(), 1);
    assert!(result.valid_calls().is_empty());
    assert_eq!(result.invalid_calls()[0].name, "invalid");
}

#[test]
fn test_catalogue_roundtrips_through_parser() {
    // the worked example in the instructions must itself parse as a call
    let defs = vec![ToolDefinition::new("cite", "Format a citation")];
    let instructions = build_tool_call_instructions(&defs);
    let example = instructions
        .split("## Example")
        .nth(1)
        .expect("instructions contain an example section");
    let parsed = parse_tool_calls(example);
    assert!(parsed.all_valid());
    assert_eq!(parsed.calls[0].name, "cite");
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn test_registry_filters_by_focus() {
    let mut registry = ToolRegistry::new();
    registry
        .register(CountingTool::new(
            ToolDefinition::new("a", "needs a paper").with_requires_focus(true),
        ))
        .unwrap();
    registry
        .register(CountingTool::new(ToolDefinition::new("b", "works anywhere")))
        .unwrap();

    let names = |has_focus| -> Vec<String> {
        registry
            .available_definitions(has_focus)
            .into_iter()
            .map(|d| d.name)
            .collect()
    };
    assert_eq!(names(false), vec!["b"]);
    assert_eq!(names(true), vec!["a", "b"]);
}

// ============================================================================
// Executor
// ============================================================================

fn executor_with(tool: Arc<CountingTool>) -> (ToolExecutor, Arc<MemoryExecutionLog>) {
    let mut registry = ToolRegistry::new();
    registry.register(tool).unwrap();
    let log = Arc::new(MemoryExecutionLog::new());
    (ToolExecutor::new(Arc::new(registry), log.clone()), log)
}

#[tokio::test]
async fn test_missing_required_parameter_never_invokes_tool() {
    let tool = CountingTool::get_page();
    let (executor, log) = executor_with(tool.clone());
    let call = parse_tool_calls(&tool_block(r#"{"name": "get_page", "arguments": {}}"#))
        .calls
        .remove(0);

    let ctx = ExecutionContext::new("s").with_focus("paper-1");
    let record = executor.execute(&call, &ctx).await;

    assert!(!record.success);
    assert_eq!(record.error.as_deref(), Some("missing required parameter: page"));
    assert_eq!(tool.calls(), 0);
    assert_eq!(log.len(), 1);
}

#[tokio::test]
async fn test_execute_is_total_for_arbitrary_input() {
    let tool = CountingTool::get_page();
    let (executor, _log) = executor_with(tool.clone());
    let ctx = ExecutionContext::new("s");

    let inputs = [
        tool_block("not json at all"),
        tool_block(r#"{"name": "nope", "arguments": {}}"#),
        tool_block(r#"{"name": "get_page", "arguments": {"page": 1}}"#),
        tool_block(r#"{"name": "get_page", "arguments": {"page": [1]}}"#),
        "```tool\n{\"name\": \"get_page\"".to_string(),
    ];
    for input in &inputs {
        for call in parse_tool_calls(input).calls {
            let record = executor.execute(&call, &ctx).await;
            assert!(!record.success, "{} should fail without focus", input);
            assert!(record.error.is_some());
        }
    }
    assert_eq!(tool.calls(), 0);
}

#[tokio::test]
async fn test_builtin_tools_through_executor() {
    let focus = Arc::new(
        StaticFocusResolver::new().with_entity(
            FocusEntity::new("paper-1", "BERT").with_authors(["Devlin", "Chang"]),
        ),
    );
    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry, focus).unwrap();
    let executor = ToolExecutor::new(Arc::new(registry), Arc::new(MemoryExecutionLog::new()));

    let ctx = ExecutionContext::new("s").with_focus("paper-1");
    let info = parse_tool_calls(&tool_block(r#"{"name": "get_document_info"}"#))
        .calls
        .remove(0);
    let record = executor.execute(&info, &ctx).await;
    assert!(record.success);
    assert_eq!(record.data.unwrap()["title"], "BERT");

    let cite = parse_tool_calls(&tool_block(
        r#"{"name": "cite", "arguments": {"title": "BERT", "authors": ["Devlin", "Chang"], "year": 2019}}"#,
    ))
    .calls
    .remove(0);
    let record = executor.execute(&cite, &ExecutionContext::new("s")).await;
    assert!(record.success, "{:?}", record.error);
    assert_eq!(record.data.unwrap()["citation"], "Devlin & Chang (2019). BERT.");
    assert_eq!(record.metadata["style"], "apa");
}

#[tokio::test]
async fn test_citation_title_with_code_fence_reaches_tool() {
    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry, Arc::new(StaticFocusResolver::new())).unwrap();
    let executor = ToolExecutor::new(Arc::new(registry), Arc::new(MemoryExecutionLog::new()));

    let response = format!(
        "Formatting it now.\n{}\nDone.",
        tool_block(
            r#"{"name": "cite", "arguments": {"title": "Writing ``` in Markdown", "authors": ["Lee"], "year": 2020}}"#
        )
    );
    let parsed = parse_tool_calls(&response);
    assert!(parsed.all_valid(), "{:?}", parsed.parse_errors());
    assert_eq!(parsed.clean_text, "Formatting it now.\n\nDone.");

    let record = executor
        .execute(&parsed.calls[0], &ExecutionContext::new("s"))
        .await;
    assert!(record.success, "{:?}", record.error);
    assert_eq!(
        record.data.unwrap()["citation"],
        "Lee (2020). Writing ``` in Markdown."
    );
}

#[test]
fn test_counting_tool_definition_is_focus_bound() {
    assert!(CountingTool::get_page().requires_focus());
}
