//! Chat Orchestrator Integration Tests
//!
//! Collect-mode turns against a scripted model.

use std::sync::Arc;

use paper_desk::services::chat::CHAT_COMPLETION_PURPOSE;
use paper_desk::{AppError, ChatRequest, ChatSettings, FocusEntity, StaticFocusResolver};
use paper_desk_core::{Tool, ToolDefinition};
use paper_desk_llm::LlmError;

use crate::support::{service_with, tool_block, CountingTool, ScriptedModel};

#[tokio::test]
async fn test_plain_reply_has_no_records() {
    let model = ScriptedModel::texts(&["Hello!"]);
    let (service, _log) = service_with(model.clone(), vec![], ChatSettings::default());

    let turn = service.send_message(ChatRequest::new("s-1", "Hi")).await.unwrap();

    assert_eq!(turn.content, "Hello!");
    assert!(turn.records.is_empty());
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_tool_call_then_answer() {
    let tool = CountingTool::get_page();
    let model = ScriptedModel::new(vec![
        Ok(tool_block(r#"{"name": "get_page", "arguments": {"page": 3}}"#)),
        Ok("Done.".to_string()),
    ]);
    let (service, log) = service_with(
        model.clone(),
        vec![tool.clone() as Arc<dyn Tool>],
        ChatSettings::default(),
    );

    let turn = service
        .send_message(ChatRequest::new("s-1", "Read page 3").with_focus("paper-1"))
        .await
        .unwrap();

    assert_eq!(turn.content, "Done.");
    assert_eq!(turn.records.len(), 1);
    assert!(turn.records[0].success);
    assert_eq!(turn.records[0].data.as_ref().unwrap()["page"], 3);
    assert_eq!(turn.iterations, 2);
    assert_eq!(tool.calls(), 1);

    // the continuation carries the raw call and its result
    let second_prompt = &model.prompts()[1];
    assert!(second_prompt.contains("User: Read page 3"));
    assert!(second_prompt.contains(r#"{"name": "get_page", "arguments": {"page": 3}}"#));
    assert!(second_prompt.contains("```tool_result"));

    assert_eq!(log.entries_for(CHAT_COMPLETION_PURPOSE).len(), 2);
    assert_eq!(log.entries_for("tool.get_page").len(), 1);
}

#[tokio::test]
async fn test_invalid_only_response_appends_note() {
    let tool = CountingTool::get_page();
    let raw = format!(
        "Checking the page.\n{}",
        tool_block(r#"{"name": "get_page", "arguments": {"page": 3"#)
    );
    let model = ScriptedModel::new(vec![Ok(raw)]);
    let (service, _log) = service_with(
        model.clone(),
        vec![tool.clone() as Arc<dyn Tool>],
        ChatSettings::default(),
    );

    let turn = service
        .send_message(ChatRequest::new("s-1", "Read page 3").with_focus("paper-1"))
        .await
        .unwrap();

    assert!(turn.content.starts_with("Checking the page.\n\nNote:"));
    assert!(turn.content.contains("malformed JSON in tool block"));
    assert!(turn.records.is_empty());
    assert_eq!(model.calls(), 1);
    assert_eq!(tool.calls(), 0);
}

#[tokio::test]
async fn test_invalid_block_alone_yields_only_note() {
    let model = ScriptedModel::texts(&["```tool\n{oops}\n```"]);
    let (service, _log) = service_with(model, vec![], ChatSettings::default());
    let turn = service.send_message(ChatRequest::new("s", "Hi")).await.unwrap();
    assert!(turn.content.starts_with("Note:"));
    assert!(turn.records.is_empty());
}

#[tokio::test]
async fn test_iteration_ceiling_stops_loop() {
    let tool = CountingTool::new(ToolDefinition::new("ping", "Ping"));
    let model = ScriptedModel::new(vec![Ok(format!(
        "Still working.\n{}",
        tool_block(r#"{"name": "ping"}"#)
    ))]);
    let (service, _log) = service_with(
        model.clone(),
        vec![tool.clone() as Arc<dyn Tool>],
        ChatSettings::default(),
    );

    let turn = service.send_message(ChatRequest::new("s", "Loop")).await.unwrap();

    assert_eq!(model.calls(), 5);
    assert_eq!(turn.iterations, 5);
    assert_eq!(tool.calls(), 5);
    assert_eq!(turn.records.len(), 5);
    assert!(turn.content.starts_with("Still working."));
    assert!(turn.content.contains("rephrasing"));
}

#[tokio::test]
async fn test_configured_ceiling_is_exact() {
    let tool = CountingTool::new(ToolDefinition::new("ping", "Ping"));
    let model = ScriptedModel::new(vec![Ok(tool_block(r#"{"name": "ping"}"#))]);
    let settings = ChatSettings {
        max_iterations: 2,
        ..Default::default()
    };
    let (service, _log) = service_with(model.clone(), vec![tool as Arc<dyn Tool>], settings);

    service.send_message(ChatRequest::new("s", "Loop")).await.unwrap();
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn test_valid_calls_run_in_order_and_invalid_are_ignored() {
    let first = CountingTool::new(ToolDefinition::new("first", "First"));
    let second = CountingTool::new(ToolDefinition::new("second", "Second"));
    let raw = format!(
        "{}\n{}\n{}",
        tool_block(r#"{"name": "second"}"#),
        tool_block("{broken"),
        tool_block(r#"{"name": "first"}"#),
    );
    let model = ScriptedModel::new(vec![Ok(raw), Ok("All done.".to_string())]);
    let (service, _log) = service_with(
        model,
        vec![first.clone() as Arc<dyn Tool>, second.clone() as Arc<dyn Tool>],
        ChatSettings::default(),
    );

    let turn = service.send_message(ChatRequest::new("s", "Go")).await.unwrap();

    let order: Vec<&str> = turn.records.iter().map(|r| r.tool_name.as_str()).collect();
    assert_eq!(order, vec!["second", "first"]);
    assert_eq!(first.calls(), 1);
    assert_eq!(second.calls(), 1);
    assert_eq!(turn.content, "All done.");
}

#[tokio::test]
async fn test_focus_tools_hidden_and_rejected_without_focus() {
    let tool = CountingTool::get_page();
    let model = ScriptedModel::new(vec![
        Ok(tool_block(r#"{"name": "get_page", "arguments": {"page": 1}}"#)),
        Ok("No paper is open.".to_string()),
    ]);
    let (service, _log) = service_with(
        model.clone(),
        vec![tool.clone() as Arc<dyn Tool>],
        ChatSettings::default(),
    );

    let turn = service.send_message(ChatRequest::new("s", "Page 1?")).await.unwrap();

    assert!(!model.prompts()[0].contains("### get_page"));
    assert_eq!(turn.records.len(), 1);
    assert!(!turn.records[0].success);
    assert!(turn.records[0]
        .error
        .as_deref()
        .unwrap()
        .contains("requires a focused document"));
    assert_eq!(tool.calls(), 0);
}

#[tokio::test]
async fn test_focus_entity_is_described_in_prompt() {
    let model = ScriptedModel::texts(&["It is about transformers."]);
    let (service, _log) = service_with(model.clone(), vec![], ChatSettings::default());
    let service = Arc::try_unwrap(service)
        .ok()
        .expect("service is not shared yet")
        .with_focus_resolver(Arc::new(StaticFocusResolver::new().with_entity(
            FocusEntity::new("paper-1", "Attention Is All You Need").with_year(2017),
        )));

    service
        .send_message(ChatRequest::new("s", "What is this?").with_focus("paper-1"))
        .await
        .unwrap();

    let prompt = &model.prompts()[0];
    assert!(prompt.contains("Title: Attention Is All You Need"));
    assert!(prompt.contains("Year: 2017"));
}

#[tokio::test]
async fn test_model_failure_fails_turn() {
    let model = ScriptedModel::new(vec![
        Ok(tool_block(r#"{"name": "ping"}"#)),
        Err(LlmError::ServerError {
            message: "overloaded".to_string(),
            status: Some(503),
        }),
    ]);
    let tool = CountingTool::new(ToolDefinition::new("ping", "Ping"));
    let (service, log) = service_with(model, vec![tool as Arc<dyn Tool>], ChatSettings::default());

    let err = service
        .send_message(ChatRequest::new("s", "Go"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Model(LlmError::ServerError { .. })));
    let completions = log.entries_for(CHAT_COMPLETION_PURPOSE);
    assert_eq!(completions.len(), 2);
    assert!(completions[0].success);
    assert!(!completions[1].success);
}

#[tokio::test]
async fn test_concurrent_turns_are_independent() {
    let model = ScriptedModel::texts(&["Answer."]);
    let (service, _log) = service_with(model.clone(), vec![], ChatSettings::default());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .send_message(ChatRequest::new(format!("s-{}", i), "Hi"))
                    .await
            })
        })
        .collect();

    for handle in handles {
        let turn = handle.await.unwrap().unwrap();
        assert_eq!(turn.content, "Answer.");
    }
    assert_eq!(model.calls(), 4);
}
