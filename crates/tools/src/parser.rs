//! Text-Protocol Tool Calling
//!
//! The model has no native function calling. Tool descriptions are injected
//! into the prompt, and the model requests a tool by emitting a fenced block
//! tagged `tool` that holds a JSON object:
//!
//! ````text
//! ```tool
//! {"name": "get_page", "arguments": {"page": 3}}
//! ```
//! ````
//!
//! This module renders those instructions, parses such blocks out of a
//! response, and renders execution results back into prompt text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use paper_desk_core::{ExecutionRecord, ToolDefinition};

/// Name carried by every call that failed to parse.
pub const INVALID_CALL_NAME: &str = "invalid";

const FENCE: &str = "```";
const TOOL_FENCE: &str = "```tool";

/// A tool call parsed from the model's text response.
///
/// `error.is_none()` iff the call is valid; an invalid call is always named
/// [`INVALID_CALL_NAME`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCall {
    pub name: String,
    pub arguments: Map<String, Value>,
    /// The raw block text, kept for diagnostics
    pub raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParsedCall {
    fn valid(name: String, arguments: Map<String, Value>, raw: &str) -> Self {
        Self {
            name,
            arguments,
            raw: raw.to_string(),
            error: None,
        }
    }

    fn invalid(error: impl Into<String>, raw: &str) -> Self {
        Self {
            name: INVALID_CALL_NAME.to_string(),
            arguments: Map::new(),
            raw: raw.to_string(),
            error: Some(error.into()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything extracted from one model response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Calls in the order their blocks appear
    pub calls: Vec<ParsedCall>,
    /// Response text with blocks and annotation comments removed
    pub clean_text: String,
}

impl ParseResult {
    pub fn valid_calls(&self) -> Vec<&ParsedCall> {
        self.calls.iter().filter(|c| c.is_valid()).collect()
    }

    pub fn invalid_calls(&self) -> Vec<&ParsedCall> {
        self.calls.iter().filter(|c| !c.is_valid()).collect()
    }

    pub fn has_calls(&self) -> bool {
        !self.calls.is_empty()
    }

    pub fn all_valid(&self) -> bool {
        self.has_calls() && self.calls.iter().all(ParsedCall::is_valid)
    }

    /// Diagnostics of every invalid call, in order.
    pub fn parse_errors(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| c.error.as_deref())
            .collect()
    }
}

/// Build the tool-calling instructions and catalogue to inject into the prompt.
pub fn build_tool_call_instructions(tools: &[ToolDefinition]) -> String {
    if tools.is_empty() {
        return "## Tools\n\nNo tools are available in this conversation. Answer directly.\n"
            .to_string();
    }

    let mut tool_descriptions = String::new();
    for tool in tools {
        tool_descriptions.push_str(&format!("### {}\n", tool.name));
        tool_descriptions.push_str(&format!("{}\n", tool.description));

        if !tool.parameters.is_empty() {
            tool_descriptions.push_str("Parameters:\n");
            for param in &tool.parameters {
                let marker = match (&param.default, param.required) {
                    (_, true) => " (required)".to_string(),
                    (Some(default), false) => format!(
                        " (optional, default: {})",
                        Value::from(default.clone())
                    ),
                    (None, false) => " (optional)".to_string(),
                };
                tool_descriptions.push_str(&format!(
                    "  - `{}` ({}{}): {}\n",
                    param.name, param.param_type, marker, param.description
                ));
            }
        }
        tool_descriptions.push('\n');
    }

    let example_name = &tools[0].name;

    format!(
        r#"## Tool Calling

You can use the tools listed below. To call a tool, output a block in this EXACT format:

```tool
{{"name": "ToolName", "arguments": {{"param1": "value1"}}}}
```

Rules:
- The opening fence line is three backticks followed by the word tool, and the block ends with three backticks
- The content MUST be a single valid JSON object with "name" and "arguments"
- You may call several tools in one response; they run in the order written
- After calling tools, STOP and wait for the results before answering
- NEVER invent tool results
- Only use tools from the list below
- If no tool is needed, answer in plain text without any tool block

## Available Tools

{tool_descriptions}## Example

```tool
{{"name": "{example_name}", "arguments": {{}}}}
```
"#,
        tool_descriptions = tool_descriptions,
        example_name = example_name,
    )
}

/// Parse `tool` blocks from a model response.
///
/// Never fails: malformed blocks become invalid calls, and all text outside
/// blocks is preserved in `clean_text`.
pub fn parse_tool_calls(text: &str) -> ParseResult {
    let mut calls = Vec::new();
    let mut kept = String::with_capacity(text.len());
    let mut remaining = text;

    while let Some(start) = find_tool_fence(remaining) {
        kept.push_str(&remaining[..start]);

        let after_marker = &remaining[start + TOOL_FENCE.len()..];
        match find_closing_fence(after_marker) {
            Some(end) => {
                let raw_end = start + TOOL_FENCE.len() + end + FENCE.len();
                let raw = &remaining[start..raw_end];
                calls.push(parse_block(&after_marker[..end], raw, true));
                remaining = &remaining[raw_end..];
            }
            None => {
                // Unterminated block: it runs to the end of the response
                calls.push(parse_block(after_marker, &remaining[start..], false));
                remaining = "";
            }
        }
    }
    kept.push_str(remaining);

    ParseResult {
        calls,
        clean_text: normalize_text(&kept),
    }
}

/// Response text with tool blocks removed.
pub fn extract_text_without_tool_calls(text: &str) -> String {
    parse_tool_calls(text).clean_text
}

/// Format execution records for the continuation prompt.
pub fn format_execution_results(records: &[ExecutionRecord]) -> String {
    let mut out = String::new();
    for (index, record) in records.iter().enumerate() {
        let payload = serde_json::to_string_pretty(record).unwrap_or_else(|_| {
            format!(
                r#"{{"tool_name": "{}", "success": {}}}"#,
                record.tool_name, record.success
            )
        });
        out.push_str(&format!(
            "[Tool Result {}: {}]\n```tool_result\n{}\n```\n\n",
            index + 1,
            record.tool_name,
            payload
        ));
    }
    out.trim_end().to_string()
}

/// JSON type name for diagnostics.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Find the next opening fence whose tag is exactly `tool`.
fn find_tool_fence(text: &str) -> Option<usize> {
    text.match_indices(TOOL_FENCE).map(|(i, _)| i).find(|&i| {
        text[i + TOOL_FENCE.len()..]
            .chars()
            .next()
            .map(|c| c.is_whitespace() || c == '{')
            .unwrap_or(true)
    })
}

/// Locate the fence that closes a block body.
///
/// A body that opens with one complete JSON value closes at the first fence
/// after it, so backticks inside JSON strings are not mistaken for the end.
/// Otherwise a fence at the start of a line wins, then any fence at all.
fn find_closing_fence(body: &str) -> Option<usize> {
    let mut values = serde_json::Deserializer::from_str(body).into_iter::<Value>();
    if let Some(Ok(_)) = values.next() {
        let offset = values.byte_offset();
        let rest = &body[offset..];
        let gap = rest.len() - rest.trim_start().len();
        if rest[gap..].starts_with(FENCE) {
            return Some(offset + gap);
        }
    }

    body.match_indices(FENCE)
        .map(|(i, _)| i)
        .find(|&i| body[..i].ends_with('\n') && ends_line(&body[i + FENCE.len()..]))
        .or_else(|| body.find(FENCE))
}

/// True when only horizontal whitespace remains before the next newline.
fn ends_line(text: &str) -> bool {
    text.chars()
        .take_while(|&c| c != '\n')
        .all(|c| c == ' ' || c == '\t' || c == '\r')
}

fn parse_block(content: &str, raw: &str, terminated: bool) -> ParsedCall {
    let content = content.trim();
    let unterminated_note = if terminated {
        ""
    } else {
        " (block has no closing fence)"
    };

    if content.is_empty() {
        return ParsedCall::invalid(format!("empty tool block{}", unterminated_note), raw);
    }

    let json: Value = match serde_json::from_str(content) {
        Ok(json) => json,
        Err(e) => {
            return ParsedCall::invalid(
                format!("malformed JSON in tool block: {}{}", e, unterminated_note),
                raw,
            )
        }
    };

    let mut object = match json {
        Value::Object(map) => map,
        other => {
            return ParsedCall::invalid(
                format!(
                    "tool block must contain a JSON object, got {}",
                    json_type_name(&other)
                ),
                raw,
            )
        }
    };

    let name = match object.remove("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        Some(Value::String(_)) => {
            return ParsedCall::invalid("tool block has an empty \"name\"", raw)
        }
        Some(other) => {
            return ParsedCall::invalid(
                format!(
                    "\"name\" must be a string, got {}",
                    json_type_name(&other)
                ),
                raw,
            )
        }
        None => return ParsedCall::invalid("tool block is missing the \"name\" field", raw),
    };

    let arguments = match object.remove("arguments") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return ParsedCall::invalid(
                format!(
                    "\"arguments\" for '{}' must be a JSON object, got {}",
                    name,
                    json_type_name(&other)
                ),
                raw,
            )
        }
    };

    ParsedCall::valid(name, arguments, raw)
}

/// Strip `<!-- ... -->` comments, collapse blank-line runs, trim.
fn normalize_text(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut remaining = text;
    while let Some(start) = remaining.find("<!--") {
        match remaining[start + 4..].find("-->") {
            Some(end) => {
                stripped.push_str(&remaining[..start]);
                remaining = &remaining[start + 4 + end + 3..];
            }
            None => break,
        }
    }
    stripped.push_str(remaining);

    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;
    for line in stripped.lines() {
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(if blank { "" } else { line });
        previous_blank = blank;
    }

    lines.join("\n").trim().to_string()
}
