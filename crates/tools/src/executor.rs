//! Tool Executor
//!
//! Resolves a parsed call against the registry, checks focus, coerces
//! arguments against the declared parameters, runs the tool and records the
//! attempt. `execute` is total: every failure mode, including a panicking
//! tool, comes back as an unsuccessful `ExecutionRecord`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use serde_json::{Map, Value};

use paper_desk_core::{
    ExecutionContext, ExecutionRecord, ParameterType, Tool, ToolArguments, ToolDefinition,
    ToolOutcome, ToolParameter, ToolValue,
};

use crate::log::{ExecutionLog, ExecutionLogEntry, SharedExecutionLog};
use crate::parser::{json_type_name, ParsedCall};
use crate::registry::ToolRegistry;

/// Purpose prefix for tool entries in the execution log.
pub const TOOL_PURPOSE_PREFIX: &str = "tool.";

pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    log: SharedExecutionLog,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, log: SharedExecutionLog) -> Self {
        Self { registry, log }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Execute one parsed call.
    pub async fn execute(&self, call: &ParsedCall, ctx: &ExecutionContext) -> ExecutionRecord {
        let input_summary = Value::Object(call.arguments.clone()).to_string();

        if let Some(error) = &call.error {
            return self.reject(call, ctx, &input_summary, format!("invalid tool call: {}", error));
        }

        let tool = match self.registry.lookup(&call.name) {
            Some(tool) => tool,
            None => {
                let available: Vec<String> = self
                    .registry
                    .available_definitions(ctx.has_focus())
                    .into_iter()
                    .map(|def| def.name)
                    .collect();
                return self.reject(
                    call,
                    ctx,
                    &input_summary,
                    format!(
                        "unknown tool: {}; available: {}",
                        call.name,
                        available.join(", ")
                    ),
                );
            }
        };

        if tool.requires_focus() && !ctx.has_focus() {
            return self.reject(
                call,
                ctx,
                &input_summary,
                format!(
                    "tool '{}' requires a focused document, but none is open; ask the user to open a paper first",
                    call.name
                ),
            );
        }

        let args = match coerce_arguments(tool.definition(), &call.arguments) {
            Ok(args) => args,
            Err(error) => return self.reject(call, ctx, &input_summary, error),
        };

        tracing::debug!(tool = %call.name, session_id = %ctx.session_id(), "executing tool");
        let start = Instant::now();
        let outcome = match AssertUnwindSafe(tool.execute(&args, ctx))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(tool = %call.name, panic = %message, "tool panicked");
                ToolOutcome::err(format!("tool '{}' panicked: {}", call.name, message))
            }
        };
        let elapsed = start.elapsed();

        if !outcome.success {
            tracing::warn!(
                tool = %call.name,
                error = outcome.error.as_deref().unwrap_or(""),
                "tool reported failure"
            );
        }

        self.record_log(call, ctx, &args.to_json().to_string(), &outcome, elapsed);
        ExecutionRecord::from_outcome(call.name.clone(), outcome, elapsed)
    }

    fn reject(
        &self,
        call: &ParsedCall,
        ctx: &ExecutionContext,
        input_summary: &str,
        error: String,
    ) -> ExecutionRecord {
        tracing::warn!(tool = %call.name, error = %error, "tool call rejected");
        let outcome = ToolOutcome::err(error.clone());
        self.record_log(call, ctx, input_summary, &outcome, Duration::ZERO);
        ExecutionRecord::rejected(call.name.clone(), error)
    }

    fn record_log(
        &self,
        call: &ParsedCall,
        ctx: &ExecutionContext,
        input_summary: &str,
        outcome: &ToolOutcome,
        elapsed: Duration,
    ) {
        let mut entry = ExecutionLogEntry::new(
            format!("{}{}", TOOL_PURPOSE_PREFIX, call.name),
            ctx.session_id(),
            input_summary,
            &outcome.summary(),
            elapsed,
        );
        if !outcome.success {
            entry = entry.with_error(outcome.error.clone().unwrap_or_default());
        }
        self.log.log(entry);
    }
}

/// Coerce raw JSON arguments against a tool's declared parameters.
///
/// Undeclared arguments are dropped, a JSON `null` counts as absent, and
/// absent optional parameters take their default when one is declared.
pub fn coerce_arguments(
    definition: &ToolDefinition,
    raw: &Map<String, Value>,
) -> Result<ToolArguments, String> {
    let mut args = ToolArguments::new();
    for param in &definition.parameters {
        match raw.get(&param.name) {
            None | Some(Value::Null) => {
                if param.required {
                    return Err(format!("missing required parameter: {}", param.name));
                }
                if let Some(default) = &param.default {
                    args.insert(param.name.clone(), default.clone());
                }
            }
            Some(value) => {
                args.insert(param.name.clone(), coerce_value(param, value)?);
            }
        }
    }
    Ok(args)
}

fn coerce_value(param: &ToolParameter, value: &Value) -> Result<ToolValue, String> {
    let coerced = match (param.param_type, value) {
        (ParameterType::String, Value::String(s)) => Some(ToolValue::String(s.clone())),
        (ParameterType::Number, Value::Number(n)) => Some(ToolValue::Number(n.clone())),
        (ParameterType::Boolean, Value::Bool(b)) => Some(ToolValue::Bool(*b)),
        (ParameterType::Array, Value::Array(items)) => Some(ToolValue::List(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                })
                .collect(),
        )),
        _ => None,
    };

    coerced.ok_or_else(|| {
        format!(
            "invalid parameter '{}': expected {}, got {}",
            param.name,
            param.param_type,
            json_type_name(value)
        )
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
