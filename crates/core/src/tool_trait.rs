//! Tool Capability Model
//!
//! Data shapes describing a tool, its parameters, its coerced arguments and its
//! outcome, plus the `Tool` trait every host capability implements.
//!
//! - `ToolDefinition` / `ToolParameter` - identity and parameter schema
//! - `ToolValue` / `ToolArguments` - typed argument values produced by coercion
//! - `ToolOutcome` - what a tool returns; there is no error channel, failure is
//!   an outcome with `success == false`
//! - `Tool` - async execution capability

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::context::ExecutionContext;
use crate::error::{CoreError, CoreResult};

// ============================================================================
// Parameter Schema
// ============================================================================

/// The declared type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Boolean,
    Array,
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterType::String => write!(f, "string"),
            ParameterType::Number => write!(f, "number"),
            ParameterType::Boolean => write!(f, "boolean"),
            ParameterType::Array => write!(f, "array"),
        }
    }
}

/// A single declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    pub description: String,
    pub required: bool,
    /// Value used when an optional parameter is not supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ToolValue>,
}

impl ToolParameter {
    pub fn new(
        name: impl Into<String>,
        param_type: ParameterType,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required,
            default: None,
        }
    }

    /// Shorthand for a required parameter.
    pub fn required(
        name: impl Into<String>,
        param_type: ParameterType,
        description: impl Into<String>,
    ) -> Self {
        Self::new(name, param_type, description, true)
    }

    /// Shorthand for an optional parameter.
    pub fn optional(
        name: impl Into<String>,
        param_type: ParameterType,
        description: impl Into<String>,
    ) -> Self {
        Self::new(name, param_type, description, false)
    }

    /// Set the default applied when the parameter is absent.
    pub fn with_default(mut self, default: impl Into<ToolValue>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Tool identity and schema. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// Declared parameters in declaration order; names are unique
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    /// Whether the tool is only legal while a focus entity is set
    #[serde(default)]
    pub requires_focus: bool,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            requires_focus: false,
        }
    }

    /// Add a parameter. A parameter with the same name is replaced.
    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        if let Some(existing) = self
            .parameters
            .iter_mut()
            .find(|p| p.name == parameter.name)
        {
            *existing = parameter;
        } else {
            self.parameters.push(parameter);
        }
        self
    }

    pub fn with_requires_focus(mut self, requires_focus: bool) -> Self {
        self.requires_focus = requires_focus;
        self
    }

    /// Check the definition before it is registered.
    ///
    /// The name must be non-blank and every default must already have its
    /// parameter's declared type, since defaults bypass coercion.
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("tool name must not be empty"));
        }
        for param in &self.parameters {
            if let Some(default) = &param.default {
                let actual = default.parameter_type();
                if actual != param.param_type {
                    return Err(CoreError::validation(format!(
                        "default for parameter '{}' of tool '{}' is {}, expected {}",
                        param.name, self.name, actual, param.param_type
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ToolParameter> {
        self.parameters.iter().filter(|p| p.required)
    }
}

// ============================================================================
// Argument Values
// ============================================================================

/// A coerced argument value.
///
/// `Number` keeps the JSON number representation so an integer argument stays
/// an integer when echoed back into a tool's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolValue {
    String(String),
    Number(Number),
    Bool(bool),
    List(Vec<String>),
}

impl ToolValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ToolValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ToolValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ToolValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ToolValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ToolValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// The parameter type this value satisfies.
    pub fn parameter_type(&self) -> ParameterType {
        match self {
            ToolValue::String(_) => ParameterType::String,
            ToolValue::Number(_) => ParameterType::Number,
            ToolValue::Bool(_) => ParameterType::Boolean,
            ToolValue::List(_) => ParameterType::Array,
        }
    }
}

impl From<&str> for ToolValue {
    fn from(value: &str) -> Self {
        ToolValue::String(value.to_string())
    }
}

impl From<String> for ToolValue {
    fn from(value: String) -> Self {
        ToolValue::String(value)
    }
}

impl From<i64> for ToolValue {
    fn from(value: i64) -> Self {
        ToolValue::Number(Number::from(value))
    }
}

impl From<i32> for ToolValue {
    fn from(value: i32) -> Self {
        ToolValue::Number(Number::from(value))
    }
}

impl From<bool> for ToolValue {
    fn from(value: bool) -> Self {
        ToolValue::Bool(value)
    }
}

impl From<Vec<String>> for ToolValue {
    fn from(value: Vec<String>) -> Self {
        ToolValue::List(value)
    }
}

impl From<ToolValue> for Value {
    fn from(value: ToolValue) -> Self {
        match value {
            ToolValue::String(s) => Value::String(s),
            ToolValue::Number(n) => Value::Number(n),
            ToolValue::Bool(b) => Value::Bool(b),
            ToolValue::List(items) => Value::Array(items.into_iter().map(Value::String).collect()),
        }
    }
}

/// Validated, coerced arguments for one tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolArguments(BTreeMap<String, ToolValue>);

impl ToolArguments {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ToolValue) {
        self.0.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ToolValue>) -> Self {
        self.insert(name, value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ToolValue> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ToolValue::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ToolValue::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ToolValue::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ToolValue::as_bool)
    }

    pub fn get_list(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(ToolValue::as_list)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ToolValue)> {
        self.0.iter()
    }

    /// Render as a JSON object, e.g. for logging.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(v.clone())))
            .collect();
        Value::Object(map)
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Result of one tool invocation attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ToolOutcome {
    /// Create a successful outcome carrying `data`.
    pub fn ok(data: impl Into<Value>) -> Self {
        Self {
            success: true,
            data: Some(data.into()),
            error: None,
            metadata: Map::new(),
        }
    }

    /// Create a successful outcome with no payload.
    pub fn ok_empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            metadata: Map::new(),
        }
    }

    /// Create a failed outcome.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            metadata: Map::new(),
        }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Short text form for logs and prompts.
    pub fn summary(&self) -> String {
        if self.success {
            match &self.data {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => "ok".to_string(),
            }
        } else {
            format!(
                "Error: {}",
                self.error.as_deref().unwrap_or("Unknown error")
            )
        }
    }
}

/// One executed (or rejected) tool call, as folded into the turn result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub tool_name: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    /// Wall-clock time spent inside the tool, zero for rejected calls
    pub duration_ms: u64,
}

impl ExecutionRecord {
    pub fn from_outcome(
        tool_name: impl Into<String>,
        outcome: ToolOutcome,
        duration: std::time::Duration,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: outcome.success,
            data: outcome.data,
            error: outcome.error,
            metadata: outcome.metadata,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// A call rejected before the tool was invoked.
    pub fn rejected(tool_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self::from_outcome(tool_name, ToolOutcome::err(error), std::time::Duration::ZERO)
    }

    pub fn duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.duration_ms)
    }
}

// ============================================================================
// Tool Trait
// ============================================================================

/// A host capability the model may invoke.
///
/// `execute` returns a `ToolOutcome` rather than a `Result`: a failing tool
/// reports `ToolOutcome::err`. Implementations may assume `args` were already
/// validated against `definition().parameters`.
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> &ToolDefinition;

    async fn execute(&self, args: &ToolArguments, ctx: &ExecutionContext) -> ToolOutcome;

    fn name(&self) -> &str {
        &self.definition().name
    }

    fn requires_focus(&self) -> bool {
        self.definition().requires_focus
    }
}
