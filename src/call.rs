//! Tool invocation request/response types.
//!
//! One `ToolCall` represents exactly one invocation request; the pipeline
//! produces exactly one `ToolResult` per call (or propagates cancellation).
//! Neither is retained by the core after the call returns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical;
use crate::types::CallId;

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// A request to invoke a tool with a specific argument payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Caller-supplied or generated id, echoed on the result.
    #[serde(default)]
    pub id: CallId,
    /// Tool name (matched case-insensitively against the registry).
    pub name: String,
    /// Named arguments. Defaults to an empty object when absent.
    #[serde(default = "empty_object")]
    pub arguments: Value,
}

impl ToolCall {
    /// New call with a generated id.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: CallId::new(),
            name: name.into(),
            arguments,
        }
    }

    /// New call with an explicit id.
    pub fn with_id(id: CallId, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id,
            name: name.into(),
            arguments,
        }
    }

    /// Stable deduplication key: lowercased name plus canonicalized
    /// arguments. Equivalent calls map to the same key regardless of key
    /// order or surface whitespace in string leaves.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}:{}",
            self.name.to_lowercase(),
            canonical::canonicalize(&self.arguments)
        )
    }
}

/// The outcome of one tool call, success or error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Echoes the call id.
    pub id: CallId,
    /// Success value, or the tool-facing error message as a JSON string.
    pub output: Value,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(id: CallId, output: Value) -> Self {
        Self {
            id,
            output,
            is_error: false,
        }
    }

    pub fn error(id: CallId, message: impl Into<String>) -> Self {
        Self {
            id,
            output: Value::String(message.into()),
            is_error: true,
        }
    }

    /// Canonical textual form of the output (string outputs verbatim,
    /// everything else compact JSON).
    pub fn output_text(&self) -> String {
        match &self.output {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
