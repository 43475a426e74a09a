use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Metadata describing a tool exposed by the server.
/// A tool is like an RPC method: it can be called by a model to fetch data or perform side
/// effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// A JSON Schema object describing the tool's arguments.
    pub input_schema: Value,
}

impl Tool {
    /// Create a tool accepting any object as its arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Tool {
            name: name.into(),
            description: None,
            input_schema: default_input_schema(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the input schema. `null` and `{}` fall back to `{"type": "object"}`.
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = match schema {
            Value::Null => default_input_schema(),
            Value::Object(ref map) if map.is_empty() => default_input_schema(),
            schema => schema,
        };
        self
    }
}

fn default_input_schema() -> Value {
    json!({ "type": "object" })
}

/// Errors raised by a tool handler. All of them are reported to the client as a tool result
/// flagged with `isError`, never as a JSON-RPC error.
#[derive(Error, Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum ToolError {
    #[error("{0}")]
    Execution(String),
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

impl ToolError {
    pub fn execution(message: impl Into<String>) -> Self {
        ToolError::Execution(message.into())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::InvalidArguments(err.to_string())
    }
}

/// Generate an input schema from a Rust type.
pub fn generate_tool_schema<T: JsonSchema>() -> Result<Value, serde_json::Error> {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
}
