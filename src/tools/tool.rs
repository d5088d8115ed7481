//! Tool trait and types.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::process::ProcessError;

/// Error type for tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments did not match the tool's input schema.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// No tool is registered under this name.
    #[error("Tool {0} not found")]
    NotFound(String),

    /// The external process failed to start or exited unsuccessfully.
    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Output from a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Text returned to the caller as a single content block.
    pub text: String,
    /// Time taken.
    pub duration: Duration,
}

impl ToolOutput {
    /// Create a text output.
    pub fn text(text: impl Into<String>, duration: Duration) -> Self {
        Self {
            text: text.into(),
            duration,
        }
    }
}

/// Definition of a tool's parameters using JSON Schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolSchema {
    /// Create a new tool schema with no parameters.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    /// Set the parameters schema.
    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Trait for tools exposed to MCP clients.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name.
    fn name(&self) -> &str;

    /// Get a description of what the tool does.
    fn description(&self) -> &str;

    /// Get the JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given parameters.
    ///
    /// Implementations validate `params` themselves and report schema
    /// violations as [`ToolError::InvalidParameters`].
    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError>;

    /// Get the tool schema advertised in `tools/list`.
    fn schema(&self) -> ToolSchema {
        ToolSchema::new(self.name(), self.description()).with_parameters(self.parameters_schema())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes back the input message."
        }

        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string" }
                },
                "required": ["message"]
            })
        }

        async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError> {
            let message = params
                .get("message")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    ToolError::InvalidParameters("missing 'message' parameter".to_string())
                })?;

            Ok(ToolOutput::text(message, Duration::from_millis(1)))
        }
    }

    #[tokio::test]
    async fn test_execute_and_reject() {
        let tool = EchoTool;

        let output = tool
            .execute(serde_json::json!({"message": "hello"}))
            .await
            .unwrap();
        assert_eq!(output.text, "hello");

        let err = tool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameters(_)));
    }

    #[test]
    fn test_tool_schema() {
        let schema = EchoTool.schema();

        assert_eq!(schema.name, "echo");
        assert!(!schema.description.is_empty());
        assert_eq!(schema.parameters["required"][0], "message");
    }

    #[test]
    fn test_default_schema_has_no_parameters() {
        let schema = ToolSchema::new("noop", "Does nothing.");
        assert_eq!(schema.parameters["properties"], serde_json::json!({}));
    }
}
