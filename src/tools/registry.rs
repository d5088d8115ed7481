//! Tool registry: holds the tools served over MCP and dispatches calls.

use std::sync::Arc;
use std::time::Instant;

use crate::catalog::{CatalogClient, CatalogError};
use crate::config::Config;
use crate::tools::builtin::{NucleiTagsTool, NucleiTool};
use crate::tools::tool::{Tool, ToolError, ToolOutput, ToolSchema};

/// Registry of available tools.
///
/// Filled once at startup and read-only afterwards, so it is shared behind an
/// `Arc` without locking. Tools are listed in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with `do-nuclei` and `get-nuclei-tags` configured
    /// from `config`.
    pub fn with_nuclei_tools(config: &Config) -> Result<Self, CatalogError> {
        let mut registry = Self::new();
        registry.register(Arc::new(NucleiTool::new(&config.scanner)));
        registry.register(Arc::new(NucleiTagsTool::new(CatalogClient::new(
            &config.catalog,
        )?)));
        Ok(registry)
    }

    /// Register a tool. A tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if let Some(slot) = self.tools.iter_mut().find(|t| t.name() == name) {
            tracing::warn!(tool = %name, "replacing already registered tool");
            *slot = tool;
        } else {
            tracing::debug!(tool = %name, "registered tool");
            self.tools.push(tool);
        }
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Names of all registered tools.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Schemas of all registered tools.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name.
    pub async fn execute(
        &self,
        name: &str,
        params: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let start = Instant::now();
        let result = tool.execute(params).await;

        match &result {
            Ok(output) => tracing::info!(
                tool = name,
                elapsed_ms = start.elapsed().as_millis() as u64,
                output_bytes = output.text.len(),
                "tool call succeeded"
            ),
            Err(e) => tracing::warn!(
                tool = name,
                elapsed_ms = start.elapsed().as_millis() as u64,
                error = %e,
                "tool call failed"
            ),
        }

        result
    }
}
