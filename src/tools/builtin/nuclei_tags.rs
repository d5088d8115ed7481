//! `get-nuclei-tags`: list the official nuclei template tags.
//!
//! Never fails towards the caller. Fetch, status and parse problems are
//! reported as the text of an otherwise successful result.

use std::time::Instant;

use async_trait::async_trait;

use crate::catalog::CatalogClient;
use crate::tools::tool::{Tool, ToolError, ToolOutput};

/// Tool that fetches the template tag catalog.
#[derive(Debug, Clone)]
pub struct NucleiTagsTool {
    catalog: CatalogClient,
}

impl NucleiTagsTool {
    pub fn new(catalog: CatalogClient) -> Self {
        Self { catalog }
    }

    /// Tag names as a JSON array, or a readable error description.
    pub async fn tag_list_text(&self) -> String {
        let names = match self.catalog.fetch_tag_names().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(url = %self.catalog.url(), error = %e, "tag catalog unavailable");
                return format!("Error retrieving nuclei tags: {}", e);
            }
        };

        serde_json::to_string(&names)
            .unwrap_or_else(|e| format!("Error retrieving nuclei tags: {}", e))
    }
}

#[async_trait]
impl Tool for NucleiTagsTool {
    fn name(&self) -> &str {
        "get-nuclei-tags"
    }

    fn description(&self) -> &str {
        "Fetch the latest list of official nuclei template tags from ProjectDiscovery."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(&self, _params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let text = self.tag_list_text().await;
        Ok(ToolOutput::text(text, start.elapsed()))
    }
}
