//! `do-nuclei`: run the nuclei scanner against one target.
//!
//! The scan is launched as `nuclei -u <url> -silent [-tags a,b]` with the
//! server's environment inherited, so proxy settings and nuclei's own
//! configuration apply unchanged. Output is returned as opaque text.

use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ScannerConfig;
use crate::process::{ProcessError, ProcessInvocation, ProcessRunner};
use crate::tools::tool::{Tool, ToolError, ToolOutput};

/// Name used for the scanner in failure messages, whatever `NUCLEI_BIN` points at.
const SCANNER_NAME: &str = "nuclei";

/// Returned instead of an empty payload when a scan succeeds silently.
pub const EMPTY_SCAN_OUTPUT: &str = "Nuclei completed with no stdout output.";

/// A validated scan request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    /// Target exactly as supplied; it has been checked to parse as an
    /// absolute URL.
    pub url: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ScanParams {
    url: String,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

impl ScanRequest {
    /// Validate a target URL and build the request.
    pub fn new(url: impl Into<String>, tags: Vec<String>) -> Result<Self, ToolError> {
        let url = url.into();
        reqwest::Url::parse(&url)
            .map_err(|e| ToolError::InvalidParameters(format!("invalid url '{}': {}", url, e)))?;
        Ok(Self { url, tags })
    }

    /// Build a request from MCP call arguments.
    pub fn from_params(params: serde_json::Value) -> Result<Self, ToolError> {
        let params: ScanParams = serde_json::from_value(params)
            .map_err(|e| ToolError::InvalidParameters(e.to_string()))?;
        Self::new(params.url, params.tags.unwrap_or_default())
    }

    /// Scanner arguments for this request.
    ///
    /// `-tags` is only added for a non-empty tag list, joined into a single
    /// argument with commas.
    pub fn arguments(&self) -> Vec<String> {
        let mut args = vec!["-u".to_string(), self.url.clone(), "-silent".to_string()];
        if !self.tags.is_empty() {
            args.push("-tags".to_string());
            args.push(self.tags.join(","));
        }
        args
    }
}

/// Tool that launches the nuclei executable.
#[derive(Debug, Clone)]
pub struct NucleiTool {
    binary: String,
    runner: ProcessRunner,
}

impl NucleiTool {
    /// Create the tool from scanner settings.
    pub fn new(config: &ScannerConfig) -> Self {
        let mut runner = ProcessRunner::new();
        if let Some(timeout) = config.timeout {
            runner = runner.with_timeout(timeout);
        }
        if let Some(limit) = config.max_output_bytes {
            runner = runner.with_max_output_bytes(limit);
        }

        Self {
            binary: config.binary.clone(),
            runner,
        }
    }

    /// Create the tool for a specific executable with default limits.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self::new(&ScannerConfig {
            binary: binary.into(),
            ..ScannerConfig::default()
        })
    }

    /// The process invocation for a request.
    pub fn invocation(&self, request: &ScanRequest) -> ProcessInvocation {
        ProcessInvocation::new(self.binary.clone())
            .named(SCANNER_NAME)
            .args(request.arguments())
    }

    /// Run a scan and return its trimmed stdout, or the placeholder when
    /// nuclei printed nothing.
    pub async fn scan(&self, request: &ScanRequest) -> Result<String, ProcessError> {
        let scan_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "scan",
            %scan_id,
            target = %request.url,
            tags = %request.tags.join(",")
        );

        self.run_scan(request).instrument(span).await
    }

    async fn run_scan(&self, request: &ScanRequest) -> Result<String, ProcessError> {
        tracing::info!("starting nuclei scan");
        let outcome = self.runner.run(&self.invocation(request)).await?;
        let stdout = outcome.into_stdout(SCANNER_NAME)?;
        tracing::info!(output_bytes = stdout.len(), "nuclei scan finished");

        if stdout.is_empty() {
            Ok(EMPTY_SCAN_OUTPUT.to_string())
        } else {
            Ok(stdout)
        }
    }
}

#[async_trait]
impl Tool for NucleiTool {
    fn name(&self) -> &str {
        "do-nuclei"
    }

    fn description(&self) -> &str {
        "Execute Nuclei, an advanced vulnerability scanner using YAML templates. Runs the \
         nuclei binary inside the container and returns the raw output."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "format": "uri",
                    "description": "Target URL to scan with nuclei"
                },
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Comma-separated tags list; e.g. [\"cves\", \"exposures\"]"
                }
            },
            "required": ["url"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let request = ScanRequest::from_params(params)?;

        let start = Instant::now();
        let text = self.scan(&request).await?;

        Ok(ToolOutput::text(text, start.elapsed()))
    }
}
