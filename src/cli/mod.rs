//! Command-line interface.
//!
//! With no subcommand the binary serves MCP using the configured transport.
//! `scan` and `tags` run a single tool once and print its text to stdout.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::catalog::CatalogClient;
use crate::config::{Config, Transport};
use crate::mcp::{McpServer, http, stdio};
use crate::tools::ToolRegistry;
use crate::tools::builtin::{NucleiTagsTool, NucleiTool, ScanRequest};

#[derive(Parser, Debug)]
#[command(name = "nuclei-mcp", version, about = "MCP server for the nuclei scanner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve MCP (default)
    Serve {
        /// Use newline-delimited JSON-RPC on stdin/stdout instead of HTTP
        #[arg(long)]
        stdio: bool,

        /// Address for the HTTP transport (overrides NUCLEI_MCP_BIND)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Run one nuclei scan and print the findings
    Scan {
        /// Target URL
        url: String,

        /// Template tags, comma separated (e.g. "cves,exposures")
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Print the official template tags as a JSON array
    Tags,
}

impl Cli {
    /// The command to run, defaulting to `serve` with configured settings.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve {
            stdio: false,
            bind: None,
        })
    }
}

/// Run a parsed command to completion.
pub async fn run(command: Command, mut config: Config) -> anyhow::Result<()> {
    match command {
        Command::Serve { stdio, bind } => {
            if stdio {
                config.server.transport = Transport::Stdio;
            }
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            serve(config).await
        }
        Command::Scan { url, tags } => scan(&config, url, tags).await,
        Command::Tags => tags(&config).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let registry =
        ToolRegistry::with_nuclei_tools(&config).context("Failed to build tool registry")?;
    tracing::info!(
        tools = ?registry.names(),
        nuclei = %config.scanner.binary,
        "registered tools"
    );
    let server = Arc::new(McpServer::new(Arc::new(registry)));

    match config.server.transport {
        Transport::Http => http::serve(config.server.bind, server, shutdown_signal())
            .await
            .context("HTTP transport failed"),
        Transport::Stdio => stdio::serve_stdio(server)
            .await
            .context("stdio transport failed"),
    }
}

async fn scan(config: &Config, url: String, tags: Vec<String>) -> anyhow::Result<()> {
    let request = ScanRequest::new(url, tags)?;
    let tool = NucleiTool::new(&config.scanner);
    let findings = tool.scan(&request).await?;
    println!("{}", findings);
    Ok(())
}

async fn tags(config: &Config) -> anyhow::Result<()> {
    let catalog = CatalogClient::new(&config.catalog).context("Failed to build HTTP client")?;
    println!("{}", NucleiTagsTool::new(catalog).tag_list_text().await);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_no_subcommand_serves() {
        let cli = Cli::try_parse_from(["nuclei-mcp"]).unwrap();
        assert_eq!(
            cli.command(),
            Command::Serve {
                stdio: false,
                bind: None
            }
        );
    }

    #[test]
    fn test_serve_flags() {
        let cli =
            Cli::try_parse_from(["nuclei-mcp", "serve", "--stdio", "--bind", "0.0.0.0:8080"])
                .unwrap();
        assert_eq!(
            cli.command(),
            Command::Serve {
                stdio: true,
                bind: Some("0.0.0.0:8080".parse().unwrap())
            }
        );
    }

    #[test]
    fn test_scan_tags_split_on_commas() {
        let cli = Cli::try_parse_from([
            "nuclei-mcp",
            "scan",
            "https://example.com",
            "--tags",
            "cves,exposures",
            "-t",
            "tech",
        ])
        .unwrap();
        assert_eq!(
            cli.command(),
            Command::Scan {
                url: "https://example.com".to_string(),
                tags: vec!["cves".into(), "exposures".into(), "tech".into()],
            }
        );
    }

    #[test]
    fn test_scan_requires_url() {
        assert!(Cli::try_parse_from(["nuclei-mcp", "scan"]).is_err());
    }

    #[test]
    fn test_bad_bind_rejected() {
        assert!(Cli::try_parse_from(["nuclei-mcp", "serve", "--bind", "nowhere"]).is_err());
    }

    #[tokio::test]
    async fn test_scan_command_rejects_bad_url() {
        let err = run(
            Command::Scan {
                url: "not a url".to_string(),
                tags: vec![],
            },
            Config::from_lookup(|_| None).unwrap(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("url"), "{}", err);
    }
}
