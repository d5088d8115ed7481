//! Error types for configuration and the MCP transports.
//!
//! Tool, process and catalog errors live next to the code that raises them
//! (`tools::ToolError`, `process::ProcessError`, `catalog::CatalogError`).

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised by the MCP transports.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The transport could not be brought up (bind failure, client build failure).
    #[error("Server startup failed: {reason}")]
    StartupFailed { reason: String },

    /// I/O error on the listening socket or the stdio streams.
    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A transport task panicked or was cancelled.
    #[error("Transport task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
