//! Model Context Protocol server.
//!
//! `server` dispatches JSON-RPC messages to the tool registry; `http` and
//! `stdio` carry those messages.

pub mod http;
pub mod protocol;
mod server;
pub mod stdio;

pub use server::{McpServer, SERVER_NAME};
