//! Tool system.
//!
//! Tools are what MCP clients call. Each tool validates its own arguments,
//! does its work, and returns a single block of text:
//! - `do-nuclei` launches the nuclei scanner
//! - `get-nuclei-tags` reads the template tag catalog

pub mod builtin;

mod registry;
mod tool;

pub use registry::ToolRegistry;
pub use tool::{Tool, ToolError, ToolOutput, ToolSchema};
