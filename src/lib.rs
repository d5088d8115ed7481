//! MCP server exposing the nuclei vulnerability scanner.
//!
//! Two tools are served: `do-nuclei` runs a scan against one URL and
//! `get-nuclei-tags` lists the official template tags.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod process;
pub mod tools;
