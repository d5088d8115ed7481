//! Built-in tools served by the MCP server.

mod nuclei;
mod nuclei_tags;

pub use nuclei::{EMPTY_SCAN_OUTPUT, NucleiTool, ScanRequest};
pub use nuclei_tags::NucleiTagsTool;
