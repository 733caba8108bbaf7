//! skillz serve - MCP server on stdio

use crate::app::AppContext;
use crate::error::Result;
use crate::mcp::McpServer;

pub fn run(ctx: &AppContext) -> Result<()> {
    McpServer::new(ctx.service.clone()).serve_stdio()
}
