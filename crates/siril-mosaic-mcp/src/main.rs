mod tools;

use rmcp::{model::*, tool_handler, transport::stdio, ServerHandler, ServiceExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::tools::SirilMcpServer;

#[tool_handler]
impl ServerHandler for SirilMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Siril SeeStar Mosaic Processor: locate and validate a local Siril install, then stack a Seestar project's lights/ folder into a mosaic. Call check_project_structure before process_seestar_mosaic.".into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the MCP protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "starting Siril MCP server");
    let service = SirilMcpServer::from_env()?.serve(stdio()).await?;
    let reason = service.waiting().await?;
    info!(?reason, "Siril MCP server stopped");
    Ok(())
}
