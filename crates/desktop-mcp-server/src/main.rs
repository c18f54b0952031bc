//! MCP server for desktop UI automation
//!
//! This server provides MCP tools for moving the mouse, clicking, typing,
//! capturing the screen and locating images on it.

mod config;
mod constants;
mod desktop;
mod errors;
mod matcher;
mod registry;
mod requests;
mod schema;
mod server;
mod tools;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, Transport};
use desktop::NativeDesktop;
use registry::ToolRegistry;
use rmcp::{ServiceExt, transport::stdio};
use server::DesktopMcpServer;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to stderr (stdout is used for MCP communication)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    tracing::info!("Starting desktop-mcp server...");

    let desktop = NativeDesktop::new();
    let capabilities = desktop.probe();
    let registry = Arc::new(ToolRegistry::new(Arc::new(desktop), capabilities));

    match config.transport {
        Transport::Stdio => serve_stdio(registry).await,
        Transport::Http => serve_http(registry, &config).await,
    }
}

async fn serve_stdio(registry: Arc<ToolRegistry>) -> Result<()> {
    let server = DesktopMcpServer::new(registry);
    let service = server.serve(stdio()).await?;

    tracing::info!("Serving MCP over stdio");
    service.waiting().await?;

    Ok(())
}

async fn serve_http(registry: Arc<ToolRegistry>, config: &Config) -> Result<()> {
    use rmcp::transport::streamable_http_server::{
        StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
    };

    let mcp_service = StreamableHttpService::new(
        move || Ok(DesktopMcpServer::new(registry.clone())),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    );
    let app = axum::Router::new().nest_service(constants::MCP_PATH, mcp_service);

    let bind = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    tracing::info!(addr = %bind, path = constants::MCP_PATH, "Serving MCP over streamable HTTP");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
