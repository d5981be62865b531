use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcp_gateway::web::{self, AppState};
use mcp_gateway::{ServerRegistry, StdioConnector};

#[derive(Parser)]
#[command(name = "mcp-gateway")]
#[command(about = "Request-scoped HTTP gateway for stdio MCP servers")]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "GATEWAY_PORT", default_value_t = 8080)]
    port: u16,

    /// Path to the server registry file
    #[arg(long, env = "GATEWAY_REGISTRY", default_value = "servers.json")]
    registry: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let registry = ServerRegistry::load(&cli.registry)?;

    let state = AppState {
        registry: Arc::new(registry),
        connector: Arc::new(StdioConnector),
    };

    web::serve(state, cli.port).await
}
