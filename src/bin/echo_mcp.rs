//! Echo MCP Server
//!
//! Small stdio MCP server used for gateway demos and end-to-end tests.
//! Its tools report back what the process actually received - secrets
//! in its environment, positional arguments - and exercise the
//! gateway's raw-text and error normalization paths.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    transport::stdio,
    ErrorData as McpError, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Clone)]
pub struct EchoMcpServer {
    tool_router: ToolRouter<Self>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EchoParams {
    /// The message to echo back
    #[schemars(description = "Message to echo back verbatim")]
    pub message: String,
}

#[tool_router]
impl EchoMcpServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Report the TOKEN secret and positional arguments this process received.")]
    async fn ping(&self) -> Result<CallToolResult, McpError> {
        #[derive(Serialize)]
        struct PingReport {
            token: Option<String>,
            args: Vec<String>,
        }

        let report = PingReport {
            token: std::env::var("TOKEN").ok(),
            args: std::env::args().skip(1).collect(),
        };

        let json = serde_json::to_string(&report)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Echo the message back as plain text.")]
    async fn echo(
        &self,
        Parameters(params): Parameters<EchoParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(params.message)]))
    }

    #[tool(description = "Always fail, reporting a tool-level error.")]
    async fn fail(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::error(vec![Content::text(
            "echo tool failure",
        )]))
    }
}

impl Default for EchoMcpServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl rmcp::ServerHandler for EchoMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Echo MCP Server - reports the secrets and arguments it was \
                 started with, echoes messages, and can fail on demand."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol; logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();

    tracing::info!("Starting Echo MCP Server");

    let service = EchoMcpServer::new().serve(stdio()).await?;
    service.waiting().await?;

    tracing::info!("Server shutting down");
    Ok(())
}
