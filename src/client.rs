//! Protocol client capability
//!
//! The gateway drives child MCP servers through the [`ProtocolClient`]
//! trait (ping / list tools / call tool / close) and obtains instances
//! through a [`ClientConnector`]. Production uses the rmcp SDK over a
//! child-process stdio transport; tests substitute in-memory fakes and
//! never spawn anything.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rmcp::{
    model::{CallToolRequestParam, ClientRequest},
    service::{RoleClient, RunningService},
    transport::TokioChildProcess,
    ServiceExt,
};
use serde::Serialize;
use serde_json::Value;
use tokio::process::Command;

/// Startup timeout covering spawn plus MCP initialization.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// A tool advertised by an MCP server.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    /// Server this tool belongs to
    pub server: String,
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: Option<String>,
    /// Input schema (JSON)
    pub input_schema: Option<Value>,
}

/// One content part of a tool call result.
#[derive(Debug, Clone, Serialize)]
pub struct ContentPart {
    pub text: String,
}

/// Raw outcome of a tool call, before normalization.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub content: Vec<ContentPart>,
    pub is_error: bool,
}

/// Everything needed to spawn one child server process.
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    /// Server name, for logging only.
    pub server: String,
    pub program: String,
    pub args: Vec<String>,
    /// The child's entire environment; nothing ambient leaks through.
    pub env: HashMap<String, String>,
}

/// Live connection to one child MCP server.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Liveness probe against the child process.
    async fn ping(&self) -> Result<()>;

    /// Fetch the server's tool catalog.
    async fn list_tools(&self) -> Result<Vec<ToolInfo>>;

    /// Invoke a named tool with a JSON argument object.
    async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<ToolOutcome>;

    /// Terminate the child process and close its pipes.
    ///
    /// Closing an already-closed client is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// Factory producing connected [`ProtocolClient`] instances.
#[async_trait]
pub trait ClientConnector: Send + Sync {
    async fn connect(&self, spec: &SpawnSpec) -> Result<Box<dyn ProtocolClient>>;
}

// =============================================================================
// rmcp-backed production implementation
// =============================================================================

/// Spawns child processes and speaks MCP over their stdio pipes.
#[derive(Debug, Default)]
pub struct StdioConnector;

#[async_trait]
impl ClientConnector for StdioConnector {
    async fn connect(&self, spec: &SpawnSpec) -> Result<Box<dyn ProtocolClient>> {
        tracing::debug!(server = %spec.server, program = %spec.program, "Spawning MCP server");

        let mut cmd = Command::new(&spec.program);
        if !spec.args.is_empty() {
            cmd.args(&spec.args);
        }
        // The child environment is exactly the resolved secret map.
        cmd.env_clear();
        cmd.envs(&spec.env);

        // Wrap spawn + initialization in the startup timeout
        let service = tokio::time::timeout(STARTUP_TIMEOUT, async {
            let transport = TokioChildProcess::new(cmd)?;
            let svc = ().serve(transport).await?;
            Ok::<_, anyhow::Error>(svc)
        })
        .await
        .map_err(|_| {
            anyhow!(
                "MCP server '{}' startup timed out after {:?}",
                spec.server,
                STARTUP_TIMEOUT
            )
        })??;

        Ok(Box::new(RmcpClient {
            server: spec.server.clone(),
            service: Some(service),
        }))
    }
}

/// [`ProtocolClient`] backed by a running rmcp client service.
///
/// If a request is cancelled before `close` runs, dropping the running
/// service still cancels the service task and kills the child process.
pub struct RmcpClient {
    server: String,
    service: Option<RunningService<RoleClient, ()>>,
}

impl RmcpClient {
    fn service(&self) -> Result<&RunningService<RoleClient, ()>> {
        self.service
            .as_ref()
            .ok_or_else(|| anyhow!("client for '{}' already closed", self.server))
    }
}

#[async_trait]
impl ProtocolClient for RmcpClient {
    async fn ping(&self) -> Result<()> {
        self.service()?
            .send_request(ClientRequest::PingRequest(Default::default()))
            .await
            .with_context(|| format!("Ping to server '{}' failed", self.server))?;
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<ToolInfo>> {
        let response = self
            .service()?
            .list_tools(Default::default())
            .await
            .context("Failed to list tools")?;

        Ok(response
            .tools
            .into_iter()
            .map(|t| ToolInfo {
                server: self.server.clone(),
                name: t.name.to_string(),
                description: t.description.map(|d| d.to_string()),
                input_schema: Some(serde_json::to_value(&t.input_schema).unwrap_or_default()),
            })
            .collect())
    }

    async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<ToolOutcome> {
        let args = arguments.and_then(|v| v.as_object().cloned());
        let result = self
            .service()?
            .call_tool(CallToolRequestParam {
                name: name.to_string().into(),
                arguments: args,
                task: None,
            })
            .await
            .context("Failed to call tool")?;

        let content = result
            .content
            .iter()
            .map(|part| match &part.raw {
                rmcp::model::RawContent::Text(text) => ContentPart {
                    text: text.text.to_string(),
                },
                // Non-text content is surfaced in serialized form
                other => ContentPart {
                    text: format!("{:?}", other),
                },
            })
            .collect();

        Ok(ToolOutcome {
            content,
            is_error: result.is_error.unwrap_or(false),
        })
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(service) = self.service.take() {
            service.cancel().await?;
            tracing::debug!(server = %self.server, "MCP client closed");
        }
        Ok(())
    }
}
