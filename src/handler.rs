//! Request orchestration
//!
//! One inbound request becomes exactly one subprocess lifecycle:
//! lookup, secret resolution, establish, a single operation, dispose.
//! All failures funnel through [`GatewayError`], the single
//! normalization point the HTTP layer maps to statuses.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::client::ClientConnector;
use crate::config::ServerRegistry;
use crate::error::GatewayError;
use crate::session::ClientSession;

/// The one logical operation a request performs.
#[derive(Debug, Clone)]
pub enum Operation {
    ListTools,
    CallTool {
        tool: String,
        arguments: Option<Value>,
    },
}

/// Handle one request end to end.
///
/// Unknown server names and missing secrets are rejected before any
/// process is spawned. Once a session exists, disposal runs no matter
/// how the operation ends.
pub async fn handle_request(
    registry: &ServerRegistry,
    connector: &dyn ClientConnector,
    server: &str,
    secrets: &HashMap<String, String>,
    operation: Operation,
) -> Result<Value, GatewayError> {
    let config = registry
        .get(server)
        .ok_or_else(|| GatewayError::UnknownServer(server.to_string()))?;

    let resolved = config.resolve_secrets(secrets)?;

    let mut session = ClientSession::establish(server, config, &resolved, connector).await?;

    let result = match operation {
        Operation::ListTools => session
            .list_tools()
            .await
            .map(|tools| json!({ "tools": tools })),
        Operation::CallTool { tool, arguments } => {
            tracing::info!(server, tool = %tool, "Calling tool");
            session.call_tool(&tool, arguments).await
        }
    };

    // Always dispose before the request completes, success or not.
    session.dispose().await;

    result
}
