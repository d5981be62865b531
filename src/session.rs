//! Per-request client session lifecycle
//!
//! A [`ClientSession`] owns exactly one protocol client for the
//! duration of one request: establish (resolve + spawn + handshake +
//! probe), run a single operation, dispose. Disposal is idempotent and
//! must run on every exit path; its failures are logged and never
//! become the request outcome.

use serde_json::{json, Value};

use crate::client::{ClientConnector, ProtocolClient, SpawnSpec, ToolInfo};
use crate::config::{SecretPlacement, ServerConfig, TransportKind};
use crate::error::GatewayError;

/// One live connection to a spawned child server, scoped to a request.
pub struct ClientSession {
    server: String,
    client: Option<Box<dyn ProtocolClient>>,
}

impl ClientSession {
    /// Resolve the descriptor into spawn parameters, start the child,
    /// handshake, and probe liveness.
    ///
    /// Transport and placement checks happen before any process is
    /// spawned. A failed probe still tears the client down before the
    /// error is returned.
    pub async fn establish(
        server: &str,
        config: &ServerConfig,
        secrets: &[(String, String)],
        connector: &dyn ClientConnector,
    ) -> Result<Self, GatewayError> {
        let spec = build_spawn_spec(server, config, secrets)?;

        let client = connector
            .connect(&spec)
            .await
            .map_err(GatewayError::Connection)?;

        let mut session = Self {
            server: server.to_string(),
            client: Some(client),
        };

        if let Err(e) = session.validate().await {
            session.dispose().await;
            return Err(e);
        }

        tracing::debug!(server = %session.server, "Session established");
        Ok(session)
    }

    /// Liveness probe; fails fast if the child process died.
    async fn validate(&self) -> Result<(), GatewayError> {
        self.client()?.ping().await.map_err(GatewayError::Connection)
    }

    fn client(&self) -> Result<&dyn ProtocolClient, GatewayError> {
        self.client.as_deref().ok_or_else(|| {
            GatewayError::Connection(anyhow::anyhow!(
                "session for '{}' already disposed",
                self.server
            ))
        })
    }

    /// Fetch the server's tool catalog, returned verbatim.
    pub async fn list_tools(&self) -> Result<Vec<ToolInfo>, GatewayError> {
        self.validate().await?;
        self.client()?
            .list_tools()
            .await
            .map_err(GatewayError::Protocol)
    }

    /// Invoke a tool and normalize its result.
    ///
    /// Only the first content part is read; an empty content list is an
    /// error in its own right, and a result flagged `is_error` surfaces
    /// as the tool's own failure rather than a transport problem.
    pub async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Option<Value>,
    ) -> Result<Value, GatewayError> {
        self.validate().await?;

        let outcome = self
            .client()?
            .call_tool(tool_name, arguments)
            .await
            .map_err(GatewayError::Protocol)?;

        let first = outcome.content.first().ok_or(GatewayError::EmptyResult)?;

        if outcome.is_error {
            let detail = serde_json::to_string(first).unwrap_or_else(|_| first.text.clone());
            return Err(GatewayError::ToolExecution(detail));
        }

        Ok(parse_tool_text(&first.text))
    }

    /// Terminate the child and close its pipes.
    ///
    /// Safe to call more than once; a second call is a no-op. Close
    /// failures (e.g. the process already died) are logged only.
    pub async fn dispose(&mut self) {
        if let Some(mut client) = self.client.take() {
            if let Err(e) = client.close().await {
                tracing::warn!(server = %self.server, "Error disposing MCP client: {e:#}");
            }
        }
    }
}

/// Backstop for cancellation: if the request future is dropped before
/// `dispose` ran, close the client from a background task so the child
/// process still gets torn down.
impl Drop for ClientSession {
    fn drop(&mut self) {
        if let Some(mut client) = self.client.take() {
            tracing::warn!(server = %self.server, "Session dropped without dispose, closing client in background");
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = client.close().await {
                        tracing::warn!("Error disposing MCP client: {e:#}");
                    }
                });
            }
        }
    }
}

/// Build spawn parameters from the descriptor's placement policy.
///
/// `Args` placement appends secret values positionally in declared
/// order and leaves the child environment empty of secrets; `Env`
/// placement makes the resolved secret map the child's entire
/// environment and appends nothing.
fn build_spawn_spec(
    server: &str,
    config: &ServerConfig,
    secrets: &[(String, String)],
) -> Result<SpawnSpec, GatewayError> {
    if config.transport != TransportKind::Stdio {
        return Err(GatewayError::UnsupportedTransport(
            config.transport.as_str().to_string(),
        ));
    }

    let (args, env) = match config.env_place {
        SecretPlacement::Args => (
            secrets.iter().map(|(_, value)| value.clone()).collect(),
            Default::default(),
        ),
        SecretPlacement::Env => (Vec::new(), secrets.iter().cloned().collect()),
    };

    Ok(SpawnSpec {
        server: server.to_string(),
        program: config.command.clone(),
        args,
        env,
    })
}

/// Best-effort JSON parse of a tool's textual payload.
///
/// Anything that does not parse comes back as `{"text": <raw>}`.
pub fn parse_tool_text(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "text": text }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(place: SecretPlacement, transport: TransportKind) -> ServerConfig {
        ServerConfig {
            command: "/opt/servers/echo".into(),
            env: vec!["TOKEN".into(), "REGION".into()],
            env_place: place,
            transport,
        }
    }

    fn secrets() -> Vec<(String, String)> {
        vec![
            ("TOKEN".to_string(), "abc".to_string()),
            ("REGION".to_string(), "eu".to_string()),
        ]
    }

    #[test]
    fn env_placement_fills_environment_only() {
        let spec = build_spawn_spec(
            "echo",
            &config(SecretPlacement::Env, TransportKind::Stdio),
            &secrets(),
        )
        .unwrap();
        assert!(spec.args.is_empty());
        assert_eq!(spec.env.get("TOKEN"), Some(&"abc".to_string()));
        assert_eq!(spec.env.get("REGION"), Some(&"eu".to_string()));
        assert_eq!(spec.env.len(), 2);
    }

    #[test]
    fn args_placement_appends_values_in_declared_order() {
        let spec = build_spawn_spec(
            "echo",
            &config(SecretPlacement::Args, TransportKind::Stdio),
            &secrets(),
        )
        .unwrap();
        assert_eq!(spec.args, vec!["abc", "eu"]);
        assert!(spec.env.is_empty());
    }

    #[test]
    fn non_stdio_transport_is_rejected_before_spawn() {
        let err = build_spawn_spec(
            "echo",
            &config(SecretPlacement::Env, TransportKind::Sse),
            &secrets(),
        )
        .unwrap_err();
        match err {
            GatewayError::UnsupportedTransport(kind) => assert_eq!(kind, "sse"),
            other => panic!("expected UnsupportedTransport, got {other:?}"),
        }
    }

    #[test]
    fn parse_tool_text_passes_json_through() {
        let value = parse_tool_text(r#"{"results": [1, 2, 3]}"#);
        assert_eq!(value, json!({"results": [1, 2, 3]}));
    }

    #[test]
    fn parse_tool_text_wraps_plain_text() {
        let value = parse_tool_text("plain output, not json");
        assert_eq!(value, json!({"text": "plain output, not json"}));
    }

    #[test]
    fn parse_tool_text_accepts_json_scalars() {
        assert_eq!(parse_tool_text("42"), json!(42));
        assert_eq!(parse_tool_text("\"quoted\""), json!("quoted"));
    }
}
