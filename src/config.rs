//! Server registry configuration
//!
//! The registry maps a symbolic server name to the descriptor needed to
//! spawn it: executable path, the ordered list of secret names it
//! requires, where those secrets go (environment vs. positional
//! arguments), and the transport kind. Loaded once from `servers.json`
//! and injected wherever a lookup is needed, so tests can substitute
//! their own registries.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::GatewayError;

/// Where a server's secrets are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretPlacement {
    /// Secrets become the spawned process's environment.
    Env,
    /// Secret values are appended as positional arguments, in the order
    /// the descriptor declares them.
    Args,
}

/// Transport the child process speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Stdio,
    Sse,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Stdio => "stdio",
            TransportKind::Sse => "sse",
        }
    }
}

/// Descriptor for one invocable MCP server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Path to the server executable.
    pub command: String,
    /// Required secret names, in delivery order.
    #[serde(default)]
    pub env: Vec<String>,
    #[serde(default = "default_env_place")]
    pub env_place: SecretPlacement,
    #[serde(default = "default_transport")]
    pub transport: TransportKind,
}

fn default_env_place() -> SecretPlacement {
    SecretPlacement::Env
}

fn default_transport() -> TransportKind {
    TransportKind::Stdio
}

impl ServerConfig {
    /// Resolve the provided secret map against this descriptor.
    ///
    /// Returns the values in declared order. Every required name must be
    /// present and non-empty; all missing names are reported together,
    /// before any process is spawned.
    pub fn resolve_secrets(
        &self,
        provided: &HashMap<String, String>,
    ) -> Result<Vec<(String, String)>, GatewayError> {
        let missing: Vec<String> = self
            .env
            .iter()
            .filter(|name| provided.get(*name).map_or(true, |v| v.is_empty()))
            .cloned()
            .collect();

        if !missing.is_empty() {
            return Err(GatewayError::MissingSecrets(missing));
        }

        Ok(self
            .env
            .iter()
            .map(|name| (name.clone(), provided[name].clone()))
            .collect())
    }
}

/// Immutable name -> descriptor mapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRegistry {
    servers: HashMap<String, ServerConfig>,
}

impl ServerRegistry {
    pub fn new(servers: HashMap<String, ServerConfig>) -> Self {
        Self { servers }
    }

    /// Load the registry from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry file {}", path.display()))?;
        let registry: ServerRegistry = serde_json::from_str(&content)
            .with_context(|| format!("Invalid registry file {}", path.display()))?;
        tracing::info!(
            servers = registry.servers.len(),
            "Loaded server registry from {}",
            path.display()
        );
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.get(name)
    }

    pub fn server_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.servers.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_registry() -> ServerRegistry {
        let json = r#"{
            "servers": {
                "brave-search": {
                    "command": "mcp_servers/brave-search/index.js",
                    "env": ["BRAVE_API_KEY"],
                    "envPlace": "env",
                    "transport": "stdio"
                },
                "postgres": {
                    "command": "mcp_servers/postgres/index.js",
                    "env": ["POSTGRES_URL"],
                    "envPlace": "args"
                }
            }
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_registry_json() {
        let registry = sample_registry();
        let brave = registry.get("brave-search").unwrap();
        assert_eq!(brave.env, vec!["BRAVE_API_KEY"]);
        assert_eq!(brave.env_place, SecretPlacement::Env);
        assert_eq!(brave.transport, TransportKind::Stdio);

        let postgres = registry.get("postgres").unwrap();
        assert_eq!(postgres.env_place, SecretPlacement::Args);
        // transport defaults to stdio when omitted
        assert_eq!(postgres.transport, TransportKind::Stdio);
    }

    #[test]
    fn unknown_server_lookup_is_none() {
        assert!(sample_registry().get("nope").is_none());
    }

    #[test]
    fn loads_registry_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"servers": {{"echo": {{"command": "/bin/echo-mcp", "env": ["TOKEN"]}}}}}}"#
        )
        .unwrap();
        let registry = ServerRegistry::load(file.path()).unwrap();
        assert_eq!(registry.server_names(), vec!["echo"]);
    }

    #[test]
    fn resolve_secrets_preserves_declared_order() {
        let config = ServerConfig {
            command: "srv".into(),
            env: vec!["B_KEY".into(), "A_KEY".into()],
            env_place: SecretPlacement::Args,
            transport: TransportKind::Stdio,
        };
        let provided = HashMap::from([
            ("A_KEY".to_string(), "a".to_string()),
            ("B_KEY".to_string(), "b".to_string()),
        ]);
        let resolved = config.resolve_secrets(&provided).unwrap();
        assert_eq!(
            resolved,
            vec![
                ("B_KEY".to_string(), "b".to_string()),
                ("A_KEY".to_string(), "a".to_string()),
            ]
        );
    }

    #[test]
    fn resolve_secrets_reports_all_missing_names() {
        let config = ServerConfig {
            command: "srv".into(),
            env: vec!["ONE".into(), "TWO".into(), "THREE".into()],
            env_place: SecretPlacement::Env,
            transport: TransportKind::Stdio,
        };
        let provided = HashMap::from([
            ("TWO".to_string(), "".to_string()), // empty counts as missing
            ("THREE".to_string(), "x".to_string()),
        ]);
        match config.resolve_secrets(&provided) {
            Err(GatewayError::MissingSecrets(names)) => {
                assert_eq!(names, vec!["ONE".to_string(), "TWO".to_string()]);
            }
            other => panic!("expected MissingSecrets, got {other:?}"),
        }
    }
}
