//! End-to-end tests spawning the real echo-mcp child process.
//!
//! These drive the full lifecycle: spawn, MCP handshake, liveness
//! probe, one operation, teardown. The echo server reports back the
//! secrets and arguments it actually received, so secret placement is
//! verified from inside the child.

use std::collections::HashMap;

use serde_json::{json, Value};

use mcp_gateway::{
    handle_request, GatewayError, Operation, SecretPlacement, ServerConfig, ServerRegistry,
    StdioConnector, TransportKind,
};

fn echo_registry() -> ServerRegistry {
    let command = env!("CARGO_BIN_EXE_echo-mcp").to_string();
    let mut servers = HashMap::new();
    servers.insert(
        "echo".to_string(),
        ServerConfig {
            command: command.clone(),
            env: vec!["TOKEN".to_string()],
            env_place: SecretPlacement::Env,
            transport: TransportKind::Stdio,
        },
    );
    servers.insert(
        "echo-args".to_string(),
        ServerConfig {
            command,
            env: vec!["TOKEN".to_string()],
            env_place: SecretPlacement::Args,
            transport: TransportKind::Stdio,
        },
    );
    ServerRegistry::new(servers)
}

fn token_secrets() -> HashMap<String, String> {
    HashMap::from([("TOKEN".to_string(), "abc".to_string())])
}

async fn run(server: &str, operation: Operation) -> Result<Value, GatewayError> {
    handle_request(
        &echo_registry(),
        &StdioConnector,
        server,
        &token_secrets(),
        operation,
    )
    .await
}

#[tokio::test]
async fn env_placed_secret_reaches_child_environment() {
    let body = run(
        "echo",
        Operation::CallTool {
            tool: "ping".to_string(),
            arguments: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(body["token"], json!("abc"));
    assert_eq!(body["args"], json!([]));
}

#[tokio::test]
async fn args_placed_secret_arrives_positionally_not_in_env() {
    let body = run(
        "echo-args",
        Operation::CallTool {
            tool: "ping".to_string(),
            arguments: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(body["token"], Value::Null);
    assert_eq!(body["args"], json!(["abc"]));
}

#[tokio::test]
async fn catalog_lists_the_echo_tools() {
    let body = run("echo", Operation::ListTools).await.unwrap();

    let names: Vec<&str> = body["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    for expected in ["ping", "echo", "fail"] {
        assert!(names.contains(&expected), "missing tool {expected}");
    }
}

#[tokio::test]
async fn plain_text_tool_output_is_wrapped() {
    let body = run(
        "echo",
        Operation::CallTool {
            tool: "echo".to_string(),
            arguments: Some(json!({"message": "hello, gateway"})),
        },
    )
    .await
    .unwrap();

    assert_eq!(body, json!({"text": "hello, gateway"}));
}

#[tokio::test]
async fn failing_tool_surfaces_as_tool_execution_error() {
    let err = run(
        "echo",
        Operation::CallTool {
            tool: "fail".to_string(),
            arguments: None,
        },
    )
    .await
    .unwrap_err();

    match err {
        GatewayError::ToolExecution(detail) => assert!(detail.contains("echo tool failure")),
        other => panic!("expected ToolExecution, got {other:?}"),
    }
}
