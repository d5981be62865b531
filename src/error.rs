//! Gateway error taxonomy
//!
//! Every failure in the request path flows into [`GatewayError`], which
//! carries the HTTP status classification and a machine-readable code
//! for the response envelope. Disposal failures are deliberately absent
//! here: they are logged at the session layer and never surface as the
//! request outcome.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The requested server name is not in the registry.
    #[error("unknown server '{0}'")]
    UnknownServer(String),

    /// One or more secrets the descriptor requires were not supplied.
    #[error("missing required secrets: {}", .0.join(", "))]
    MissingSecrets(Vec<String>),

    /// The descriptor declares a transport the gateway cannot drive.
    #[error("unsupported transport '{0}'")]
    UnsupportedTransport(String),

    /// Spawn, handshake, or liveness probe failed.
    #[error("connection to server failed: {0:#}")]
    Connection(#[source] anyhow::Error),

    /// The catalog or call exchange itself failed.
    #[error("protocol failure: {0:#}")]
    Protocol(#[source] anyhow::Error),

    /// The tool returned an empty content list.
    #[error("no content returned from tool")]
    EmptyResult,

    /// The tool reported its own failure; the detail is the content part.
    #[error("tool execution failed: {0}")]
    ToolExecution(String),
}

impl GatewayError {
    /// HTTP status classification for the response envelope.
    ///
    /// Client-input problems are 400, upstream connection failures 502,
    /// everything past a validated connection 500.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::UnknownServer(_)
            | GatewayError::MissingSecrets(_)
            | GatewayError::UnsupportedTransport(_) => StatusCode::BAD_REQUEST,
            GatewayError::Connection(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Protocol(_)
            | GatewayError::EmptyResult
            | GatewayError::ToolExecution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for callers that switch on errors.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::UnknownServer(_) => "UNKNOWN_SERVER",
            GatewayError::MissingSecrets(_) => "MISSING_SECRETS",
            GatewayError::UnsupportedTransport(_) => "UNSUPPORTED_TRANSPORT",
            GatewayError::Connection(_) => "CONNECTION_FAILED",
            GatewayError::Protocol(_) => "PROTOCOL_ERROR",
            GatewayError::EmptyResult => "EMPTY_RESULT",
            GatewayError::ToolExecution(_) => "TOOL_EXECUTION_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn client_input_errors_map_to_bad_request() {
        assert_eq!(
            GatewayError::UnknownServer("nope".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::MissingSecrets(vec!["TOKEN".into()]).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::UnsupportedTransport("sse".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn connection_failures_map_to_bad_gateway() {
        let err = GatewayError::Connection(anyhow!("spawn failed"));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), "CONNECTION_FAILED");
    }

    #[test]
    fn tool_failures_map_to_internal_error() {
        assert_eq!(
            GatewayError::EmptyResult.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::ToolExecution("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::Protocol(anyhow!("bad frame")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn missing_secrets_message_lists_names() {
        let err = GatewayError::MissingSecrets(vec!["A".into(), "B".into()]);
        assert!(err.to_string().contains("A, B"));
    }
}
