//! HTTP surface
//!
//! Routes:
//! - `GET /health` - registry summary
//! - `GET /{server}` - list the server's tools
//! - `POST /{server}/{tool}` - call a tool with an optional JSON body
//!
//! Secrets arrive as request headers named exactly as the descriptor's
//! required-secret list declares them. Anything else is an unsupported
//! route and answers 404.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};

use crate::client::ClientConnector;
use crate::config::{ServerConfig, ServerRegistry};
use crate::error::GatewayError;
use crate::handler::{handle_request, Operation};

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ServerRegistry>,
    pub connector: Arc<dyn ClientConnector>,
}

/// Error response envelope
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn into_api_error(err: GatewayError) -> ApiError {
    tracing::error!("Request failed: {err:#}");
    (
        err.status(),
        Json(ErrorBody {
            message: err.to_string(),
            code: err.code().to_string(),
        }),
    )
}

/// Start the gateway server.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting gateway on http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check).fallback(unsupported_route))
        .route("/{server}", get(list_tools).fallback(unsupported_route))
        .route(
            "/{server}/{tool}",
            post(call_tool).fallback(unsupported_route),
        )
        .fallback(unsupported_route)
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    servers: Vec<String>,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        servers: state.registry.server_names(),
    })
}

/// GET /{server} - list tools
async fn list_tools(
    State(state): State<AppState>,
    Path(server): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let secrets = secrets_from_headers(state.registry.get(&server), &headers);

    handle_request(
        &state.registry,
        state.connector.as_ref(),
        &server,
        &secrets,
        Operation::ListTools,
    )
    .await
    .map(Json)
    .map_err(into_api_error)
}

/// POST /{server}/{tool} - call a tool
async fn call_tool(
    State(state): State<AppState>,
    Path((server, tool)): Path<(String, String)>,
    headers: HeaderMap,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let secrets = secrets_from_headers(state.registry.get(&server), &headers);
    let arguments = body.map(|Json(v)| v);

    handle_request(
        &state.registry,
        state.connector.as_ref(),
        &server,
        &secrets,
        Operation::CallTool { tool, arguments },
    )
    .await
    .map(Json)
    .map_err(into_api_error)
}

/// Everything that doesn't match a supported method/path shape.
async fn unsupported_route() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            message: "Not Found - Unsupported route".to_string(),
            code: "UNSUPPORTED_ROUTE".to_string(),
        }),
    )
}

/// Collect the secrets a descriptor declares from request headers.
///
/// Only declared names are read; an unknown server yields an empty map
/// and the lookup failure is reported downstream.
fn secrets_from_headers(
    config: Option<&ServerConfig>,
    headers: &HeaderMap,
) -> HashMap<String, String> {
    let Some(config) = config else {
        return HashMap::new();
    };

    config
        .env
        .iter()
        .filter_map(|name| {
            headers
                .get(name.as_str())
                .and_then(|v| v.to_str().ok())
                .map(|v| (name.clone(), v.to_string()))
        })
        .collect()
}
