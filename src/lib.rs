//! mcp-gateway - request-scoped HTTP gateway for stdio MCP servers
//!
//! Each inbound request spawns one child MCP server process, performs
//! the capability handshake, runs exactly one operation (list tools or
//! call one tool), normalizes the outcome into a uniform JSON envelope,
//! and tears the process down before the request completes.
//!
//! - [`config`]: server registry (name -> descriptor)
//! - [`client`]: protocol client capability + rmcp-backed implementation
//! - [`session`]: per-request lifecycle with guaranteed disposal
//! - [`handler`]: request orchestration and error normalization
//! - [`web`]: axum HTTP surface
//! - [`lru`] / [`search`]: bounded recency cache and the cached
//!   remote-call helper built on it

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod lru;
pub mod search;
pub mod session;
pub mod web;

pub use client::{ClientConnector, ProtocolClient, StdioConnector};
pub use config::{SecretPlacement, ServerConfig, ServerRegistry, TransportKind};
pub use error::GatewayError;
pub use handler::{handle_request, Operation};
pub use lru::LruCache;
pub use session::ClientSession;
