//! # icurl
//!
//! An API testing client: compose a request, send it through a local proxy
//! endpoint, inspect the normalized response.
//!
//! ## Features
//! - HTTP methods: GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS
//! - Custom headers with per-header enable flags
//! - Auth support (Basic, Bearer, API key)
//! - Request history (last 50) and named saved requests
//! - cURL export/import
//!
//! ## Architecture
//! Actor-based with channels:
//! - App Layer (state machine, persisted collections)
//! - Network Layer (Tokio runtime, forwarder or proxy client)
//! - Proxy endpoint (axum) wrapping the forwarder

pub mod app;
pub mod config;
pub mod constants;
pub mod curl;
pub mod messages;
pub mod models;
pub mod network;
pub mod outbound;
pub mod server;
pub mod storage;
pub mod ui;

// Re-export commonly used types
pub use app::{AppActor, AppState};
pub use config::Config;
pub use curl::{parse_curl, to_curl};
pub use messages::{NetworkCommand, NetworkResponse, Notice};
pub use models::{
    AuthType, Header, HistoryEntry, HttpMethod, RequestDescriptor, ResponseData,
    ResponseEnvelope, SavedRequest,
};
pub use network::{Executor, Forwarder, NetworkActor, ProxyClient};
pub use outbound::{assemble, OutboundRequest};
pub use storage::{FileStorage, MemoryStorage, Storage, StoragePort};
