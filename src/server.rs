//! Proxy endpoint - the HTTP boundary around the forwarder

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use tokio::net::TcpListener;

use crate::constants::{CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS, CORS_ALLOW_ORIGIN, PROXY_ROUTE};
use crate::models::{RequestDescriptor, ResponseEnvelope};
use crate::network::Forwarder;

pub type SharedForwarder = Arc<Forwarder>;

pub fn app(forwarder: Forwarder) -> Router {
    Router::new()
        .route(PROXY_ROUTE, post(proxy).options(preflight))
        .with_state(Arc::new(forwarder))
}

pub async fn run(listener: TcpListener, forwarder: Forwarder) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, route = PROXY_ROUTE, "Proxy listening");
    }
    axum::serve(listener, app(forwarder)).await
}

/// Forward one descriptor. The body is decoded by hand so that a bad payload
/// still yields an envelope instead of an extractor rejection.
async fn proxy(State(forwarder): State<SharedForwarder>, body: Bytes) -> impl IntoResponse {
    let envelope = match serde_json::from_slice::<RequestDescriptor>(&body) {
        Ok(request) => forwarder.forward(&request).await,
        Err(e) => {
            tracing::warn!(error = %e, "Undecodable proxy payload");
            ResponseEnvelope::network_error(format!("Invalid request payload: {}", e))
        }
    };

    let status = if envelope.is_network_error() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(envelope))
}

async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, CORS_ALLOW_ORIGIN),
            (header::ACCESS_CONTROL_ALLOW_METHODS, CORS_ALLOW_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, CORS_ALLOW_HEADERS),
        ],
    )
}
