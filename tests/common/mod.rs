//! Local upstream used by the integration tests

#![allow(dead_code)]

use axum::{
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

pub fn upstream() -> Router {
    Router::new()
        .route("/json", get(json_body))
        .route("/text", get(text_body))
        .route("/bad-json", get(bad_json))
        .route("/teapot", get(teapot))
        .route("/multi", get(multi_header))
        .route("/echo", any(echo))
}

/// Serve the upstream on an ephemeral port, returning its base URL
pub async fn spawn_upstream() -> String {
    spawn(upstream()).await
}

pub async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing is listening on
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn json_body() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], r#"{"a":1}"#)
}

async fn text_body() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain")], "hello")
}

async fn bad_json() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json; charset=utf-8")], "{bad")
}

async fn teapot() -> impl IntoResponse {
    (
        StatusCode::IM_A_TEAPOT,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"error":"short and stout"}"#,
    )
}

async fn multi_header() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.append("x-multi", "one".parse().unwrap());
    headers.append("x-multi", "two".parse().unwrap());
    (headers, "ok")
}

/// Reflects method, headers and body back as JSON
async fn echo(method: Method, headers: HeaderMap, body: String) -> Json<Value> {
    let mut seen = Map::new();
    for (name, value) in &headers {
        seen.insert(
            name.as_str().to_string(),
            Value::String(value.to_str().unwrap_or_default().to_string()),
        );
    }
    Json(json!({
        "method": method.as_str(),
        "headers": seen,
        "body": body,
    }))
}
