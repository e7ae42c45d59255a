mod common;

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use icurl::{
    server, AppActor, Executor, Forwarder, HttpMethod, MemoryStorage, Notice, ProxyClient,
    RequestDescriptor, ResponseData, ResponseEnvelope,
};
use serde_json::json;
use tower::ServiceExt;

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn envelope(response: axum::response::Response) -> ResponseEnvelope {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn proxy_request(body: String) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/api/proxy")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap()
}

// --- preflight ---

#[tokio::test]
async fn options_answers_cors_preflight() {
    let app = server::app(Forwarder::default());
    let resp = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/proxy")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(
        headers["access-control-allow-methods"],
        "GET, POST, PUT, DELETE, PATCH, OPTIONS"
    );
    assert_eq!(
        headers["access-control-allow-headers"],
        "Content-Type, Authorization, X-API-Key"
    );
    assert!(body_bytes(resp).await.is_empty());
}

// --- forwarding ---

#[tokio::test]
async fn proxies_wire_shaped_descriptor() {
    let base = common::spawn_upstream().await;
    let payload = json!({
        "url": format!("{}/json", base),
        "method": "GET",
        "headers": [{"key": "", "value": "", "enabled": true}],
        "body": "",
        "auth": {"type": "none", "username": "", "password": "", "token": ""}
    });

    let resp = server::app(Forwarder::default())
        .oneshot(proxy_request(payload.to_string()))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let raw: serde_json::Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(raw["status"], 200);
    assert_eq!(raw["statusText"], "OK");
    assert_eq!(raw["data"], json!({"a": 1}));
    assert!(raw["duration"].is_u64());
    assert!(raw.get("size").is_none());
}

#[tokio::test]
async fn upstream_error_status_is_http_200() {
    let base = common::spawn_upstream().await;
    let payload = json!({"url": format!("{}/teapot", base), "method": "GET"});

    let resp = server::app(Forwarder::default())
        .oneshot(proxy_request(payload.to_string()))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(envelope(resp).await.status, 418);
}

#[tokio::test]
async fn transport_failure_is_500_with_envelope() {
    let base = common::closed_port_url().await;
    let payload = json!({"url": base, "method": "GET"});

    let resp = server::app(Forwarder::default())
        .oneshot(proxy_request(payload.to_string()))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let env = envelope(resp).await;
    assert_eq!(env.status, 0);
    assert_eq!(env.status_text, "Network Error");
    assert!(env.headers.is_empty());
    assert_eq!(env.duration, 0);
}

#[tokio::test]
async fn garbage_payload_is_500_with_envelope() {
    let resp = server::app(Forwarder::default())
        .oneshot(proxy_request("{not json".to_string()))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let env = envelope(resp).await;
    assert!(env.is_network_error());
    let message = env.data.as_json().unwrap()["error"].as_str().unwrap().to_string();
    assert!(message.starts_with("Invalid request payload"));
}

// --- end to end through a running proxy ---

#[tokio::test]
async fn app_sends_through_proxy_and_records_history() {
    let upstream = common::spawn_upstream().await;
    let proxy = common::spawn(server::app(Forwarder::default())).await;

    let mut actor = AppActor::spawn(Executor::Proxy(ProxyClient::new(&proxy)), MemoryStorage::new());
    actor
        .state
        .set_request(RequestDescriptor::new(HttpMethod::GET, format!("{}/text", upstream)));

    assert!(actor.send().await.unwrap());
    let mut state = actor.shutdown().await.unwrap();

    let response = state.response.clone().unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.data, ResponseData::Text("hello".into()));
    assert_eq!(response.size, Some("\"hello\"".len()));
    assert_eq!(state.storage.history_len(), 1);

    let notices = state.drain_notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message().starts_with("Request completed in"));
}

#[tokio::test]
async fn unreachable_proxy_leaves_history_alone() {
    let proxy = common::closed_port_url().await;

    let mut actor = AppActor::spawn(Executor::Proxy(ProxyClient::new(&proxy)), MemoryStorage::new());
    actor
        .state
        .set_request(RequestDescriptor::new(HttpMethod::GET, "http://example.invalid/"));

    assert!(actor.send().await.unwrap());
    let mut state = actor.shutdown().await.unwrap();

    assert!(state.response.is_none());
    assert_eq!(state.storage.history_len(), 0);
    let notices = state.drain_notices();
    assert!(matches!(&notices[..], [Notice::Error(m)] if m.starts_with("Request failed:")));
}

#[tokio::test]
async fn missing_url_never_reaches_network() {
    let mut actor = AppActor::spawn(Executor::Direct(Forwarder::default()), MemoryStorage::new());

    assert!(!actor.send().await.unwrap());
    let mut state = actor.shutdown().await.unwrap();
    assert_eq!(state.drain_notices(), vec![Notice::error("Please enter a URL")]);
}
