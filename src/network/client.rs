//! HTTP forwarder - executes one descriptor and normalizes the outcome

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

use crate::models::{HttpMethod, RequestDescriptor, ResponseData, ResponseEnvelope};
use crate::outbound::{assemble, OutboundRequest};

/// Turns a descriptor into exactly one outbound call.
///
/// Holds no per-request state, so a single instance can serve concurrent
/// calls. Idle connections are not kept between calls.
#[derive(Clone, Debug)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new(timeout: Option<Duration>) -> Self {
        Forwarder {
            client: create_client(timeout),
        }
    }

    /// Execute the request. Every outcome, including transport failure, is an
    /// envelope; upstream 4xx/5xx are ordinary results.
    pub async fn forward(&self, request: &RequestDescriptor) -> ResponseEnvelope {
        let outbound = assemble(request);

        let builder = match build_request(&self.client, &outbound) {
            Ok(builder) => builder,
            Err(e) => {
                tracing::warn!(url = %outbound.url, error = %e, "Rejected outbound request");
                return ResponseEnvelope::network_error(e.to_string());
            }
        };

        tracing::info!(method = %outbound.method, url = %outbound.url, "Forwarding request");

        let start = Instant::now();
        match receive(builder).await {
            Ok(mut envelope) => {
                envelope.duration = start.elapsed().as_millis() as u64;
                tracing::info!(
                    status = envelope.status,
                    duration_ms = envelope.duration,
                    "Request completed"
                );
                envelope
            }
            Err(e) => {
                tracing::warn!(url = %outbound.url, error = %e, "Request failed");
                ResponseEnvelope::network_error(e.to_string())
            }
        }
    }
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Create an HTTP client with the forwarder's configuration
pub fn create_client(timeout: Option<Duration>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder().pool_max_idle_per_host(0);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|_| reqwest::Client::new())
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::GET => reqwest::Method::GET,
        HttpMethod::POST => reqwest::Method::POST,
        HttpMethod::PUT => reqwest::Method::PUT,
        HttpMethod::DELETE => reqwest::Method::DELETE,
        HttpMethod::PATCH => reqwest::Method::PATCH,
        HttpMethod::HEAD => reqwest::Method::HEAD,
        HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
    }
}

/// Build a reqwest request from the assembled parts
fn build_request(
    client: &reqwest::Client,
    outbound: &OutboundRequest,
) -> Result<reqwest::RequestBuilder> {
    let url = reqwest::Url::parse(&outbound.url)
        .map_err(|e| anyhow!("Invalid URL '{}': {}", outbound.url, e))?;

    let mut headers = HeaderMap::new();
    for (key, value) in &outbound.headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| anyhow!("Invalid header name: {}", key))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| anyhow!("Invalid value for header {}", key))?;
        // Later entries win, including differently-cased repeats
        headers.insert(name, value);
    }

    let mut req_builder = client
        .request(to_reqwest_method(outbound.method), url)
        .headers(headers);

    if let Some(body) = &outbound.body {
        req_builder = req_builder.body(body.clone());
    }

    Ok(req_builder)
}

/// Send and read the full body; duration is filled in by the caller
async fn receive(builder: reqwest::RequestBuilder) -> Result<ResponseEnvelope> {
    let resp = builder.send().await.map_err(describe_error)?;

    let status = resp.status();
    let headers = flatten_headers(resp.headers());
    let is_json = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);

    let bytes = resp.bytes().await.map_err(describe_error)?;

    Ok(ResponseEnvelope {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("").to_string(),
        headers,
        data: decode_body(&bytes, is_json),
        duration: 0,
        size: None,
    })
}

/// JSON when declared and valid, raw text otherwise
pub fn decode_body(bytes: &[u8], is_json: bool) -> ResponseData {
    if is_json {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(bytes) {
            return ResponseData::Json(value);
        }
    }
    ResponseData::Text(String::from_utf8_lossy(bytes).into_owned())
}

/// One value per name; repeated headers are merged in arrival order
pub fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    flat
}

fn describe_error(e: reqwest::Error) -> anyhow::Error {
    if e.is_timeout() {
        anyhow!("Request timed out: {}", e)
    } else if e.is_connect() {
        anyhow!("Connection failed: {}", e)
    } else if e.is_body() || e.is_decode() {
        anyhow!("Error reading body: {}", e)
    } else {
        anyhow!("Request failed: {}", e)
    }
}
