//! Client for a running proxy endpoint

use anyhow::{Context, Result};

use crate::constants::PROXY_ROUTE;
use crate::models::{RequestDescriptor, ResponseEnvelope};

/// Sends descriptors to `POST {base}/api/proxy` and decodes the envelope.
///
/// Unlike the in-process forwarder this can fail: the proxy itself may be
/// unreachable or answer with something that is not an envelope.
#[derive(Clone, Debug)]
pub struct ProxyClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> Self {
        ProxyClient {
            client: reqwest::Client::new(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), PROXY_ROUTE),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn send(&self, request: &RequestDescriptor) -> Result<ResponseEnvelope> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .with_context(|| format!("Could not reach proxy at {}", self.endpoint))?;

        // A failure envelope arrives with HTTP 500, so the status is not checked
        resp.json::<ResponseEnvelope>()
            .await
            .context("Proxy returned an unexpected payload")
    }
}
