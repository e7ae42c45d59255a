//! Network actor - runs HTTP requests in the Tokio runtime

use std::time::Instant;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::messages::{NetworkCommand, NetworkResponse};
use crate::models::{RequestDescriptor, ResponseEnvelope};
use crate::network::client::Forwarder;
use crate::network::proxy_client::ProxyClient;

/// Where requests are executed
#[derive(Clone, Debug)]
pub enum Executor {
    /// In-process forwarder
    Direct(Forwarder),
    /// A running proxy endpoint
    Proxy(ProxyClient),
}

impl Executor {
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<ResponseEnvelope> {
        match self {
            Executor::Direct(forwarder) => Ok(forwarder.forward(request).await),
            Executor::Proxy(client) => client.send(request).await,
        }
    }
}

/// Network actor that processes request commands
pub struct NetworkActor {
    executor: Executor,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<()>,
}

impl NetworkActor {
    pub fn new(executor: Executor, response_tx: mpsc::UnboundedSender<NetworkResponse>) -> Self {
        NetworkActor {
            executor,
            response_tx,
            active_requests: JoinSet::new(),
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::ExecuteRequest { id, request }) => {
                            let response_tx = self.response_tx.clone();
                            let executor = self.executor.clone();

                            self.active_requests.spawn(async move {
                                tracing::info!(id, url = %request.url, method = %request.method, "Executing request");
                                let start = Instant::now();
                                let response = match executor.execute(&request).await {
                                    Ok(envelope) => NetworkResponse::Completed {
                                        id,
                                        envelope,
                                        round_trip_ms: start.elapsed().as_millis() as u64,
                                    },
                                    Err(e) => NetworkResponse::Failed {
                                        id,
                                        message: format!("{:#}", e),
                                    },
                                };
                                tracing::debug!(id, ?response, "Request finished");
                                let _ = response_tx.send(response);
                            });
                        }

                        Some(NetworkCommand::Shutdown) | None => break,
                    }
                }

                // Clean up completed tasks
                Some(_result) = self.active_requests.join_next() => {}
            }
        }

        // Requests are never cancelled; let in-flight ones report back
        while self.active_requests.join_next().await.is_some() {}
    }
}
