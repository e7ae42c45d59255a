//! App actor - drives the app state against a running network actor

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::app::AppState;
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::network::{Executor, NetworkActor};
use crate::storage::StoragePort;

/// Owns the app state and the channels to the network layer
pub struct AppActor<P: StoragePort> {
    pub state: AppState<P>,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    network_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    network_task: JoinHandle<()>,
}

impl<P: StoragePort> AppActor<P> {
    /// Spawn a network actor for `executor` and wire it to fresh state
    pub fn spawn(executor: Executor, port: P) -> Self {
        let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
        let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();

        let network_actor = NetworkActor::new(executor, net_resp_tx);
        let network_task = tokio::spawn(network_actor.run(net_cmd_rx));

        AppActor {
            state: AppState::new(port),
            network_tx: net_cmd_tx,
            network_rx: net_resp_rx,
            network_task,
        }
    }

    /// Send the current request and wait for its outcome.
    ///
    /// Returns false when validation rejected the request before any network
    /// call; the reason is left in the state's notices.
    pub async fn send(&mut self) -> Result<bool> {
        let Some(cmd) = self.state.prepare_request() else {
            return Ok(false);
        };
        self.network_tx
            .send(cmd)
            .map_err(|_| anyhow!("Network actor is not running"))?;

        while self.state.is_loading {
            let response = self
                .network_rx
                .recv()
                .await
                .ok_or_else(|| anyhow!("Network actor stopped before responding"))?;
            self.state.handle_response(response);
        }
        Ok(true)
    }

    /// Stop the network actor, waiting for anything still in flight
    pub async fn shutdown(self) -> Result<AppState<P>> {
        let _ = self.network_tx.send(NetworkCommand::Shutdown);
        self.network_task.await?;
        Ok(self.state)
    }
}
