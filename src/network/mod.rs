//! Network layer - request forwarding and execution
//!
//! The forwarder normalizes one descriptor into one envelope. The network
//! actor receives commands from the app layer and sends back responses,
//! executing either in-process or through a running proxy endpoint.

pub mod actor;
pub mod client;
pub mod proxy_client;

pub use actor::{Executor, NetworkActor};
pub use client::Forwarder;
pub use proxy_client::ProxyClient;
