//! Network messages - communication between App and Network layers

use crate::models::{RequestDescriptor, ResponseEnvelope};

/// Commands sent from App layer to Network layer
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Execute an HTTP request
    ExecuteRequest { id: u64, request: RequestDescriptor },
    /// Shutdown the network actor once in-flight requests have reported
    Shutdown,
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    /// The executor produced an envelope. This includes upstream errors and
    /// transport failures (status 0).
    Completed {
        id: u64,
        envelope: ResponseEnvelope,
        /// Client-side round trip, including any proxy hop
        round_trip_ms: u64,
    },
    /// No envelope at all, e.g. the proxy endpoint was unreachable
    Failed { id: u64, message: String },
}

impl NetworkResponse {
    /// Get the request ID from the response
    pub fn id(&self) -> u64 {
        match self {
            NetworkResponse::Completed { id, .. } => *id,
            NetworkResponse::Failed { id, .. } => *id,
        }
    }
}
