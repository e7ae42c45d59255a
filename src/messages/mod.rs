//! Message types for inter-layer communication in the actor-based architecture.
//!
//! This module defines the messages that flow between the App and Network
//! layers, and the notices the App layer hands to whatever front end renders it.

pub mod network;
pub mod notice;

pub use network::{NetworkCommand, NetworkResponse};
pub use notice::Notice;
