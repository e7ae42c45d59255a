//! App layer - state machine processing user actions and network responses
//!
//! Separates pure state from the actor that talks to the network layer.

pub mod actor;
pub mod commands;
pub mod state;

pub use actor::AppActor;
pub use state::AppState;
