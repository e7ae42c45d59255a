//! App state - pure data structure with no I/O logic

use crate::messages::Notice;
use crate::models::{RequestDescriptor, ResponseEnvelope};
use crate::storage::{FileStorage, Storage, StoragePort};

/// Main application state - pure data, no I/O
pub struct AppState<P: StoragePort = FileStorage> {
    /// The request being edited
    pub request: RequestDescriptor,

    /// Last response shown, if any
    pub response: Option<ResponseEnvelope>,
    pub is_loading: bool,
    pub next_request_id: u64,
    pub pending_request_id: Option<u64>,

    /// Persisted history and saved requests
    pub storage: Storage<P>,

    notices: Vec<Notice>,
}

impl<P: StoragePort> AppState<P> {
    pub fn new(port: P) -> Self {
        AppState {
            request: RequestDescriptor::default(),
            response: None,
            is_loading: false,
            next_request_id: 1,
            pending_request_id: None,
            storage: Storage::new(port),
            notices: Vec::new(),
        }
    }

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    pub fn notify(&mut self, notice: Notice) {
        match &notice {
            Notice::Success(m) => tracing::debug!(text = %m, "notice"),
            Notice::Error(m) => tracing::warn!(text = %m, "notice"),
        }
        self.notices.push(notice);
    }

    /// Take pending notices, oldest first
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
