//! Command handlers - business logic for processing user actions

use chrono::Utc;

use crate::app::AppState;
use crate::curl;
use crate::messages::{NetworkCommand, NetworkResponse, Notice};
use crate::models::{new_id, HistoryEntry, RequestDescriptor, SavedRequest};
use crate::storage::StoragePort;

impl<P: StoragePort> AppState<P> {
    // ========================
    // Request sending
    // ========================

    /// Validate the form and hand back the command to execute it
    pub fn prepare_request(&mut self) -> Option<NetworkCommand> {
        if self.is_loading {
            return None;
        }

        if self.request.url.trim().is_empty() {
            self.notify(Notice::error("Please enter a URL"));
            return None;
        }

        self.is_loading = true;

        let id = self.next_id();
        self.pending_request_id = Some(id);

        Some(NetworkCommand::ExecuteRequest {
            id,
            request: self.request.clone(),
        })
    }

    // ========================
    // Response handling
    // ========================

    pub fn handle_response(&mut self, response: NetworkResponse) {
        // Only process if it matches the pending request
        if self.pending_request_id != Some(response.id()) {
            tracing::debug!(id = response.id(), "Ignoring stale response");
            return;
        }
        self.is_loading = false;
        self.pending_request_id = None;

        match response {
            NetworkResponse::Completed {
                mut envelope,
                round_trip_ms,
                ..
            } => {
                envelope.duration = round_trip_ms;
                envelope.size = Some(envelope.data.serialized_len());
                self.response = Some(envelope.clone());

                let entry = HistoryEntry {
                    id: new_id(),
                    request: self.request.clone(),
                    response: envelope,
                    timestamp: Utc::now(),
                };
                if let Err(e) = self.storage.add_to_history(entry) {
                    self.notify(Notice::error(format!("Could not save history: {}", e)));
                }

                self.notify(Notice::success(format!(
                    "Request completed in {}ms",
                    round_trip_ms
                )));
            }
            NetworkResponse::Failed { message, .. } => {
                self.notify(Notice::error(format!("Request failed: {}", message)));
            }
        }
    }

    pub fn clear_response(&mut self) {
        self.response = None;
    }

    // ========================
    // Saved requests
    // ========================

    /// Save the current request under `name`; returns the new entry's id
    pub fn save_request(&mut self, name: &str) -> Option<String> {
        if self.request.url.trim().is_empty() {
            self.notify(Notice::error("Please enter a URL before saving"));
            return None;
        }
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let saved = SavedRequest {
            id: new_id(),
            name: name.to_string(),
            request: self.request.clone(),
            created_at: Utc::now(),
        };
        let id = saved.id.clone();

        match self.storage.save_request(saved) {
            Ok(()) => {
                self.notify(Notice::success("Request saved!"));
                Some(id)
            }
            Err(e) => {
                self.notify(Notice::error(format!("Could not save request: {}", e)));
                None
            }
        }
    }

    pub fn load_saved(&mut self, id: &str) -> bool {
        let Some(saved) = self.storage.find_saved(id) else {
            return false;
        };
        self.request = saved.request.clone();
        self.notify(Notice::success("Request loaded!"));
        true
    }

    pub fn delete_saved(&mut self, id: &str) -> bool {
        match self.storage.delete_saved(id) {
            Ok(removed) => removed,
            Err(e) => {
                self.notify(Notice::error(format!("Could not delete request: {}", e)));
                false
            }
        }
    }

    // ========================
    // History
    // ========================

    /// Restore both the request and the response of a history entry
    pub fn load_history(&mut self, id: &str) -> bool {
        let Some(entry) = self.storage.find_history(id) else {
            return false;
        };
        self.request = entry.request.clone();
        self.response = Some(entry.response.clone());
        self.notify(Notice::success("Request loaded from history!"));
        true
    }

    pub fn clear_history(&mut self) {
        match self.storage.clear_history() {
            Ok(()) => self.notify(Notice::success("History cleared!")),
            Err(e) => self.notify(Notice::error(format!("Could not clear history: {}", e))),
        }
    }

    // ========================
    // cURL
    // ========================

    pub fn export_curl(&self) -> String {
        curl::to_curl(&self.request)
    }

    pub fn import_curl(&mut self, input: &str) -> bool {
        match curl::parse_curl(input) {
            Ok(request) => {
                self.request = request;
                self.notify(Notice::success("Request imported from curl!"));
                true
            }
            Err(e) => {
                self.notify(Notice::error(format!("Could not import curl: {}", e)));
                false
            }
        }
    }

    /// Replace the form wholesale
    pub fn set_request(&mut self, request: RequestDescriptor) {
        self.request = request;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HttpMethod, ResponseData, ResponseEnvelope};
    use crate::storage::MemoryStorage;
    use std::collections::BTreeMap;

    fn state_with_url(url: &str) -> AppState<MemoryStorage> {
        let mut state = AppState::new(MemoryStorage::new());
        state.request = RequestDescriptor::new(HttpMethod::GET, url);
        state
    }

    fn ok_envelope() -> ResponseEnvelope {
        ResponseEnvelope {
            status: 200,
            status_text: "OK".into(),
            headers: BTreeMap::new(),
            data: ResponseData::Json(serde_json::json!({"a": 1})),
            duration: 3,
            size: None,
        }
    }

    fn request_id(cmd: Option<NetworkCommand>) -> u64 {
        match cmd {
            Some(NetworkCommand::ExecuteRequest { id, .. }) => id,
            other => panic!("expected a request, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_url_rejected_before_network() {
        let mut state = AppState::new(MemoryStorage::new());
        assert!(state.prepare_request().is_none());
        assert!(!state.is_loading);
        assert_eq!(state.drain_notices(), vec![Notice::error("Please enter a URL")]);
    }

    #[test]
    fn test_single_request_in_flight() {
        let mut state = state_with_url("http://localhost/");
        let id = request_id(state.prepare_request());
        assert!(state.is_loading);
        assert!(state.prepare_request().is_none());
        assert_eq!(state.pending_request_id, Some(id));
    }

    #[test]
    fn test_completed_response_recorded() {
        let mut state = state_with_url("http://localhost/");
        let id = request_id(state.prepare_request());

        state.handle_response(NetworkResponse::Completed {
            id,
            envelope: ok_envelope(),
            round_trip_ms: 42,
        });

        let response = state.response.as_ref().unwrap();
        assert_eq!(response.duration, 42);
        assert_eq!(response.size, Some(7));
        assert!(!state.is_loading);
        assert_eq!(state.storage.history_len(), 1);
        assert_eq!(state.storage.get_history(0).unwrap().request.url, "http://localhost/");
        assert_eq!(
            state.drain_notices(),
            vec![Notice::success("Request completed in 42ms")]
        );
    }

    #[test]
    fn test_failure_leaves_state_untouched() {
        let mut state = state_with_url("http://localhost/");
        let id = request_id(state.prepare_request());

        state.handle_response(NetworkResponse::Failed {
            id,
            message: "proxy down".into(),
        });

        assert!(state.response.is_none());
        assert_eq!(state.storage.history_len(), 0);
        assert_eq!(state.request.url, "http://localhost/");
        assert_eq!(
            state.drain_notices(),
            vec![Notice::error("Request failed: proxy down")]
        );
    }

    #[test]
    fn test_stale_response_ignored() {
        let mut state = state_with_url("http://localhost/");
        let id = request_id(state.prepare_request());

        state.handle_response(NetworkResponse::Completed {
            id: id + 100,
            envelope: ok_envelope(),
            round_trip_ms: 1,
        });
        assert!(state.is_loading);
        assert!(state.response.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let mut state = AppState::new(MemoryStorage::new());
        assert!(state.save_request("nameless").is_none());
        assert_eq!(
            state.drain_notices(),
            vec![Notice::error("Please enter a URL before saving")]
        );

        state.request = RequestDescriptor::new(HttpMethod::PUT, "http://localhost/items/1");
        assert!(state.save_request("   ").is_none());
        let id = state.save_request("update item").unwrap();

        state.request = RequestDescriptor::default();
        assert!(state.load_saved(&id));
        assert_eq!(state.request.method, HttpMethod::PUT);
        assert_eq!(state.storage.saved()[0].name, "update item");

        assert!(state.delete_saved(&id));
        assert!(!state.load_saved(&id));
    }

    #[test]
    fn test_load_history_restores_response() {
        let mut state = state_with_url("http://localhost/a");
        let id = request_id(state.prepare_request());
        state.handle_response(NetworkResponse::Completed {
            id,
            envelope: ok_envelope(),
            round_trip_ms: 5,
        });
        let entry_id = state.storage.get_history(0).unwrap().id.clone();

        state.request = RequestDescriptor::default();
        state.clear_response();
        assert!(state.load_history(&entry_id));
        assert_eq!(state.request.url, "http://localhost/a");
        assert_eq!(state.response.as_ref().map(|r| r.status), Some(200));

        state.clear_history();
        assert_eq!(state.storage.history_len(), 0);
    }

    #[test]
    fn test_curl_import_export() {
        let mut state = AppState::new(MemoryStorage::new());
        assert!(!state.import_curl("curl -X NOPE http://localhost"));
        assert!(state.import_curl("curl -X DELETE http://localhost/items/2"));
        assert_eq!(state.request.method, HttpMethod::DELETE);
        assert!(state.export_curl().starts_with("curl \\\n  -X DELETE"));
    }
}
