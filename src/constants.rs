//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Application name
pub const APP_NAME: &str = "icurl";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address of the proxy endpoint
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Route the proxy endpoint is mounted on
pub const PROXY_ROUTE: &str = "/api/proxy";

/// Directory under the home directory holding persisted data
pub const DATA_DIR_NAME: &str = ".icurl";

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "icurl.log";

/// Storage key of the request history collection
pub const HISTORY_KEY: &str = "i-curl-history";

/// Storage key of the saved requests collection
pub const SAVED_KEY: &str = "i-curl-saved";

/// Maximum number of history entries kept
pub const MAX_HISTORY: usize = 50;

/// Status text of a transport-level failure envelope
pub const NETWORK_ERROR_TEXT: &str = "Network Error";

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization, X-API-Key";
