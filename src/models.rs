use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::NETWORK_ERROR_TEXT;

/// HTTP Method enum
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
        }
    }

    /// Only POST, PUT and PATCH ever carry a request body.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::POST | HttpMethod::PUT | HttpMethod::PATCH)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::GET),
            "POST" => Ok(HttpMethod::POST),
            "PUT" => Ok(HttpMethod::PUT),
            "DELETE" => Ok(HttpMethod::DELETE),
            "PATCH" => Ok(HttpMethod::PATCH),
            "HEAD" => Ok(HttpMethod::HEAD),
            "OPTIONS" => Ok(HttpMethod::OPTIONS),
            _ => Err(anyhow!("Unknown HTTP method: {}", s)),
        }
    }
}

/// Authentication descriptor, tagged by `type` on the wire.
///
/// Missing credential fields decode as empty strings, and fields that belong
/// to other variants are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthType {
    #[default]
    None,
    Basic {
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
    },
    Bearer {
        #[serde(default)]
        token: String,
    },
    #[serde(rename = "apikey")]
    ApiKey {
        #[serde(default)]
        token: String,
    },
}

fn enabled_by_default() -> bool {
    true
}

/// HTTP Header
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    pub value: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl Header {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Header {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    pub fn disabled(key: impl Into<String>, value: impl Into<String>) -> Self {
        Header {
            enabled: false,
            ..Header::new(key, value)
        }
    }
}

/// The declarative, not-yet-executed description of a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub auth: AuthType,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        RequestDescriptor {
            url: url.into(),
            method,
            headers: Vec::new(),
            body: String::new(),
            auth: AuthType::None,
        }
    }
}

impl Default for RequestDescriptor {
    /// A blank form: no URL and a single empty header row to fill in.
    fn default() -> Self {
        RequestDescriptor {
            headers: vec![Header::new("", "")],
            ..RequestDescriptor::new(HttpMethod::GET, "")
        }
    }
}

/// Response payload: parsed JSON when the upstream declared JSON and it
/// parsed, raw text otherwise.
///
/// Serialized untagged, so the wire carries the bare JSON value or string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    Text(String),
    Json(serde_json::Value),
}

impl ResponseData {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseData::Json(value) => Some(value),
            ResponseData::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseData::Text(text) => Some(text),
            ResponseData::Json(_) => None,
        }
    }

    /// Length of the JSON serialization of the payload.
    pub fn serialized_len(&self) -> usize {
        serde_json::to_string(self).map(|s| s.len()).unwrap_or(0)
    }
}

/// Normalized outcome of executing a descriptor, success or failure alike.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Upstream status code; 0 means no response was received.
    pub status: u16,
    #[serde(rename = "statusText")]
    pub status_text: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub data: ResponseData,
    /// Milliseconds between dispatch and full receipt of the body.
    pub duration: u64,
    /// Filled in by the consumer, never by the forwarder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

impl ResponseEnvelope {
    pub fn network_error(message: impl Into<String>) -> Self {
        ResponseEnvelope {
            status: 0,
            status_text: NETWORK_ERROR_TEXT.to_string(),
            headers: BTreeMap::new(),
            data: ResponseData::Json(serde_json::json!({ "error": message.into() })),
            duration: 0,
            size: None,
        }
    }

    pub fn is_network_error(&self) -> bool {
        self.status == 0
    }
}

/// History entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub request: RequestDescriptor,
    pub response: ResponseEnvelope,
    pub timestamp: DateTime<Utc>,
}

/// A named request kept until the user deletes it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedRequest {
    pub id: String,
    pub name: String,
    pub request: RequestDescriptor,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Fresh identifier for history and saved entries
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
