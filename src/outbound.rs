//! Outbound request assembly - the one rule set shared by the forwarder and
//! the curl renderer.
//!
//! Rules, applied in order:
//! - enabled headers with a non-empty key, later duplicates overwrite earlier
//! - at most one auth header, basic > bearer > apikey
//! - `Content-Type: application/json` when a body-carrying method has a body
//!   and the user did not set a content type
//! - the body only travels with POST, PUT and PATCH

use base64::Engine;

use crate::models::{AuthType, HttpMethod, RequestDescriptor};

pub const AUTHORIZATION: &str = "Authorization";
pub const API_KEY_HEADER: &str = "X-API-Key";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// The auth rule that fired during assembly, if any
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppliedAuth {
    None,
    Basic { username: String, password: String },
    Bearer,
    ApiKey,
}

/// A fully resolved request, ready to dispatch or render
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Ordered by first insertion
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub auth: AppliedAuth,
    /// True when the default content type was injected
    pub default_content_type: bool,
}

impl OutboundRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Resolve a descriptor into the request that will actually be sent
pub fn assemble(request: &RequestDescriptor) -> OutboundRequest {
    let mut headers: Vec<(String, String)> = Vec::new();

    for header in &request.headers {
        if header.key.is_empty() || !header.enabled {
            continue;
        }
        match headers.iter_mut().find(|(k, _)| *k == header.key) {
            Some(slot) => slot.1 = header.value.clone(),
            None => headers.push((header.key.clone(), header.value.clone())),
        }
    }

    let auth = match &request.auth {
        AuthType::Basic { username, password } if !username.is_empty() && !password.is_empty() => {
            let credentials = format!("{}:{}", username, password);
            let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
            replace_header(&mut headers, AUTHORIZATION, format!("Basic {}", encoded));
            AppliedAuth::Basic {
                username: username.clone(),
                password: password.clone(),
            }
        }
        AuthType::Bearer { token } if !token.is_empty() => {
            replace_header(&mut headers, AUTHORIZATION, format!("Bearer {}", token));
            AppliedAuth::Bearer
        }
        AuthType::ApiKey { token } if !token.is_empty() => {
            replace_header(&mut headers, API_KEY_HEADER, token.clone());
            AppliedAuth::ApiKey
        }
        _ => AppliedAuth::None,
    };

    let carries_body = request.method.has_body() && !request.body.is_empty();

    let default_content_type =
        carries_body && !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(CONTENT_TYPE));
    if default_content_type {
        headers.push((CONTENT_TYPE.to_string(), DEFAULT_CONTENT_TYPE.to_string()));
    }

    OutboundRequest {
        method: request.method,
        url: request.url.clone(),
        headers,
        body: carries_body.then(|| request.body.clone()),
        auth,
        default_content_type,
    }
}

/// HTTP header names are case-insensitive, so an injected header drops any
/// user-supplied spelling of the same name.
fn replace_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value));
}
