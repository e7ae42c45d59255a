use anyhow::{anyhow, Result};
use base64::Engine;

use crate::models::{AuthType, Header, HttpMethod, RequestDescriptor};
use crate::outbound::{assemble, AppliedAuth, API_KEY_HEADER, AUTHORIZATION};

const LINE_JOIN: &str = " \\\n  ";

/// Format request as cURL command
///
/// Uses the same header, auth and body rules as the forwarder, so the command
/// sends exactly what the proxy would.
pub fn to_curl(request: &RequestDescriptor) -> String {
    let outbound = assemble(request);
    let mut parts = vec!["curl".to_string()];

    // Method
    if outbound.method != HttpMethod::GET {
        parts.push(format!("-X {}", outbound.method.as_str()));
    }

    // Headers, with basic auth rendered as -u in its place
    for (key, value) in &outbound.headers {
        match &outbound.auth {
            AppliedAuth::Basic { username, password } if key == AUTHORIZATION => {
                parts.push(format!("-u \"{}:{}\"", username, password));
            }
            _ => parts.push(format!("-H \"{}: {}\"", key, value)),
        }
    }

    // Body
    if let Some(body) = &outbound.body {
        let payload = match serde_json::from_str::<serde_json::Value>(body) {
            Ok(json) => json.to_string(),
            Err(_) => body.clone(),
        };
        parts.push(format!("-d '{}'", shell_single_quote_escape(&payload)));
    }

    // URL (always last)
    parts.push(format!("\"{}\"", outbound.url));

    parts.join(LINE_JOIN)
}

fn shell_single_quote_escape(s: &str) -> String {
    s.replace('\'', "'\"'\"'")
}

/// Parse a cURL command into a RequestDescriptor
pub fn parse_curl(input: &str) -> Result<RequestDescriptor> {
    let mut request = RequestDescriptor::new(HttpMethod::GET, "");
    let mut explicit_method = false;

    // Remove line continuations and normalize
    let normalized = input.replace("\\\r\n", " ").replace("\\\n", " ");

    let mut tokens = tokenize(&normalized)?;

    // Skip 'curl' command if present
    if tokens.first().map(|s| s.as_str()) == Some("curl") {
        tokens.remove(0);
    }

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        let next = tokens.get(i + 1);

        match (token.as_str(), next) {
            ("-X" | "--request", Some(method)) => {
                request.method = method.parse()?;
                explicit_method = true;
                i += 1;
            }
            ("-H" | "--header", Some(raw)) => {
                apply_header(&mut request, parse_header(raw)?);
                i += 1;
            }
            ("-d" | "--data" | "--data-raw" | "--data-binary", Some(data)) => {
                request.body = data.clone();
                // Infer POST if not set
                if !explicit_method && request.method == HttpMethod::GET {
                    request.method = HttpMethod::POST;
                }
                i += 1;
            }
            ("-u" | "--user", Some(credentials)) => {
                let (username, password) = split_credentials(credentials);
                request.auth = AuthType::Basic { username, password };
                i += 1;
            }
            ("--url", Some(url)) => {
                request.url = url.clone();
                i += 1;
            }
            ("-I" | "--head", _) => {
                request.method = HttpMethod::HEAD;
                explicit_method = true;
            }
            ("--compressed" | "-k" | "--insecure" | "-L" | "--location" | "-s" | "--silent"
            | "-v" | "--verbose", _) => {
                // Ignored flags
            }
            (other, _) => {
                if request.url.is_empty()
                    && (other.starts_with("http://") || other.starts_with("https://"))
                {
                    request.url = other.to_string();
                }
            }
        }
        i += 1;
    }

    if request.url.is_empty() {
        return Err(anyhow!("No URL found in curl command"));
    }

    Ok(request)
}

/// Auth-shaped headers become auth settings, everything else stays a header
fn apply_header(request: &mut RequestDescriptor, header: Header) {
    if header.key.eq_ignore_ascii_case(AUTHORIZATION) {
        if let Some(token) = strip_prefix_ignore_case(&header.value, "Bearer ") {
            request.auth = AuthType::Bearer { token: token.to_string() };
            return;
        }
        if let Some(encoded) = strip_prefix_ignore_case(&header.value, "Basic ") {
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok());
            if let Some(credentials) = decoded {
                let (username, password) = split_credentials(&credentials);
                request.auth = AuthType::Basic { username, password };
                return;
            }
        }
    } else if header.key.eq_ignore_ascii_case(API_KEY_HEADER) {
        request.auth = AuthType::ApiKey { token: header.value };
        return;
    }
    request.headers.push(header);
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

fn parse_header(s: &str) -> Result<Header> {
    match s.split_once(':') {
        Some((key, value)) => Ok(Header::new(key.trim(), value.trim())),
        None => Err(anyhow!("Invalid header format: {}", s)),
    }
}

fn split_credentials(s: &str) -> (String, String) {
    match s.split_once(':') {
        Some((user, pass)) => (user.to_string(), pass.to_string()),
        None => (s.to_string(), String::new()),
    }
}

/// Tokenize a curl command, respecting quotes
fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            current.push(c);
            escape_next = false;
            continue;
        }

        match c {
            '\\' if !in_single_quote => {
                escape_next = true;
                in_token = true;
            }
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
                in_token = true;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
                in_token = true;
            }
            ' ' | '\t' | '\n' | '\r' if !in_single_quote && !in_double_quote => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            _ => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_single_quote || in_double_quote {
        return Err(anyhow!("Unterminated quote in curl command"));
    }

    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}
