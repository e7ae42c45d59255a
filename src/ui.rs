//! Plain-text rendering of responses, history and saved requests

use chrono::{DateTime, Duration, Local, Utc};

use crate::models::{HistoryEntry, ResponseData, ResponseEnvelope, SavedRequest};

/// How a response body is shown
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Formatted,
    Raw,
}

/// Status code category
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Redirect,
    ClientError,
    ServerError,
    /// Informational codes and transport failures (status 0)
    Other,
}

impl StatusClass {
    pub fn of(code: u16) -> Self {
        match code {
            200..=299 => StatusClass::Success,
            300..=399 => StatusClass::Redirect,
            400..=499 => StatusClass::ClientError,
            500.. => StatusClass::ServerError,
            _ => StatusClass::Other,
        }
    }
}

/// Human readable size, base 1024
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Body text: pretty-printed JSON or the raw serialization
pub fn format_data(data: &ResponseData, mode: ViewMode) -> String {
    match (data, mode) {
        (ResponseData::Text(text), ViewMode::Formatted) => text.clone(),
        (ResponseData::Json(value), ViewMode::Formatted) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        (data, ViewMode::Raw) => serde_json::to_string(data).unwrap_or_default(),
    }
}

/// "Today", "Yesterday" or a short date, in local time
pub fn day_label(timestamp: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let day = timestamp.with_timezone(&Local).date_naive();
    let today = now.with_timezone(&Local).date_naive();

    if day == today {
        "Today".to_string()
    } else if Some(day) == today.checked_sub_signed(Duration::days(1)) {
        "Yesterday".to_string()
    } else {
        day.format("%b %-d").to_string()
    }
}

/// Status line, headers and body of a response
pub fn render_response(response: &ResponseEnvelope, mode: ViewMode) -> String {
    let mut out = String::new();

    let size = response.size.unwrap_or_else(|| response.data.serialized_len());
    out.push_str(&format!(
        "{} {} • {}ms • {}\n",
        response.status,
        response.status_text,
        response.duration,
        format_bytes(size)
    ));

    if !response.headers.is_empty() {
        out.push_str(&format!("\nHeaders ({})\n", response.headers.len()));
        for (key, value) in &response.headers {
            out.push_str(&format!("  {}: {}\n", key, value));
        }
    }

    out.push('\n');
    out.push_str(&format_data(&response.data, mode));
    out
}

/// History grouped under day labels, newest first
pub fn render_history<'a>(
    entries: impl IntoIterator<Item = &'a HistoryEntry>,
    now: &DateTime<Utc>,
) -> String {
    let mut out = String::new();
    let mut current_label: Option<String> = None;

    for entry in entries {
        let label = day_label(&entry.timestamp, now);
        if current_label.as_deref() != Some(label.as_str()) {
            out.push_str(&format!("{}\n", label));
            current_label = Some(label);
        }
        out.push_str(&format!(
            "  {:<7} {:>3} {} {}  [{}]\n",
            entry.request.method.as_str(),
            entry.response.status,
            entry.timestamp.with_timezone(&Local).format("%H:%M"),
            entry.request.url,
            entry.id
        ));
    }

    if out.is_empty() {
        out.push_str("No request history yet\n");
    }
    out
}

pub fn render_saved(saved: &[SavedRequest]) -> String {
    if saved.is_empty() {
        return "No saved requests yet\n".to_string();
    }
    saved
        .iter()
        .map(|s| {
            format!(
                "{}\n  {:<7} {}  [{}]\n",
                s.name,
                s.request.method.as_str(),
                s.request.url,
                s.id
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(500), "500 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5 MB");
    }

    #[test]
    fn test_status_class() {
        assert_eq!(StatusClass::of(204), StatusClass::Success);
        assert_eq!(StatusClass::of(301), StatusClass::Redirect);
        assert_eq!(StatusClass::of(404), StatusClass::ClientError);
        assert_eq!(StatusClass::of(503), StatusClass::ServerError);
        assert_eq!(StatusClass::of(0), StatusClass::Other);
    }

    #[test]
    fn test_format_data_modes() {
        let json = ResponseData::Json(serde_json::json!({"a": 1}));
        assert_eq!(format_data(&json, ViewMode::Formatted), "{\n  \"a\": 1\n}");
        assert_eq!(format_data(&json, ViewMode::Raw), "{\"a\":1}");

        let text = ResponseData::Text("hello".into());
        assert_eq!(format_data(&text, ViewMode::Formatted), "hello");
        assert_eq!(format_data(&text, ViewMode::Raw), "\"hello\"");
    }

    #[test]
    fn test_day_label() {
        let now = Local.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap().with_timezone(&Utc);
        assert_eq!(day_label(&now, &now), "Today");
        assert_eq!(day_label(&(now - Duration::days(1)), &now), "Yesterday");
        assert_eq!(day_label(&(now - Duration::days(9)), &now), "Mar 1");
    }
}
