use serde::Deserialize;
use serde_json::Value;

/// Maximum number of characters kept from a raw error body
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Response envelope used by every upstream endpoint.
///
/// Successful calls carry `data`; failures carry `message`, which is either a
/// string or a list of validation messages.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<Value>,
}

impl<T> ApiResponse<T> {
    pub fn message_text(&self) -> Option<String> {
        self.message.as_ref().map(message_to_text)
    }
}

fn message_to_text(message: &Value) -> String {
    match message {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(message_to_text)
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

/// Best-effort human readable error out of a non-success response body
pub fn error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiResponse<Value>>(body) {
        if let Some(message) = envelope.message_text() {
            return message;
        }
    }

    if body.trim().is_empty() {
        return "empty response body".to_string();
    }

    truncate(body, MAX_ERROR_BODY_CHARS)
}

/// Truncate to at most `max` bytes on a char boundary
fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
