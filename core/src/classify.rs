//! Maps HTTP responses onto the `KaizenError` taxonomy.
//!
//! Order of the checks matters: 401/403, then 429, then field-level
//! validation (400/422 carrying a `field`), then every other non-2xx.
//! This module only classifies. It never retries.

use serde_json::{Map, Value};

use crate::error::{KaizenError, Result};
use crate::http::HttpResponse;

/// Wait suggested to callers when a 429 carries no hint of its own.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

const REQUEST_ID_HEADER: &str = "x-request-id";
const FALLBACK_MESSAGE: &str = "Request failed";

/// Classify `response`, returning its JSON object body on success.
///
/// An empty success body yields an empty object; a non-object JSON body is
/// treated the same way, matching what the endpoints document.
pub fn classify(response: &HttpResponse) -> Result<Map<String, Value>> {
    let body = parse_body(&response.body);
    if response.is_success() {
        return match body {
            ParsedBody::Object(map) => Ok(map),
            ParsedBody::Empty | ParsedBody::OtherJson => Ok(Map::new()),
            ParsedBody::Text(text) => Err(KaizenError::Deserialization(format!(
                "expected a JSON object, got: {}",
                truncate(&text)
            ))),
        };
    }

    let request_id = response.header(REQUEST_ID_HEADER).map(str::to_string);
    let fields = match &body {
        ParsedBody::Object(map) => Some(map),
        _ => None,
    };
    let message = error_message(&body);

    match response.status {
        401 | 403 => Err(KaizenError::Auth {
            status: response.status,
            message,
            request_id,
        }),
        429 => {
            let retry_after = response
                .header("retry-after")
                .and_then(|value| value.trim().parse::<u64>().ok())
                .or_else(|| fields.and_then(body_retry_after))
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            tracing::warn!(retry_after, request_id = request_id.as_deref(), "rate limited");
            Err(KaizenError::RateLimit {
                message,
                retry_after,
                request_id,
            })
        }
        400 | 422 if field_of(fields).is_some() => {
            let field = field_of(fields).map(str::to_string);
            Err(KaizenError::Validation {
                field,
                message,
                status: Some(response.status),
                request_id,
            })
        }
        status => Err(KaizenError::Api {
            status,
            message,
            request_id,
        }),
    }
}

enum ParsedBody {
    Empty,
    Object(Map<String, Value>),
    OtherJson,
    Text(String),
}

fn parse_body(raw: &str) -> ParsedBody {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ParsedBody::Empty;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => ParsedBody::Object(map),
        Ok(_) => ParsedBody::OtherJson,
        Err(_) => ParsedBody::Text(trimmed.to_string()),
    }
}

fn error_message(body: &ParsedBody) -> String {
    match body {
        ParsedBody::Object(map) => ["error", "message"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|value| match value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Null | Value::String(_) => None,
                other => Some(other.to_string()),
            })
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        ParsedBody::Text(text) => text.clone(),
        ParsedBody::Empty | ParsedBody::OtherJson => FALLBACK_MESSAGE.to_string(),
    }
}

/// The offending field named by a validation error body. Only a non-blank
/// string counts; `null` or any other type means no field was reported.
fn field_of(fields: Option<&Map<String, Value>>) -> Option<&str> {
    fields
        .and_then(|map| map.get("field"))
        .and_then(Value::as_str)
        .filter(|field| !field.trim().is_empty())
}

fn body_retry_after(map: &Map<String, Value>) -> Option<u64> {
    let value = map.get("retry_after").or_else(|| map.get("retryAfter"))?;
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.ceil() as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn truncate(text: &str) -> String {
    const LIMIT: usize = 200;
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
