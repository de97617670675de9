use serde_json::Value as JsonValue;

use crate::{transport::TransportResponse, DeereError, ErrorBody};

/// Turns a non-success response into the matching [`DeereError`] variant.
pub(crate) fn classify_response(response: &TransportResponse) -> DeereError {
    let body = parse_error_body(&response.body);
    let message = body
        .as_ref()
        .and_then(extract_error_message)
        .unwrap_or_else(|| response.status_text.clone());
    let status = response.status;
    let status_text = response.status_text.clone();

    match status {
        429 => DeereError::RateLimit {
            message,
            status,
            status_text,
            retry_after: retry_after_secs(response),
            body,
        },
        401 | 403 => DeereError::Auth {
            message,
            status,
            status_text,
            body,
        },
        _ => DeereError::Api {
            message,
            status,
            status_text,
            body,
        },
    }
}

/// Reads `Retry-After` as a whole number of seconds.
pub(crate) fn retry_after_secs(response: &TransportResponse) -> Option<u64> {
    response
        .header("retry-after")
        .and_then(|value| value.trim().parse::<u64>().ok())
}

fn parse_error_body(raw: &str) -> Option<ErrorBody> {
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(value) => Some(ErrorBody::Json(value)),
        Err(_) => Some(ErrorBody::Text(raw.to_owned())),
    }
}

// message > error > error_description > errors[0].message
fn extract_error_message(body: &ErrorBody) -> Option<String> {
    let ErrorBody::Json(JsonValue::Object(obj)) = body else {
        return None;
    };

    for key in ["message", "error", "error_description"] {
        if let Some(JsonValue::String(text)) = obj.get(key) {
            return Some(text.clone());
        }
    }

    obj.get("errors")
        .and_then(JsonValue::as_array)
        .and_then(|errors| errors.first())
        .and_then(|first| first.get("message"))
        .and_then(JsonValue::as_str)
        .map(str::to_owned)
}
