//! HTTP failure classification shared by the hosted adapters.
//!
//! The platform reports refusals as JSON bodies whose message field name
//! varies by service: the auth service uses `msg` or `error_description`,
//! the table API uses `message`. Whatever the field, the wording reaches the
//! user verbatim.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::domain::ports::{AuthGatewayError, ProfileRepositoryError};

const MESSAGE_FIELDS: [&str; 4] = ["msg", "message", "error_description", "error"];
const NO_ROWS_CODE: &str = "PGRST116";

/// Adapter-neutral failure, converted into each port's error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum HttpFailure {
    Rejected(String),
    Transport(String),
    Decode(String),
}

impl From<HttpFailure> for AuthGatewayError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Rejected(message) => Self::rejected(message),
            HttpFailure::Transport(message) => Self::transport(message),
            HttpFailure::Decode(message) => Self::decode(message),
        }
    }
}

impl From<HttpFailure> for ProfileRepositoryError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Rejected(message) => Self::rejected(message),
            HttpFailure::Transport(message) => Self::transport(message),
            HttpFailure::Decode(message) => Self::decode(message),
        }
    }
}

pub(super) fn map_transport_error(error: reqwest::Error) -> HttpFailure {
    if error.is_timeout() {
        HttpFailure::Transport(format!("request timed out: {error}"))
    } else {
        HttpFailure::Transport(error.to_string())
    }
}

/// Client errors are refusals carrying the platform's wording (possibly
/// blank); everything else is a transport failure with a body preview.
pub(super) fn map_status_error(status: StatusCode, body: &[u8]) -> HttpFailure {
    let preview = body_preview(body);
    if status.is_client_error() {
        debug!(status = status.as_u16(), body = %preview, "hosted platform refused request");
        return HttpFailure::Rejected(backend_message(body).unwrap_or_default());
    }
    if preview.is_empty() {
        HttpFailure::Transport(format!("status {}", status.as_u16()))
    } else {
        HttpFailure::Transport(format!("status {}: {preview}", status.as_u16()))
    }
}

/// First non-blank message field of a JSON error body.
pub(super) fn backend_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    MESSAGE_FIELDS.iter().find_map(|field| {
        value
            .get(*field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_owned)
    })
}

/// Whether a single-object table request matched no rows.
pub(super) fn is_no_rows(status: StatusCode, body: &[u8]) -> bool {
    if status != StatusCode::NOT_ACCEPTABLE {
        return false;
    }
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| value.get("code").and_then(Value::as_str).map(str::to_owned))
        .is_some_and(|code| code == NO_ROWS_CODE)
}

pub(super) fn decode<T: DeserializeOwned>(body: &[u8], what: &str) -> Result<T, HttpFailure> {
    serde_json::from_slice(body)
        .map_err(|error| HttpFailure::Decode(format!("invalid {what} payload: {error}")))
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
