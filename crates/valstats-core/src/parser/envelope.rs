//! HenrikDev response envelopes
//!
//! Successful responses look like `{"status": 200, "data": {...}}`. Failures
//! carry `{"status": 404, "errors": [{"message": "..."}]}` and may arrive with
//! an HTTP error status or, occasionally, HTTP 200.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Result, StatsError};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: u16,
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

fn join_messages(errors: &[ErrorDetail]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .filter(|m| !m.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Decode a HenrikDev body into its `data` payload.
///
/// # Arguments
/// * `http_status` - HTTP status code of the response
/// * `body` - Raw response body
///
/// # Returns
/// * `Ok(T)` when the envelope status is 200 and `data` decodes
/// * `Err(StatsError::UpstreamStatus)` for any other status
/// * `Err(StatsError::Parse)` when the body is not a recognizable envelope
pub fn decode_envelope<T: DeserializeOwned>(http_status: u16, body: &str) -> Result<T> {
    if !(200..300).contains(&http_status) {
        return Err(status_error(http_status, body));
    }

    let envelope: Envelope<T> = serde_json::from_str(body)
        .map_err(|e| StatsError::Parse(format!("invalid response envelope: {}", e)))?;

    if envelope.status != 200 {
        return Err(StatsError::UpstreamStatus {
            status: envelope.status,
            message: join_messages(&envelope.errors),
        });
    }

    envelope
        .data
        .ok_or_else(|| StatsError::Parse("response envelope has no data".to_string()))
}

/// Build a status error from an error body, keeping its messages as detail.
fn status_error(http_status: u16, body: &str) -> StatsError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let mut message = join_messages(&envelope.errors);
            if message.is_empty() {
                message = envelope.message.unwrap_or_default();
            }
            StatsError::UpstreamStatus {
                status: envelope.status.unwrap_or(http_status),
                message,
            }
        }
        Err(_) => StatsError::UpstreamStatus {
            status: http_status,
            message: format!("API request failed with status code {}", http_status),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        value: u32,
    }

    #[test]
    fn test_decode_success() {
        let payload: Payload = decode_envelope(200, r#"{"status": 200, "data": {"value": 7}}"#).unwrap();
        assert_eq!(payload, Payload { value: 7 });
    }

    #[test]
    fn test_envelope_status_overrides_http_success() {
        let body = r#"{"status": 404, "errors": [{"message": "Account not found", "code": 22}]}"#;
        let err = decode_envelope::<Payload>(200, body).unwrap_err();
        assert!(err.is_not_found());
        match err {
            StatsError::UpstreamStatus { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Account not found");
            }
            other => panic!("Expected UpstreamStatus, got {other:?}"),
        }
    }

    #[test]
    fn test_http_error_with_error_body() {
        let body = r#"{"status": 429, "errors": [{"message": "Rate limit reached"}]}"#;
        let err = decode_envelope::<Payload>(429, body).unwrap_err();
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("Rate limit reached"));
    }

    #[test]
    fn test_http_error_with_unparseable_body() {
        let err = decode_envelope::<Payload>(502, "<html>Bad Gateway</html>").unwrap_err();
        match err {
            StatsError::UpstreamStatus { status, message } => {
                assert_eq!(status, 502);
                assert!(message.contains("502"));
            }
            other => panic!("Expected UpstreamStatus, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_data_is_parse_error() {
        let err = decode_envelope::<Payload>(200, r#"{"status": 200}"#).unwrap_err();
        assert!(matches!(err, StatsError::Parse(_)));
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        let err = decode_envelope::<Payload>(200, "not json").unwrap_err();
        assert!(matches!(err, StatsError::Parse(_)));
    }
}
