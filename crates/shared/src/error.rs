use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Internal,
    Unknown,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            400 | 409 | 422 => ErrorCode::Validation,
            500..=599 => ErrorCode::Internal,
            _ => ErrorCode::Unknown,
        }
    }
}

/// JSON error body returned by the collaborator API on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// A server-reported failure: the HTTP status class plus the message meant for the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code:?} ({status}): {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub status: u16,
    pub message: String,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::from_status(status),
            status,
            message: message.into(),
        }
    }

    /// Builds the error from a raw response body, preferring the JSON `message` field and
    /// falling back to `fallback` (usually the status reason) when the body is not JSON.
    pub fn from_body(status: u16, body: &str, fallback: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) if !parsed.message.is_empty() => Self::new(status, parsed.message),
            _ => Self::new(status, fallback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_json_message_over_fallback() {
        let err = ApiError::from_body(500, r#"{"message":"name taken","error":{}}"#, "Internal");
        assert_eq!(err.message, "name taken");
        assert_eq!(err.code, ErrorCode::Internal);
    }

    #[test]
    fn falls_back_for_non_json_body() {
        let err = ApiError::from_body(502, "<html>bad gateway</html>", "Bad Gateway");
        assert_eq!(err.message, "Bad Gateway");
        assert_eq!(err.status, 502);
    }

    #[test]
    fn maps_status_codes() {
        assert_eq!(ErrorCode::from_status(401), ErrorCode::Unauthorized);
        assert_eq!(ErrorCode::from_status(400), ErrorCode::Validation);
        assert_eq!(ErrorCode::from_status(418), ErrorCode::Unknown);
    }
}
