//! Error types for the library API client.
//!
//! # Design
//! Two families reach the user. `AuthenticationRequired` is raised locally
//! before any request leaves the client. `Api` and `Transport` come back from
//! the network: `Api` carries the server's `detail` message (or a generic
//! fallback) together with the status, so callers can single out 401s.

use serde::Deserialize;
use thiserror::Error;

/// Message used when an error response carries no usable `detail`.
pub const GENERIC_FAILURE: &str = "API request failed";

/// Errors returned by `ApiClient` and everything built on it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An authenticated call was attempted with no stored token.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The server answered with a non-2xx status.
    #[error("{detail}")]
    Api { status: u16, detail: String },

    /// No response was received.
    #[error("network error: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// Build an `Api` error from a failed response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        ApiError::Api {
            status,
            detail: extract_detail(body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the server rejected the bearer credential.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    detail: serde_json::Value,
}

/// Pull the `detail` field out of an error body.
///
/// A string detail is used as-is; structured details (validation error
/// lists) are rendered as compact JSON.
fn extract_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body).map(|envelope| envelope.detail) {
        Ok(serde_json::Value::String(detail)) if !detail.is_empty() => detail,
        Ok(serde_json::Value::String(_) | serde_json::Value::Null) | Err(_) => {
            GENERIC_FAILURE.to_string()
        }
        Ok(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail_is_the_message() {
        let err = ApiError::from_response(404, r#"{"detail":"not found"}"#);
        assert_eq!(err.to_string(), "not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn missing_detail_falls_back_to_generic_message() {
        let err = ApiError::from_response(500, r#"{"error":"boom"}"#);
        assert_eq!(err.to_string(), GENERIC_FAILURE);
    }

    #[test]
    fn non_json_body_falls_back_to_generic_message() {
        let err = ApiError::from_response(502, "<html>Bad Gateway</html>");
        assert_eq!(err.to_string(), GENERIC_FAILURE);
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let err = ApiError::from_response(422, r#"{"detail":[{"loc":["body","title"]}]}"#);
        assert_eq!(err.to_string(), r#"[{"loc":["body","title"]}]"#);
    }

    #[test]
    fn only_401_counts_as_unauthorized() {
        assert!(ApiError::from_response(401, "{}").is_unauthorized());
        assert!(!ApiError::from_response(403, "{}").is_unauthorized());
        assert!(!ApiError::AuthenticationRequired.is_unauthorized());
    }

    #[test]
    fn missing_credential_message() {
        assert_eq!(
            ApiError::AuthenticationRequired.to_string(),
            "Authentication required"
        );
    }
}
