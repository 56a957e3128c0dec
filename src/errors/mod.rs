//! Error handling module for the admin client.
//!
//! Every remote call, storage access and form submission reports failures through
//! [`ClientError`], which carries a stable code and a message suitable for a notice.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const SERVER_ERROR: &str = "SERVER_ERROR";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const DECODE_ERROR: &str = "DECODE_ERROR";
}

/// Fallback text when the backend does not say what went wrong.
pub const GENERIC_SERVER_MESSAGE: &str = "An error occurred";

/// Client error type.
///
/// `Clone` so a single in-flight request can hand the same outcome to every waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Form input rejected before submission
    Validation(String),
    /// Credential missing, expired or rejected (401)
    Unauthorized(String),
    /// Resource not found (404)
    NotFound(String),
    /// No response from the backend
    Network(String),
    /// Request exceeded the configured timeout
    Timeout(String),
    /// Non-2xx response with an optional server-provided message
    Server { status: u16, message: String },
    /// Local store failure
    Storage(String),
    /// Response or stored value could not be decoded
    Decode(String),
}

impl ClientError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Validation(_) => codes::VALIDATION_ERROR,
            ClientError::Unauthorized(_) => codes::UNAUTHORIZED,
            ClientError::NotFound(_) => codes::NOT_FOUND,
            ClientError::Network(_) => codes::NETWORK_ERROR,
            ClientError::Timeout(_) => codes::TIMEOUT,
            ClientError::Server { .. } => codes::SERVER_ERROR,
            ClientError::Storage(_) => codes::STORAGE_ERROR,
            ClientError::Decode(_) => codes::DECODE_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Unauthorized(msg) => msg.clone(),
            ClientError::NotFound(msg) => msg.clone(),
            ClientError::Network(msg) => msg.clone(),
            ClientError::Timeout(msg) => msg.clone(),
            ClientError::Server { message, .. } => message.clone(),
            ClientError::Storage(msg) => msg.clone(),
            ClientError::Decode(msg) => msg.clone(),
        }
    }

    /// Text shown to the operator in a notice.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Unauthorized(_) => "Session expired, please log in again".to_string(),
            ClientError::NotFound(_) => "Not found".to_string(),
            ClientError::Network(_) => "Network error".to_string(),
            ClientError::Timeout(_) => "Request timed out".to_string(),
            ClientError::Server { message, .. } if !message.trim().is_empty() => message.clone(),
            ClientError::Server { .. } => GENERIC_SERVER_MESSAGE.to_string(),
            ClientError::Storage(_) | ClientError::Decode(_) => GENERIC_SERVER_MESSAGE.to_string(),
        }
    }

    /// Whether this error must end the session.
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Timeout(_))
    }

    /// Map a non-success HTTP status and decoded body message to an error.
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        let message = message.filter(|m| !m.trim().is_empty());
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(
                message.unwrap_or_else(|| "Authentication required".to_string()),
            ),
            StatusCode::NOT_FOUND => {
                ClientError::NotFound(message.unwrap_or_else(|| "Resource not found".to_string()))
            }
            _ => ClientError::Server {
                status: status.as_u16(),
                message: message.unwrap_or_else(|| GENERIC_SERVER_MESSAGE.to_string()),
            },
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Server { status, message } => {
                write!(f, "{} ({}): {}", self.error_code(), status, message)
            }
            _ => write!(f, "{}: {}", self.error_code(), self.message()),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            tracing::warn!("Request timed out: {}", err);
            ClientError::Timeout(format!("Request timed out: {}", err))
        } else if err.is_decode() {
            tracing::error!("Response decode error: {:?}", err);
            ClientError::Decode(format!("Invalid response: {}", err))
        } else if let Some(status) = err.status() {
            ClientError::from_status(status, None)
        } else {
            tracing::warn!("Network error: {}", err);
            ClientError::Network(format!("Network error: {}", err))
        }
    }
}

impl From<sqlx::Error> for ClientError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Local store error: {:?}", err);
        ClientError::Storage(format!("Local store error: {}", err))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        ClientError::Decode(format!("JSON error: {}", err))
    }
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(ClientError::from_status(StatusCode::UNAUTHORIZED, None).is_auth());
        assert_eq!(
            ClientError::from_status(StatusCode::NOT_FOUND, None).error_code(),
            codes::NOT_FOUND
        );
        assert_eq!(
            ClientError::from_status(StatusCode::BAD_REQUEST, Some("Title taken".into())),
            ClientError::Server {
                status: 400,
                message: "Title taken".to_string()
            }
        );
    }

    #[test]
    fn test_server_message_fallback() {
        let err = ClientError::from_status(StatusCode::INTERNAL_SERVER_ERROR, Some("  ".into()));
        assert_eq!(err.user_message(), GENERIC_SERVER_MESSAGE);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ClientError::Network("down".into()).is_retryable());
        assert!(ClientError::Timeout("slow".into()).is_retryable());
        assert!(!ClientError::Validation("bad".into()).is_retryable());
    }
}
