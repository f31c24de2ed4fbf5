//! Failure taxonomy for request outcomes.

use serde::Serialize;
use serde_json::{Value, json};

use crate::http::TransportError;

/// Message resolved for a 204 response.
pub const SUCCESS_MESSAGE: &str = "success";

/// Message rejected for a 401 response.
pub const SESSION_EXPIRED_MESSAGE: &str = "session expired, please log in again";

/// Message rejected when the transport cannot reach the server.
pub const NETWORK_UNREACHABLE_MESSAGE: &str = "network unreachable";

/// Message rejected when the request timer fires first.
pub const TIMEOUT_MESSAGE: &str = "request timed out";

/// Message rejected when a body fails validation without further detail.
pub const BAD_DATA_FORMAT_MESSAGE: &str = "bad data format";

pub type Result<T, E = RequestError> = std::result::Result<T, E>;

/// A single schema violation found in a response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// JSON pointer to the offending value ("" for the document root).
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Every way a request can fail. Nothing here is retried.
#[derive(Debug)]
pub enum RequestError {
    /// HTTP 400, carrying the body the server sent back
    BadRequest(Value),
    /// HTTP 401
    SessionExpired,
    /// Response body did not match the schema. An empty list means the
    /// body could not be checked at all.
    Validation(Vec<ValidationIssue>),
    /// The transport could not connect
    NetworkUnreachable,
    /// The timer won the race against the transport
    Timeout,
    /// The caller cancelled the request
    Cancelled,
    /// The request body could not be serialized
    Encode(String),
    /// The response body was not JSON
    Decode(String),
    /// Any other transport failure, passed through unchanged
    Transport(TransportError),
}

impl RequestError {
    /// Renders the failure value handed back to callers: the server body for
    /// a bad request, the issue list for detailed validation failures and
    /// `{"message": ...}` for everything else.
    pub fn payload(&self) -> Value {
        match self {
            RequestError::BadRequest(body) => body.clone(),
            RequestError::Validation(issues) if !issues.is_empty() => {
                serde_json::to_value(issues).unwrap_or_else(|_| json!([]))
            }
            other => json!({ "message": other.to_string() }),
        }
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::BadRequest(body) => match body.get("message").and_then(Value::as_str) {
                Some(message) => write!(f, "bad request: {}", message),
                None => write!(f, "bad request: {}", body),
            },
            RequestError::SessionExpired => write!(f, "{}", SESSION_EXPIRED_MESSAGE),
            RequestError::Validation(issues) if issues.is_empty() => {
                write!(f, "{}", BAD_DATA_FORMAT_MESSAGE)
            }
            RequestError::Validation(issues) => {
                let joined = issues
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "{}: {}", BAD_DATA_FORMAT_MESSAGE, joined)
            }
            RequestError::NetworkUnreachable => write!(f, "{}", NETWORK_UNREACHABLE_MESSAGE),
            RequestError::Timeout => write!(f, "{}", TIMEOUT_MESSAGE),
            RequestError::Cancelled => write!(f, "request cancelled"),
            RequestError::Encode(msg) => write!(f, "failed to encode request body: {}", msg),
            RequestError::Decode(msg) => write!(f, "failed to decode response body: {}", msg),
            RequestError::Transport(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for RequestError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connect(_) => RequestError::NetworkUnreachable,
            TransportError::Timeout => RequestError::Timeout,
            TransportError::Cancelled => RequestError::Cancelled,
            other => RequestError::Transport(other),
        }
    }
}
