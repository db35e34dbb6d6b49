use thiserror::Error;

/// Error code for failures that never produced an HTTP status.
pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";

/// Builds the `HTTP_<status>` code used for non-2xx responses.
pub fn http_error_code(status: u16) -> String {
    format!("HTTP_{status}")
}

/// Failure of a single physical attempt, raised before a usable response existed.
///
/// Every variant is eligible for retry by [`crate::ApiClient`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("request cancelled")]
    Cancelled,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("failed to decode response body: {0}")]
    Decode(String),

    #[error("upstream rejected request with status {status}: {message}")]
    Status { status: u16, message: String },
}

impl TransportError {
    /// Status carried by the failure, if the transport saw one.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

/// Configuration errors raised while building a client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("base url '{value}' is not an absolute http(s) url")]
    InvalidBaseUrl { value: String },

    #[error("environment variable {name} is required")]
    MissingEnv { name: &'static str },

    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidEnv { name: &'static str, value: String },
}
