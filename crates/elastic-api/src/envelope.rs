//! Uniform success-or-failure wrapper returned by every client call.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::UNKNOWN_ERROR;

/// Result alias used by repositories that hand callers a tagged outcome.
pub type ApiResult<T> = Result<T, ApiError>;

/// Envelope for one logical call. Metadata is present regardless of outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub metadata: ResponseMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, metadata: ResponseMetadata) -> Self {
        Self {
            data: Some(data),
            metadata,
            error: None,
        }
    }

    pub fn failure(error: ApiError, metadata: ResponseMetadata) -> Self {
        Self {
            data: None,
            metadata,
            error: Some(error),
        }
    }

    /// True only when a payload is present and no error was recorded.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.data.is_some()
    }

    pub fn request_id(&self) -> Uuid {
        self.metadata.request_id
    }

    /// Converts the envelope into an explicit result, dropping the metadata.
    pub fn into_result(self) -> ApiResult<T> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (Some(data), None) => Ok(data),
            (None, None) => Err(ApiError::new(UNKNOWN_ERROR, "response carried no payload")),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            data: self.data.map(f),
            metadata: self.metadata,
            error: self.error,
        }
    }
}

/// Completion timestamp, correlation id and elapsed time of a logical call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// RFC 3339 (ISO-8601) UTC completion time.
    pub timestamp: String,
    pub request_id: Uuid,
    pub duration_ms: u64,
}

impl ResponseMetadata {
    pub fn new(request_id: Uuid, duration_ms: u64) -> Self {
        Self {
            timestamp: now_rfc3339(),
            request_id,
            duration_ms,
        }
    }
}

/// Machine-checkable failure detail. `details` holds the best-effort parsed error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError<D = Value> {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<D>,
}

impl<D> ApiError<D> {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status: None,
            details: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_details(mut self, details: D) -> Self {
        self.details = Some(details);
        self
    }
}

impl<D> std::fmt::Display for ApiError<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl<D: std::fmt::Debug> std::error::Error for ApiError<D> {}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
