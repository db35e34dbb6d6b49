//! Diagnostic sink for requests, responses, errors and timings.
//!
//! The client receives its logger as an `Arc<dyn ApiLogger>`. A process that
//! wants one coherent log stream builds a single logger in its composition
//! root and hands clones of the `Arc` to every client.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;
use uuid::Uuid;

use crate::config::RequestDescriptor;
use crate::envelope::{ApiError, ResponseMetadata};

/// Environment variable that switches [`TracingLogger::from_env`] to verbose mode.
pub const ENV_MODE: &str = "ELASTIC_API_ENV";

/// Logging hooks invoked by the client. Implementations must not panic.
pub trait ApiLogger: Send + Sync {
    fn log_request(&self, request: &RequestDescriptor, headers: &BTreeMap<String, String>, url: &str);

    fn log_response(&self, metadata: &ResponseMetadata, payload: &Value);

    fn log_error(&self, error: &ApiError, request_id: Uuid);

    fn log_performance(&self, operation: &str, duration: Duration);
}

/// Logger emitting `tracing` events.
///
/// Request, response and performance events are only emitted in development
/// mode. Errors are always emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TracingLogger {
    development: bool,
}

impl TracingLogger {
    pub const fn new(development: bool) -> Self {
        Self { development }
    }

    pub const fn development() -> Self {
        Self::new(true)
    }

    pub fn from_env() -> Self {
        let mode = std::env::var(ENV_MODE).unwrap_or_default();
        Self::new(mode.eq_ignore_ascii_case("development"))
    }

    pub const fn is_development(&self) -> bool {
        self.development
    }
}

impl ApiLogger for TracingLogger {
    fn log_request(&self, request: &RequestDescriptor, headers: &BTreeMap<String, String>, url: &str) {
        if !self.development {
            return;
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            url = %url,
            headers = ?redact(headers),
            body = ?request.body,
            params = ?request.options.params,
            "api request"
        );
    }

    fn log_response(&self, metadata: &ResponseMetadata, payload: &Value) {
        if !self.development {
            return;
        }

        tracing::debug!(
            request_id = %metadata.request_id,
            duration_ms = metadata.duration_ms,
            data = %payload,
            "api response"
        );
    }

    fn log_error(&self, error: &ApiError, request_id: Uuid) {
        tracing::error!(
            request_id = %request_id,
            code = %error.code,
            message = %error.message,
            status = ?error.status,
            details = ?error.details,
            "api error"
        );
    }

    fn log_performance(&self, operation: &str, duration: Duration) {
        if !self.development {
            return;
        }

        tracing::debug!(
            operation = %operation,
            duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            "api performance"
        );
    }
}

/// Logger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl ApiLogger for NoopLogger {
    fn log_request(&self, _: &RequestDescriptor, _: &BTreeMap<String, String>, _: &str) {}

    fn log_response(&self, _: &ResponseMetadata, _: &Value) {}

    fn log_error(&self, _: &ApiError, _: Uuid) {}

    fn log_performance(&self, _: &str, _: Duration) {}
}

fn redact(headers: &BTreeMap<String, String>) -> BTreeMap<&str, &str> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if name == "authorization" { "<redacted>" } else { value.as_str() };
            (name.as_str(), shown)
        })
        .collect()
}
