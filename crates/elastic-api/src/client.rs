//! Core request pipeline: timeout, retry with backoff, error normalization.
//!
//! Every verb resolves to an [`ApiResponse`]. Transport failures (connect,
//! timeout, body read, decode of a 2xx body) are retried with exponential
//! backoff up to the attempt budget. Non-2xx responses are terminal on the
//! first occurrence.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::auth::Interceptor;
use crate::config::{ApiClientConfig, RequestDescriptor, RequestOptions, ResolvedOptions};
use crate::envelope::{ApiError, ApiResponse, ResponseMetadata};
use crate::error::{http_error_code, ConfigError, TransportError, UNKNOWN_ERROR};
use crate::http_client::{HttpClient, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::logging::{ApiLogger, TracingLogger};
use crate::retry::RetryPolicy;

pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_REQUEST_ID: &str = "x-request-id";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Stateless API client. Cloning is cheap and clones share one transport and logger.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ApiClientConfig>,
    transport: Arc<dyn HttpClient>,
    logger: Arc<dyn ApiLogger>,
    interceptors: Arc<[Arc<dyn Interceptor>]>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

/// Builder wiring the transport, logger and interceptors of an [`ApiClient`].
pub struct ApiClientBuilder {
    config: ApiClientConfig,
    transport: Option<Arc<dyn HttpClient>>,
    logger: Option<Arc<dyn ApiLogger>>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl ApiClientBuilder {
    pub fn new(config: ApiClientConfig) -> Self {
        Self {
            config,
            transport: None,
            logger: None,
            interceptors: Vec::new(),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpClient>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ApiLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Interceptors run in registration order.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn build(self) -> Result<ApiClient, ConfigError> {
        self.config.validate()?;

        Ok(ApiClient {
            config: Arc::new(self.config),
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new())),
            logger: self
                .logger
                .unwrap_or_else(|| Arc::new(TracingLogger::from_env())),
            interceptors: self.interceptors.into(),
        })
    }
}

enum AttemptOutcome<T> {
    Success { payload: Value, data: T },
    Rejected { status: u16, reason: &'static str, details: Option<Value> },
}

impl ApiClient {
    /// Client with the reqwest transport and an environment-configured tracing logger.
    pub fn new(config: ApiClientConfig) -> Result<Self, ConfigError> {
        ApiClientBuilder::new(config).build()
    }

    pub fn builder(config: ApiClientConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> ApiResponse<T> {
        self.execute(RequestDescriptor::new(HttpMethod::Get, path).with_options(options))
            .await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ApiResponse<T> {
        self.execute(RequestDescriptor::new(HttpMethod::Delete, path).with_options(options))
            .await
    }

    /// A body serializing to JSON `null` (such as `&()`) sends no body.
    pub async fn post<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(HttpMethod::Post, path, body, options).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(HttpMethod::Put, path, body, options).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B, options: RequestOptions) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(HttpMethod::Patch, path, body, options).await
    }

    async fn send_with_body<T, B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> ApiResponse<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request_id = Uuid::new_v4();
        let body = match serde_json::to_value(body) {
            Ok(body) => body,
            Err(error) => {
                let error = ApiError::new(UNKNOWN_ERROR, format!("failed to encode request body: {error}"));
                self.logger.log_error(&error, request_id);
                return ApiResponse::failure(error, ResponseMetadata::new(request_id, 0));
            }
        };

        let mut request = RequestDescriptor::new(method, path).with_options(options);
        if !body.is_null() {
            request = request.with_body(body);
        }
        self.run(request, request_id).await
    }

    /// Runs one logical call described by `request`.
    pub async fn execute<T: DeserializeOwned>(&self, request: RequestDescriptor) -> ApiResponse<T> {
        self.run(request, Uuid::new_v4()).await
    }

    async fn run<T: DeserializeOwned>(&self, request: RequestDescriptor, request_id: Uuid) -> ApiResponse<T> {
        let started = Instant::now();
        let request = self
            .interceptors
            .iter()
            .fold(request, |request, interceptor| interceptor.intercept_request(&request));

        let resolved = ResolvedOptions::resolve(&self.config, &request.options);
        let policy = RetryPolicy::new(resolved.retries, resolved.retry_delay);
        let url = self.config.build_url(&request.path, &request.options.params);
        let headers = forced_headers(resolved.headers, request_id);
        let body = request.body.as_ref().map(Value::to_string);
        let operation = format!("{} {}", request.method, request.path);

        self.logger.log_request(&request, &headers, &url);

        let mut attempt = 1;
        loop {
            let physical = HttpRequest {
                method: request.method,
                url: url.clone(),
                headers: headers.clone(),
                body: body.clone(),
            };

            match self.attempt::<T>(physical, resolved.timeout).await {
                Ok(AttemptOutcome::Success { payload, data }) => {
                    let metadata = ResponseMetadata::new(request_id, elapsed_ms(started));
                    self.logger.log_response(&metadata, &payload);
                    return ApiResponse::success(data, metadata);
                }
                Ok(AttemptOutcome::Rejected {
                    status,
                    reason,
                    details,
                }) => {
                    let mut error = ApiError::new(http_error_code(status), reason).with_status(status);
                    error.details = details;
                    self.logger.log_error(&error, request_id);
                    return ApiResponse::failure(error, ResponseMetadata::new(request_id, elapsed_ms(started)));
                }
                Err(error) => {
                    let error = self
                        .interceptors
                        .iter()
                        .fold(error, |error, interceptor| interceptor.intercept_error(error));
                    self.logger.log_performance(&operation, started.elapsed());

                    if policy.should_retry(attempt) {
                        let delay = policy.delay_for_attempt(attempt);
                        tracing::debug!(
                            request_id = %request_id,
                            attempt,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            error = %error,
                            "retrying api request"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    let api_error = transport_error_detail(&error);
                    self.logger.log_error(&api_error, request_id);
                    return ApiResponse::failure(
                        api_error,
                        ResponseMetadata::new(request_id, elapsed_ms(started)),
                    );
                }
            }
        }
    }

    /// One physical attempt raced against `timeout`. The losing transport future is
    /// dropped and its cancellation token fired.
    async fn attempt<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
        timeout: Duration,
    ) -> Result<AttemptOutcome<T>, TransportError> {
        let cancel = CancellationToken::new();
        let response = match tokio::time::timeout(timeout, self.transport.execute(request, cancel.clone())).await {
            Ok(result) => result?,
            Err(_) => {
                cancel.cancel();
                return Err(TransportError::Timeout {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
        };

        let response: HttpResponse = self
            .interceptors
            .iter()
            .fold(response, |response, interceptor| interceptor.intercept_response(response));

        if !response.is_success() {
            return Ok(AttemptOutcome::Rejected {
                status: response.status,
                reason: response.reason(),
                details: serde_json::from_str(&response.body).ok(),
            });
        }

        let payload: Value = if response.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response.body)?
        };
        let data = T::deserialize(&payload)?;

        Ok(AttemptOutcome::Success { payload, data })
    }
}

/// Caller headers first, then the two headers callers cannot override.
fn forced_headers(mut headers: BTreeMap<String, String>, request_id: Uuid) -> BTreeMap<String, String> {
    headers.insert(String::from(HEADER_CONTENT_TYPE), String::from(JSON_CONTENT_TYPE));
    headers.insert(String::from(HEADER_REQUEST_ID), request_id.to_string());
    headers
}

fn transport_error_detail(error: &TransportError) -> ApiError {
    match error.status() {
        Some(status) => ApiError::new(http_error_code(status), error.to_string()).with_status(status),
        None => ApiError::new(UNKNOWN_ERROR, error.to_string()),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
