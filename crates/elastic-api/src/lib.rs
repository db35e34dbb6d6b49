//! # Elastic API
//!
//! Typed HTTP client for the elastic habits backend.
//!
//! ## Overview
//!
//! - **Response envelope** carrying payload, correlation metadata and a structured error
//! - **Core client** with per-attempt timeout, retry with exponential backoff and
//!   error normalization
//! - **Interceptors** for attaching bearer credentials from pluggable token storage
//! - **Request cache** with TTL expiry and a caching wrapper for GET calls
//! - **Repositories** binding resource prefixes (`/auth`, `/habits`) to the client verbs
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`auth`] | Interceptor chain, token storage, bearer interceptor |
//! | [`cache`] | TTL request cache and caching client |
//! | [`client`] | Core request pipeline |
//! | [`config`] | Client configuration and per-call options |
//! | [`domain`] | Habit and auth payload types |
//! | [`envelope`] | Response envelope and error detail |
//! | [`error`] | Transport and configuration errors |
//! | [`http_client`] | Transport abstraction (reqwest/noop) |
//! | [`logging`] | Diagnostic logging hooks |
//! | [`repository`] | Prefix-bound repositories |
//! | [`retry`] | Attempt budget and backoff |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use elastic_api::{ApiClient, ApiClientConfig, HabitsRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(ApiClientConfig::from_env()?)?;
//!     let habits = HabitsRepository::new(client);
//!
//!     match habits.list().await {
//!         Ok(habits) => println!("{} habits", habits.len()),
//!         Err(error) => eprintln!("{}: {}", error.code, error.message),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Repository    │  adds path prefix
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  Caching Client │────▶│  Request Cache   │
//! │   (optional)    │     └──────────────────┘
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Core Client   │────▶│   Interceptors   │
//! │ timeout + retry │     └──────────────────┘
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │   HttpClient    │  reqwest / noop / test doubles
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Client verbs never return `Err`. Inspect the envelope:
//!
//! ```rust
//! use elastic_api::{ApiResponse, UNKNOWN_ERROR};
//! use serde_json::Value;
//!
//! fn report(response: ApiResponse<Value>) {
//!     match response.error {
//!         Some(error) if error.code == UNKNOWN_ERROR => {
//!             // transport failure after all retries
//!         }
//!         Some(error) => {
//!             // HTTP_<status>, see error.details for the parsed body
//!             let _ = error.status;
//!         }
//!         None => {}
//!     }
//! }
//! ```

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod http_client;
pub mod logging;
pub mod repository;
pub mod retry;

// Interceptors and credentials
pub use auth::{AuthInterceptor, Interceptor, MemoryTokenStorage, TokenStorage};

// Caching
pub use cache::{CacheMode, CachingClient, RequestCache, DEFAULT_CACHE_TTL};

// Core client
pub use client::{ApiClient, ApiClientBuilder, HEADER_CONTENT_TYPE, HEADER_REQUEST_ID};

// Configuration
pub use config::{ApiClientConfig, RequestDescriptor, RequestOptions};

// Domain payloads
pub use domain::{
    Activity, AuthResponse, AuthUser, Habit, HabitInput, HabitStats, LoginCredentials,
    RefreshTokenRequest, RegisterRequest, TrackingEntry, TrackingKey,
};

// Envelope types
pub use envelope::{ApiError, ApiResponse, ApiResult, ResponseMetadata};

// Error types
pub use error::{http_error_code, ConfigError, TransportError, UNKNOWN_ERROR};

// Transport
pub use http_client::{
    HttpClient, HttpMethod, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
    TransportFuture,
};

// Logging
pub use logging::{ApiLogger, NoopLogger, TracingLogger};

// Repositories
pub use repository::{AuthRepository, HabitsRepository, Repository};

// Retry
pub use retry::RetryPolicy;

// Transport cancellation handle.
pub use tokio_util::sync::CancellationToken;
