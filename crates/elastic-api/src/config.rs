//! Client-level configuration and per-call request descriptors.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::http_client::HttpMethod;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1_000);

pub const ENV_BASE_URL: &str = "ELASTIC_API_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "ELASTIC_API_TIMEOUT_MS";
pub const ENV_RETRIES: &str = "ELASTIC_API_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "ELASTIC_API_RETRY_DELAY_MS";

/// Defaults applied to every call made through one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiClientConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_ms", rename = "default_timeout_ms", with = "millis")]
    pub default_timeout: Duration,
    #[serde(default = "default_retries")]
    pub default_retries: u32,
    #[serde(default = "default_retry_delay_ms", rename = "default_retry_delay_ms", with = "millis")]
    pub default_retry_delay: Duration,
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_timeout: DEFAULT_TIMEOUT,
            default_retries: DEFAULT_RETRIES,
            default_retry_delay: DEFAULT_RETRY_DELAY,
            default_headers: BTreeMap::new(),
        }
    }

    /// Reads the `ELASTIC_API_*` environment variables. Only the base url is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(ENV_BASE_URL).ok_or(ConfigError::MissingEnv { name: ENV_BASE_URL })?;
        let mut config = Self::new(base_url);

        if let Some(ms) = parse_env::<u64>(&lookup, ENV_TIMEOUT_MS)? {
            config.default_timeout = Duration::from_millis(ms);
        }
        if let Some(retries) = parse_env::<u32>(&lookup, ENV_RETRIES)? {
            config.default_retries = retries;
        }
        if let Some(ms) = parse_env::<u64>(&lookup, ENV_RETRY_DELAY_MS)? {
            config.default_retry_delay = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.default_retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.default_retry_delay = delay;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match reqwest::Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
            _ => Err(ConfigError::InvalidBaseUrl {
                value: self.base_url.clone(),
            }),
        }
    }

    /// Joins `base_url` and `path` with exactly one slash and appends the query string.
    pub fn build_url(&self, path: &str, params: &BTreeMap<String, String>) -> String {
        let base = self.base_url.trim_end_matches('/');
        let mut url = if path.is_empty() {
            base.to_owned()
        } else {
            format!("{base}/{}", path.trim_start_matches('/'))
        };

        if !params.is_empty() {
            let query = params
                .iter()
                .map(|(key, value)| {
                    format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
                })
                .collect::<Vec<_>>()
                .join("&");
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }

        url
    }
}

fn parse_env<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { name, value }),
    }
}

fn default_timeout_ms() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

fn default_retry_delay_ms() -> Duration {
    DEFAULT_RETRY_DELAY
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Per-call overrides. Absent values fall back to [`ApiClientConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
    pub retry_delay: Option<Duration>,
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Immutable description of one logical call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
    pub options: RequestOptions,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// Effective settings for a logical call after overlaying per-call options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedOptions {
    pub timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
    pub headers: BTreeMap<String, String>,
}

impl ResolvedOptions {
    pub fn resolve(config: &ApiClientConfig, options: &RequestOptions) -> Self {
        let mut headers: BTreeMap<String, String> = config
            .default_headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect();
        for (name, value) in &options.headers {
            headers.insert(name.to_ascii_lowercase(), value.clone());
        }

        Self {
            timeout: options.timeout.unwrap_or(config.default_timeout),
            retries: options.retries.unwrap_or(config.default_retries),
            retry_delay: options.retry_delay.unwrap_or(config.default_retry_delay),
            headers,
        }
    }
}
