//! TTL cache for idempotent reads and a client wrapper that consults it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::RequestOptions;
use crate::envelope::{ApiResponse, ResponseMetadata};
use crate::http_client::HttpMethod;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// How [`CachingClient`] treats the cache for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Serve a fresh entry if present, otherwise fetch and store. (Default)
    #[default]
    Use,
    /// Always fetch, then store the new result.
    Refresh,
    /// Always fetch and leave the cache untouched.
    Bypass,
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    data: V,
    created_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// Expired once older than `ttl`. `Duration::MAX` never expires.
    fn is_expired(&self, now: Instant) -> bool {
        self.age(now) > self.ttl
    }

    fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }
}

/// Passive key/value store with per-entry expiry.
///
/// Keys combine method, url and the sorted, percent-encoded query parameters. Expired entries
/// are evicted when read; there is no background sweep.
#[derive(Debug, Clone)]
pub struct RequestCache<V = Value> {
    inner: Arc<tokio::sync::RwLock<HashMap<String, CacheEntry<V>>>>,
    default_ttl: Duration,
}

impl<V: Clone> RequestCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn key(method: HttpMethod, url: &str, params: Option<&BTreeMap<String, String>>) -> String {
        let params = params
            .map(|params| {
                params
                    .iter()
                    .map(|(key, value)| {
                        format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
                    })
                    .collect::<Vec<_>>()
                    .join("&")
            })
            .unwrap_or_default();
        format!("{method}:{url}:{params}")
    }

    pub async fn set(
        &self,
        method: HttpMethod,
        url: &str,
        data: V,
        ttl: Option<Duration>,
        params: Option<&BTreeMap<String, String>>,
    ) {
        let entry = CacheEntry {
            data,
            created_at: Instant::now(),
            ttl: ttl.unwrap_or(self.default_ttl),
        };
        self.inner
            .write()
            .await
            .insert(Self::key(method, url, params), entry);
    }

    pub async fn get(
        &self,
        method: HttpMethod,
        url: &str,
        params: Option<&BTreeMap<String, String>>,
    ) -> Option<V> {
        let key = Self::key(method, url, params);
        let now = Instant::now();

        {
            let store = self.inner.read().await;
            match store.get(&key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.data.clone()),
                Some(_) => {}
            }
        }

        let mut store = self.inner.write().await;
        if store.get(&key).is_some_and(|entry| entry.is_expired(now)) {
            store.remove(&key);
            return None;
        }
        store.get(&key).map(|entry| entry.data.clone())
    }

    /// Age of a live entry, for diagnostics.
    pub async fn age(
        &self,
        method: HttpMethod,
        url: &str,
        params: Option<&BTreeMap<String, String>>,
    ) -> Option<Duration> {
        let now = Instant::now();
        let store = self.inner.read().await;
        store
            .get(&Self::key(method, url, params))
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.age(now))
    }

    pub async fn remove(&self, method: HttpMethod, url: &str, params: Option<&BTreeMap<String, String>>) {
        self.inner
            .write()
            .await
            .remove(&Self::key(method, url, params));
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    /// Number of stored entries, expired ones included until they are read.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl<V: Clone> Default for RequestCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

/// Wraps an [`ApiClient`] and serves GET calls from a [`RequestCache`].
///
/// Only successful envelopes are stored. Hits are returned with a fresh
/// request id and zero duration without touching the network.
#[derive(Debug, Clone)]
pub struct CachingClient {
    client: ApiClient,
    cache: RequestCache<Value>,
}

impl CachingClient {
    pub fn new(client: ApiClient, cache: RequestCache<Value>) -> Self {
        Self { client, cache }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn cache(&self) -> &RequestCache<Value> {
        &self.cache
    }

    pub async fn get<T>(&self, path: &str, options: RequestOptions, mode: CacheMode) -> ApiResponse<T>
    where
        T: DeserializeOwned + Serialize,
    {
        let url = self.client.config().build_url(path, &BTreeMap::new());
        let params = (!options.params.is_empty()).then_some(&options.params);

        if mode == CacheMode::Use {
            if let Some(cached) = self.cache.get(HttpMethod::Get, &url, params).await {
                if let Ok(data) = serde_json::from_value::<T>(cached) {
                    tracing::debug!(url = %url, "api cache hit");
                    return ApiResponse::success(data, ResponseMetadata::new(Uuid::new_v4(), 0));
                }
            }
        }

        let cache_params = options.params.clone();
        let response: ApiResponse<T> = self.client.get(path, options).await;

        if mode != CacheMode::Bypass && response.is_success() {
            if let Some(value) = response.data.as_ref().and_then(|data| serde_json::to_value(data).ok()) {
                let params = (!cache_params.is_empty()).then_some(&cache_params);
                self.cache.set(HttpMethod::Get, &url, value, None, params).await;
            }
        }

        response
    }

    /// Drops the cached GET result for `path`.
    pub async fn invalidate(&self, path: &str, params: Option<&BTreeMap<String, String>>) {
        let url = self.client.config().build_url(path, &BTreeMap::new());
        self.cache.remove(HttpMethod::Get, &url, params).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[tokio::test]
    async fn set_then_get_returns_data() {
        let cache = RequestCache::new(Duration::from_secs(1));

        assert!(cache.get(HttpMethod::Get, "/habits", None).await.is_none());
        cache.set(HttpMethod::Get, "/habits", "value1", None, None).await;
        assert_eq!(cache.get(HttpMethod::Get, "/habits", None).await, Some("value1"));

        cache.set(HttpMethod::Get, "/habits", "value2", None, None).await;
        assert_eq!(cache.get(HttpMethod::Get, "/habits", None).await, Some("value2"));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_evicted_on_read() {
        let cache = RequestCache::new(Duration::from_secs(60));
        cache
            .set(HttpMethod::Get, "/habits", 1_u32, Some(Duration::from_millis(100)), None)
            .await;
        assert_eq!(cache.len().await, 1);

        tokio::time::advance(Duration::from_millis(150)).await;

        assert_eq!(cache.get(HttpMethod::Get, "/habits", None).await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn default_ttl_applies_without_override() {
        let cache = RequestCache::new(Duration::from_millis(100));
        cache.set(HttpMethod::Get, "/habits", 1_u32, None, None).await;

        tokio::time::advance(Duration::from_millis(50)).await;
        assert_eq!(cache.get(HttpMethod::Get, "/habits", None).await, Some(1));
        assert_eq!(
            cache.age(HttpMethod::Get, "/habits", None).await,
            Some(Duration::from_millis(50))
        );

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(cache.get(HttpMethod::Get, "/habits", None).await, None);
    }

    #[tokio::test]
    async fn key_ignores_param_insertion_order() {
        let cache = RequestCache::default();
        let written = params(&[("b", "2"), ("a", "1")]);
        let read = params(&[("a", "1"), ("b", "2")]);

        cache
            .set(HttpMethod::Get, "/habits", "hit", None, Some(&written))
            .await;
        assert_eq!(
            cache.get(HttpMethod::Get, "/habits", Some(&read)).await,
            Some("hit")
        );
        assert_eq!(cache.get(HttpMethod::Get, "/habits", None).await, None);
    }

    #[tokio::test]
    async fn method_is_part_of_the_key() {
        let cache = RequestCache::default();
        cache.set(HttpMethod::Get, "/habits", 1_u8, None, None).await;
        assert_eq!(cache.get(HttpMethod::Post, "/habits", None).await, None);
    }

    #[tokio::test]
    async fn remove_and_clear_invalidate() {
        let cache = RequestCache::default();
        cache.set(HttpMethod::Get, "/a", 1_u8, None, None).await;
        cache.set(HttpMethod::Get, "/b", 2_u8, None, None).await;

        cache.remove(HttpMethod::Get, "/a", None).await;
        assert_eq!(cache.get(HttpMethod::Get, "/a", None).await, None);
        assert_eq!(cache.len().await, 1);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_ttl_never_expires() {
        let cache = RequestCache::new(Duration::MAX);
        cache.set(HttpMethod::Get, "/habits", 1_u32, None, None).await;
        cache
            .set(HttpMethod::Get, "/forever", 2_u32, Some(Duration::MAX), None)
            .await;

        tokio::time::advance(Duration::from_secs(365 * 24 * 60 * 60)).await;

        assert_eq!(cache.get(HttpMethod::Get, "/habits", None).await, Some(1));
        assert_eq!(cache.get(HttpMethod::Get, "/forever", None).await, Some(2));
    }

    #[tokio::test]
    async fn param_values_cannot_forge_another_key() {
        let cache = RequestCache::default();
        let split = params(&[("a", "1"), ("b", "2")]);
        let joined = params(&[("a", "1&b=2")]);

        cache.set(HttpMethod::Get, "/habits", "split", None, Some(&split)).await;

        assert_ne!(
            RequestCache::<u8>::key(HttpMethod::Get, "/habits", Some(&split)),
            RequestCache::<u8>::key(HttpMethod::Get, "/habits", Some(&joined))
        );
        assert_eq!(cache.get(HttpMethod::Get, "/habits", Some(&joined)).await, None);
    }

    #[test]
    fn default_ttl_is_five_minutes() {
        let cache: RequestCache = RequestCache::default();
        assert_eq!(cache.default_ttl(), Duration::from_secs(300));
        assert_eq!(CacheMode::default(), CacheMode::Use);
    }
}
