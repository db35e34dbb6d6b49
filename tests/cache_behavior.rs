//! Behavior tests for the request cache and the caching client wrapper.

use elastic_api::{CacheMode, CachingClient, RequestCache};
use elastic_tests::*;
use std::collections::BTreeMap;

fn caching(transport: std::sync::Arc<ScriptedHttpClient>) -> CachingClient {
    CachingClient::new(client(transport, 1, 10), RequestCache::new(Duration::from_secs(60)))
}

#[tokio::test]
async fn when_a_get_succeeds_the_next_identical_get_is_served_from_cache() {
    let transport = ScriptedHttpClient::new([Step::json(200, json!([{"id": "h1"}]))]);
    let client = caching(transport.clone());

    let first: ApiResponse<Value> = client.get("/habits", RequestOptions::new(), CacheMode::Use).await;
    let second: ApiResponse<Value> = client.get("/habits", RequestOptions::new(), CacheMode::Use).await;

    assert_eq!(transport.call_count(), 1);
    assert_eq!(first.data, second.data);
    assert_ne!(first.metadata.request_id, second.metadata.request_id);
    assert_eq!(second.metadata.duration_ms, 0);
}

#[tokio::test]
async fn when_params_differ_only_in_order_the_cache_still_hits() {
    let transport = ScriptedHttpClient::new([Step::json(200, json!({"page": 1}))]);
    let client = caching(transport.clone());

    let _: ApiResponse<Value> = client
        .get(
            "/habits",
            RequestOptions::new().param("b", "2").param("a", "1"),
            CacheMode::Use,
        )
        .await;
    let hit: ApiResponse<Value> = client
        .get(
            "/habits",
            RequestOptions::new().param("a", "1").param("b", "2"),
            CacheMode::Use,
        )
        .await;

    assert_eq!(transport.call_count(), 1);
    assert_eq!(hit.data, Some(json!({"page": 1})));
}

#[tokio::test]
async fn when_a_get_fails_nothing_is_cached() {
    let transport = ScriptedHttpClient::new([
        Step::json(500, json!({"error": "boom"})),
        Step::json(200, json!({"ok": true})),
    ]);
    let client = caching(transport.clone());

    let failed: ApiResponse<Value> = client.get("/habits", RequestOptions::new(), CacheMode::Use).await;
    let retried: ApiResponse<Value> = client.get("/habits", RequestOptions::new(), CacheMode::Use).await;

    assert!(failed.error.is_some());
    assert_eq!(retried.data, Some(json!({"ok": true})));
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn refresh_mode_fetches_and_replaces_the_entry() {
    let transport = ScriptedHttpClient::new([
        Step::json(200, json!({"version": 1})),
        Step::json(200, json!({"version": 2})),
    ]);
    let client = caching(transport.clone());

    let _: ApiResponse<Value> = client.get("/habits", RequestOptions::new(), CacheMode::Use).await;
    let refreshed: ApiResponse<Value> =
        client.get("/habits", RequestOptions::new(), CacheMode::Refresh).await;
    let cached: ApiResponse<Value> = client.get("/habits", RequestOptions::new(), CacheMode::Use).await;

    assert_eq!(transport.call_count(), 2);
    assert_eq!(refreshed.data, Some(json!({"version": 2})));
    assert_eq!(cached.data, Some(json!({"version": 2})));
}

#[tokio::test]
async fn bypass_mode_neither_reads_nor_writes_the_cache() {
    let transport = ScriptedHttpClient::new([
        Step::json(200, json!({"version": 1})),
        Step::json(200, json!({"version": 2})),
    ]);
    let client = caching(transport.clone());

    let _: ApiResponse<Value> = client.get("/habits", RequestOptions::new(), CacheMode::Bypass).await;
    assert!(client.cache().is_empty().await);

    let _: ApiResponse<Value> = client.get("/habits", RequestOptions::new(), CacheMode::Use).await;
    let bypassed: ApiResponse<Value> =
        client.get("/habits", RequestOptions::new(), CacheMode::Bypass).await;

    assert_eq!(transport.call_count(), 3, "bypass must reach the transport despite a cached entry");
    assert_eq!(bypassed.data, None);
}

#[tokio::test]
async fn invalidate_forces_the_next_get_to_the_network() {
    let transport = ScriptedHttpClient::new([
        Step::json(200, json!({"version": 1})),
        Step::json(200, json!({"version": 2})),
    ]);
    let client = caching(transport.clone());

    let _: ApiResponse<Value> = client.get("/habits", RequestOptions::new(), CacheMode::Use).await;
    client.invalidate("/habits", None).await;
    let fresh: ApiResponse<Value> = client.get("/habits", RequestOptions::new(), CacheMode::Use).await;

    assert_eq!(fresh.data, Some(json!({"version": 2})));
}

#[tokio::test(start_paused = true)]
async fn expired_entries_go_back_to_the_network() {
    let transport = ScriptedHttpClient::new([
        Step::json(200, json!({"version": 1})),
        Step::json(200, json!({"version": 2})),
    ]);
    let client = CachingClient::new(
        client(transport.clone(), 1, 10),
        RequestCache::new(Duration::from_millis(100)),
    );

    let _: ApiResponse<Value> = client.get("/habits", RequestOptions::new(), CacheMode::Use).await;
    tokio::time::advance(Duration::from_millis(150)).await;
    let fresh: ApiResponse<Value> = client.get("/habits", RequestOptions::new(), CacheMode::Use).await;

    assert_eq!(transport.call_count(), 2);
    assert_eq!(fresh.data, Some(json!({"version": 2})));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_readers_never_observe_a_partial_entry() {
    let cache: RequestCache<Vec<u32>> = RequestCache::new(Duration::from_secs(60));
    let params = BTreeMap::from([(String::from("page"), String::from("1"))]);

    let mut tasks = Vec::new();
    for writer in 0..8_u32 {
        let cache = cache.clone();
        let params = params.clone();
        tasks.push(tokio::spawn(async move {
            for round in 0..50_u32 {
                let value = vec![writer * 1_000 + round; 16];
                cache
                    .set(HttpMethod::Get, "/habits", value, None, Some(&params))
                    .await;
                if let Some(seen) = cache.get(HttpMethod::Get, "/habits", Some(&params)).await {
                    assert_eq!(seen.len(), 16);
                    assert!(seen.iter().all(|item| *item == seen[0]), "torn entry {seen:?}");
                }
            }
        }));
    }

    for task in tasks {
        task.await.expect("task completes");
    }
    assert_eq!(cache.len().await, 1);
}
