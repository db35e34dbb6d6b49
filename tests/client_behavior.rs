//! Behavior tests for the core client pipeline: success and failure
//! envelopes, retry with backoff, timeout cancellation and correlation ids.

use elastic_api::{AuthInterceptor, MemoryTokenStorage, UNKNOWN_ERROR};
use elastic_tests::*;
use std::sync::Arc;
use uuid::Uuid;

// =============================================================================
// Success and HTTP failure
// =============================================================================

#[tokio::test]
async fn when_server_returns_2xx_json_caller_gets_data_without_error() {
    let transport = ScriptedHttpClient::new([Step::json(200, json!({"data": {"id": 1, "name": "Test"}}))]);
    let client = client(transport.clone(), 1, 10);

    let response: ApiResponse<Value> = client.get("/test", RequestOptions::new()).await;

    assert!(response.error.is_none());
    assert_eq!(response.data, Some(json!({"data": {"id": 1, "name": "Test"}})));

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].request.method, HttpMethod::Get);
    assert_eq!(calls[0].request.url, "https://api.example.com/test");
    assert_eq!(calls[0].request.header("content-type"), Some("application/json"));
    assert_eq!(calls[0].request.body, None);
}

#[tokio::test]
async fn when_server_returns_404_client_makes_one_attempt_and_reports_http_code() {
    let transport = ScriptedHttpClient::new([
        Step::json(404, json!({"message": "Not Found"})),
        Step::json(200, json!({"unexpected": true})),
    ]);
    let client = client(transport.clone(), 3, 10);

    let response: ApiResponse<Value> = client.get("/test", RequestOptions::new()).await;

    assert_eq!(transport.call_count(), 1, "HTTP errors must not be retried");
    assert_eq!(response.data, None);
    let error = response.error.expect("error detail");
    assert_eq!(error.code, "HTTP_404");
    assert_eq!(error.status, Some(404));
    assert_eq!(error.message, "Not Found");
    assert_eq!(error.details, Some(json!({"message": "Not Found"})));
}

#[tokio::test]
async fn when_error_body_is_not_json_details_are_absent_but_call_still_fails_cleanly() {
    let transport = ScriptedHttpClient::new([Step::raw(500, "<html>boom</html>")]);
    let client = client(transport.clone(), 3, 10);

    let response: ApiResponse<Value> = client.delete("/habits/1", RequestOptions::new()).await;

    let error = response.error.expect("error detail");
    assert_eq!(error.code, "HTTP_500");
    assert_eq!(error.message, "Internal Server Error");
    assert_eq!(error.details, None);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn when_payload_type_is_declared_data_is_decoded_into_it() {
    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Item {
        id: u32,
        name: String,
    }

    let transport = ScriptedHttpClient::new([Step::json(201, json!({"id": 7, "name": "Read"}))]);
    let client = client(transport.clone(), 1, 10);

    let response: ApiResponse<Item> = client
        .post("/habits", &json!({"name": "Read"}), RequestOptions::new())
        .await;

    assert_eq!(
        response.data,
        Some(Item {
            id: 7,
            name: String::from("Read"),
        })
    );
    let calls = transport.calls();
    assert_eq!(calls[0].request.method, HttpMethod::Post);
    assert_eq!(calls[0].request.body.as_deref(), Some(r#"{"name":"Read"}"#));
}

// =============================================================================
// Retry and backoff
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_transport_fails_once_client_retries_and_returns_success() {
    let transport = ScriptedHttpClient::new([
        Step::network_error(),
        Step::json(200, json!({"id": 1, "name": "Test"})),
    ]);
    let client = client(transport.clone(), 2, 10);

    let response: ApiResponse<Value> = client.get("/test", RequestOptions::new()).await;

    assert_eq!(transport.call_count(), 2);
    assert_eq!(response.data, Some(json!({"id": 1, "name": "Test"})));
    assert!(response.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn when_transport_keeps_failing_delays_double_until_attempts_run_out() {
    let transport = ScriptedHttpClient::new([
        Step::network_error(),
        Step::network_error(),
        Step::network_error(),
        Step::network_error(),
    ]);
    let client = client(transport.clone(), 4, 10);

    let response: ApiResponse<Value> = client.get("/test", RequestOptions::new()).await;

    let calls = transport.calls();
    assert_eq!(calls.len(), 4);
    let gaps: Vec<Duration> = calls.windows(2).map(|pair| pair[1].at - pair[0].at).collect();
    assert_eq!(
        gaps,
        vec![
            Duration::from_millis(10),
            Duration::from_millis(20),
            Duration::from_millis(40),
        ]
    );

    let error = response.error.expect("error detail");
    assert_eq!(error.code, UNKNOWN_ERROR);
    assert!(error.message.contains("Network error"));
    assert_eq!(response.data, None);
}

#[tokio::test(start_paused = true)]
async fn when_retries_exhaust_duration_covers_every_attempt_and_backoff() {
    let transport = ScriptedHttpClient::new([
        Step::network_error(),
        Step::network_error(),
        Step::network_error(),
    ]);
    let client = client(transport.clone(), 3, 10);

    let response: ApiResponse<Value> = client.get("/test", RequestOptions::new()).await;

    assert_eq!(response.metadata.duration_ms, 30);
}

#[tokio::test(start_paused = true)]
async fn when_per_call_retry_options_are_given_they_override_client_defaults() {
    let transport = ScriptedHttpClient::new([Step::network_error(), Step::network_error()]);
    let client = client(transport.clone(), 5, 1_000);

    let response: ApiResponse<Value> = client
        .get(
            "/test",
            RequestOptions::new().retries(2).retry_delay(Duration::from_millis(1)),
        )
        .await;

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].at - calls[0].at, Duration::from_millis(1));
    assert_eq!(response.error.expect("error").code, UNKNOWN_ERROR);
}

#[tokio::test(start_paused = true)]
async fn when_success_body_is_not_json_the_attempt_is_retried() {
    let transport = ScriptedHttpClient::new([
        Step::raw(200, "not json"),
        Step::json(200, json!({"ok": true})),
    ]);
    let client = client(transport.clone(), 2, 10);

    let response: ApiResponse<Value> = client.get("/test", RequestOptions::new()).await;

    assert_eq!(transport.call_count(), 2);
    assert_eq!(response.data, Some(json!({"ok": true})));
}

#[tokio::test(start_paused = true)]
async fn when_transport_failure_carries_a_status_final_code_uses_it() {
    let transport = ScriptedHttpClient::new([Step::Fail(TransportError::Status {
        status: 502,
        message: String::from("bad gateway"),
    })]);
    let client = client(transport.clone(), 1, 10);

    let response: ApiResponse<Value> = client.get("/test", RequestOptions::new()).await;

    let error = response.error.expect("error detail");
    assert_eq!(error.code, "HTTP_502");
    assert_eq!(error.status, Some(502));
}

// =============================================================================
// Timeout and cancellation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_attempt_times_out_in_flight_request_is_cancelled_and_retried() {
    let transport = ScriptedHttpClient::new([Step::Hang, Step::json(200, json!({"ok": true}))]);
    let client = client(transport.clone(), 2, 10);

    let response: ApiResponse<Value> = client
        .get("/test", RequestOptions::new().timeout(Duration::from_millis(50)))
        .await;

    assert_eq!(response.data, Some(json!({"ok": true})));
    assert_eq!(transport.call_count(), 2);
    assert_eq!(transport.cancelled_count(), 1, "timed-out attempt must be cancelled");
    assert_eq!(transport.abandoned_count(), 1, "timed-out attempt must be dropped");

    let calls = transport.calls();
    assert_eq!(calls[1].at - calls[0].at, Duration::from_millis(60));
}

#[tokio::test(start_paused = true)]
async fn when_every_attempt_times_out_caller_gets_unknown_error() {
    let transport = ScriptedHttpClient::new([Step::Hang]);
    let client = client(transport.clone(), 1, 10);

    let response: ApiResponse<Value> = client
        .get("/test", RequestOptions::new().timeout(Duration::from_millis(5)))
        .await;

    let error = response.error.expect("error detail");
    assert_eq!(error.code, UNKNOWN_ERROR);
    assert!(error.message.contains("timed out"), "message was {}", error.message);
    assert_eq!(transport.abandoned_count(), 1);
}

// =============================================================================
// Headers, URL and correlation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn correlation_id_is_stable_across_retries_and_matches_metadata() {
    let transport = ScriptedHttpClient::new([
        Step::network_error(),
        Step::network_error(),
        Step::json(200, json!({})),
    ]);
    let client = client(transport.clone(), 3, 10);

    let response: ApiResponse<Value> = client.get("/test", RequestOptions::new()).await;

    let ids: Vec<String> = transport
        .calls()
        .iter()
        .map(|call| call.request.header("x-request-id").expect("id header").to_owned())
        .collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(ids[0], response.metadata.request_id.to_string());
    assert_eq!(
        Uuid::parse_str(&ids[0]).expect("uuid").get_version_num(),
        4
    );
}

#[tokio::test]
async fn independent_calls_get_distinct_correlation_ids() {
    let transport = ScriptedHttpClient::new([Step::json(200, json!({})), Step::json(200, json!({}))]);
    let client = client(transport.clone(), 1, 10);

    let (first, second): (ApiResponse<Value>, ApiResponse<Value>) = tokio::join!(
        client.get("/a", RequestOptions::new()),
        client.get("/b", RequestOptions::new()),
    );

    assert_ne!(first.metadata.request_id, second.metadata.request_id);
}

#[tokio::test]
async fn caller_headers_merge_but_cannot_override_forced_headers() {
    let transport = ScriptedHttpClient::new([Step::json(200, json!({}))]);
    let config = ApiClientConfig::new(BASE_URL)
        .with_header("X-Client", "elastic")
        .with_header("Accept-Language", "en");
    let client = ApiClient::builder(config)
        .with_transport(transport.clone())
        .with_logger(Arc::new(NoopLogger))
        .build()
        .expect("valid config");

    let response: ApiResponse<Value> = client
        .get(
            "/test",
            RequestOptions::new()
                .header("Content-Type", "text/plain")
                .header("X-Request-ID", "spoofed")
                .header("Accept-Language", "de"),
        )
        .await;

    let request = &transport.calls()[0].request;
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(
        request.header("x-request-id"),
        Some(response.metadata.request_id.to_string().as_str())
    );
    assert_eq!(request.header("x-client"), Some("elastic"));
    assert_eq!(request.header("accept-language"), Some("de"));
}

#[tokio::test]
async fn query_params_are_appended_to_the_url() {
    let transport = ScriptedHttpClient::new([Step::json(200, json!([]))]);
    let client = client(transport.clone(), 1, 10);

    let _: ApiResponse<Value> = client
        .get(
            "/habits/tracking",
            RequestOptions::new().param("from", "2024-05-01").param("habit", "h 1"),
        )
        .await;

    assert_eq!(
        transport.calls()[0].request.url,
        "https://api.example.com/habits/tracking?from=2024-05-01&habit=h%201"
    );
}

#[tokio::test]
async fn registered_auth_interceptor_adds_bearer_header_on_the_wire() {
    let transport = ScriptedHttpClient::new([Step::json(200, json!({}))]);
    let storage = Arc::new(MemoryTokenStorage::with_tokens("token-123", "refresh"));
    let client = ApiClient::builder(ApiClientConfig::new(BASE_URL))
        .with_transport(transport.clone())
        .with_logger(Arc::new(NoopLogger))
        .with_interceptor(Arc::new(AuthInterceptor::new(storage)))
        .build()
        .expect("valid config");

    let _: ApiResponse<Value> = client.get("/auth/me", RequestOptions::new()).await;

    assert_eq!(
        transport.calls()[0].request.header("authorization"),
        Some("Bearer token-123")
    );
}
