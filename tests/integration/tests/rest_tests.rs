//! REST client integration tests
//!
//! Run against a local wiremock server; no network access needed.
//!
//! Run with: cargo test -p integration-tests --test rest_tests

use std::time::{Duration, Instant};

use echord_cache::CacheManager;
use echord_core::{Channel, ChannelType, Snowflake};
use echord_rest::{
    DispatchError, DispatcherConfig, RequestOptions, RestClient, RestConfig, RestError, Route,
};
use reqwest::Method;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHANNEL_ID: &str = "41771983423143937";

fn client(server: &MockServer) -> RestClient {
    let config = RestConfig::new("test-token").with_base_url(format!("{}/api", server.uri()));
    RestClient::new(config, DispatcherConfig::default()).unwrap()
}

fn channel_body() -> serde_json::Value {
    json!({
        "id": CHANNEL_ID,
        "type": 0,
        "guild_id": "197038439483310086",
        "name": "general",
        "position": 0,
    })
}

// ============================================================================
// Requests
// ============================================================================

#[tokio::test]
async fn test_get_sends_bot_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v10/channels/{CHANNEL_ID}")))
        .and(header("authorization", "Bot test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(channel_body()))
        .expect(1)
        .mount(&server)
        .await;

    let channel: Channel = client(&server)
        .get_as(&format!("/channels/{CHANNEL_ID}"))
        .await
        .unwrap();
    assert_eq!(channel.name.as_deref(), Some("general"));
    assert_eq!(channel.kind, ChannelType::GuildText);
}

#[tokio::test]
async fn test_fetched_entities_land_in_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v10/channels/{CHANNEL_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(channel_body()))
        .mount(&server)
        .await;

    let caches = CacheManager::new();
    let channel: Channel = client(&server)
        .get_as(&format!("/channels/{CHANNEL_ID}"))
        .await
        .unwrap();
    caches.channels.set(channel.id, channel);

    let id = Snowflake::parse(CHANNEL_ID).unwrap();
    assert!(caches.channels.contains_key(&id));
    assert_eq!(caches.channels.find_by_name("GENERAL", false).map(|c| c.id), Some(id));
    caches.destroy();
}

#[tokio::test]
async fn test_empty_response_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v10/channels/1/messages/2"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let value = client(&server).delete("/channels/1/messages/2").await.unwrap();
    assert!(value.is_null());
}

#[tokio::test]
async fn test_audit_log_reason_header() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v10/guilds/197038439483310086/bans/80351110224678912"))
        .and(header("x-audit-log-reason", "spam"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .request(
            Method::DELETE,
            "/guilds/197038439483310086/bans/80351110224678912",
            None,
            RequestOptions::with_reason("spam"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_http_error_is_returned_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v10/channels/1"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "message": "Unknown Channel", "code": 10003 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    match client(&server).get("/channels/1").await.unwrap_err() {
        DispatchError::Operation(RestError::Http { status, body }) => {
            assert_eq!(status, 404);
            assert!(body.contains("Unknown Channel"));
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

// ============================================================================
// Rate limits
// ============================================================================

#[tokio::test]
async fn test_429_is_retried_transparently() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/api/v10/channels/{CHANNEL_ID}/messages")))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({ "message": "You are being rate limited.", "retry_after": 0.05, "global": false })),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/api/v10/channels/{CHANNEL_ID}/messages")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "1", "content": "hi" })))
        .expect(1)
        .mount(&server)
        .await;

    let started = Instant::now();
    let value = client(&server)
        .post(&format!("/channels/{CHANNEL_ID}/messages"), json!({ "content": "hi" }))
        .await
        .unwrap();

    assert_eq!(value["content"], "hi");
    assert!(started.elapsed() >= Duration::from_millis(50));
}

#[tokio::test]
async fn test_global_429_pauses_other_buckets() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v10/users/@me"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("x-ratelimit-global", "true")
                .insert_header("retry-after", "1")
                .set_body_json(json!({ "retry_after": 0.2, "global": true })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client(&server);
    let started = Instant::now();
    let (throttled, other) = tokio::join!(
        async {
            client.get("/users/@me").await.unwrap();
            started.elapsed()
        },
        async {
            // Issued after the global 429 has been seen
            tokio::time::sleep(Duration::from_millis(50)).await;
            client.get("/gateway").await.unwrap();
            started.elapsed()
        },
    );

    // Body value wins over the header
    assert!(throttled >= Duration::from_millis(200));
    assert!(throttled < Duration::from_secs(1));
    assert!(other >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_bucket_hash_is_learned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v10/channels/{CHANNEL_ID}/messages")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ratelimit-bucket", "abcd1234")
                .insert_header("x-ratelimit-limit", "5")
                .insert_header("x-ratelimit-remaining", "4")
                .insert_header("x-ratelimit-reset-after", "1.0")
                .set_body_json(json!([])),
        )
        .mount(&server)
        .await;

    let client = client(&server);
    let route = Route::get(format!("/channels/{CHANNEL_ID}/messages"));
    assert_eq!(
        client.dispatcher().bucket_key(&route),
        format!("GET /channels/:id/messages:{CHANNEL_ID}")
    );

    client
        .get(&format!("/channels/{CHANNEL_ID}/messages"))
        .await
        .unwrap();

    let learned = format!("abcd1234:{CHANNEL_ID}");
    assert_eq!(client.dispatcher().bucket_key(&route), learned);
    assert_eq!(
        client.dispatcher().registry().hash_for("GET /channels/:id/messages").as_deref(),
        Some("abcd1234")
    );

    // Later calls run in the server's bucket and adopt its quota
    client
        .get(&format!("/channels/{CHANNEL_ID}/messages?limit=10"))
        .await
        .unwrap();
    assert_eq!(client.dispatcher().remaining(&learned), Some(4));
}

#[tokio::test]
async fn test_throttled_first_call_learns_bucket() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v10/channels/{CHANNEL_ID}/pins")))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("x-ratelimit-bucket", "pins5678")
                .insert_header("x-ratelimit-limit", "1")
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset-after", "0.05")
                .set_body_json(json!({ "retry_after": 0.05, "global": false })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v10/channels/{CHANNEL_ID}/pins")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .get(&format!("/channels/{CHANNEL_ID}/pins"))
        .await
        .unwrap();

    let route = Route::get(format!("/channels/{CHANNEL_ID}/pins"));
    assert_eq!(
        client.dispatcher().bucket_key(&route),
        format!("pins5678:{CHANNEL_ID}")
    );
}

#[tokio::test]
async fn test_out_of_range_server_delays_are_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v10/users/@me"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0.05")
                .insert_header("x-ratelimit-reset-after", "1e20")
                .set_body_json(json!({ "retry_after": 1e300, "global": false })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v10/users/@me"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ratelimit-reset-after", "1e20")
                .set_body_json(json!({ "id": "1" })),
        )
        .mount(&server)
        .await;

    let client = client(&server);
    let started = Instant::now();
    let value = tokio::time::timeout(Duration::from_secs(5), client.get("/users/@me"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(value["id"], "1");
    // Falls back to the Retry-After header
    assert!(started.elapsed() >= Duration::from_millis(50));

    // The bucket still serves requests afterwards
    let again = tokio::time::timeout(Duration::from_secs(5), client.get("/users/@me")).await;
    assert_eq!(again.unwrap().unwrap()["id"], "1");
}

#[tokio::test]
async fn test_shutdown_rejects_new_requests() {
    let server = MockServer::start().await;
    let client = client(&server);

    client.dispatcher().shutdown();
    let err = client.get("/gateway").await.unwrap_err();
    assert!(matches!(err, DispatchError::Shutdown));
}
