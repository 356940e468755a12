//! Gateway client integration tests
//!
//! Each test drives a real client against a scripted local gateway.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::time::Duration;

use echord_core::{GatewayIntents, Message, Snowflake};
use echord_gateway::{
    Activity, CloseCode, ConnectionState, GatewayClient, GatewayConfig, GatewayError,
    GatewayEvent, GatewayEventType, GatewayHandle, PresenceUpdatePayload,
    RequestGuildMembersPayload, Status,
};
use integration_tests::{
    dispatch, heartbeat_ack, hello, init_test_tracing, invalid_session, message_create, next_event, ready,
    reconnect, resumed, wait_for_end, wait_for_event, MockConnection, MockGateway,
    TEST_SESSION_ID, TEST_TOKEN,
};
use tokio::sync::mpsc::UnboundedReceiver;

/// Long enough that no periodic heartbeat interferes with a test
const QUIET_INTERVAL: u64 = 45_000;

fn config(gateway: &MockGateway) -> GatewayConfig {
    init_test_tracing();
    GatewayConfig::new(
        TEST_TOKEN,
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES,
    )
    .with_url(gateway.url())
    .with_compress(false)
    .with_reconnect_delays(
        Duration::from_millis(10),
        Duration::from_millis(200),
        Duration::from_millis(10),
    )
}

/// Identify, Hello, first heartbeat, READY; returns once the client reports READY
async fn establish(
    gateway: &MockGateway,
    conn: &mut MockConnection,
    events: &mut UnboundedReceiver<GatewayEvent>,
) {
    conn.recv_op(2).await.unwrap();
    conn.send(hello(QUIET_INTERVAL)).await.unwrap();
    conn.recv_op(1).await.unwrap();
    conn.send(heartbeat_ack()).await.unwrap();
    conn.send(ready(1, &gateway.url())).await.unwrap();

    wait_for_event(events, |e| matches!(e, GatewayEvent::Ready(_)))
        .await
        .unwrap();
}

async fn connected_client(
    gateway: &MockGateway,
) -> (GatewayHandle, UnboundedReceiver<GatewayEvent>, MockConnection) {
    let (handle, mut events) = GatewayClient::connect(config(gateway));
    let mut conn = gateway.accept().await.unwrap();
    establish(gateway, &mut conn, &mut events).await;
    (handle, events, conn)
}

fn close_code(event: &GatewayEvent) -> Option<u16> {
    match event {
        GatewayEvent::Close(close) => Some(close.code),
        _ => None,
    }
}

// ============================================================================
// Identify
// ============================================================================

#[tokio::test]
async fn test_identify_then_dispatch() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, mut events) = GatewayClient::connect(config(&gateway));
    let mut conn = gateway.accept().await.unwrap();

    assert_eq!(conn.request_uri(), "/?v=10&encoding=json");

    // Identify goes out as soon as the socket opens
    let identify = conn.recv().await.unwrap();
    assert_eq!(identify["op"], 2);
    assert_eq!(identify["d"]["token"], TEST_TOKEN);
    assert_eq!(identify["d"]["intents"], 513);
    assert_eq!(identify["d"]["properties"]["browser"], "echord");

    conn.send(hello(QUIET_INTERVAL)).await.unwrap();
    let heartbeat = conn.recv().await.unwrap();
    assert_eq!(heartbeat["op"], 1);
    assert!(heartbeat["d"].is_null());
    conn.send(heartbeat_ack()).await.unwrap();

    conn.send(ready(1, &gateway.url())).await.unwrap();
    let GatewayEvent::Ready(ready_event) = next_event(&mut events).await.unwrap() else {
        panic!("expected READY first");
    };
    assert_eq!(ready_event.session_id, TEST_SESSION_ID);
    assert_eq!(ready_event.resume_url.as_deref(), Some(gateway.url().as_str()));
    assert_eq!(handle.status(), ConnectionState::Connected);

    conn.send(message_create(2, "hello there")).await.unwrap();
    let GatewayEvent::Dispatch(event) = next_event(&mut events).await.unwrap() else {
        panic!("expected MESSAGE_CREATE");
    };
    assert_eq!(event.kind, Some(GatewayEventType::MessageCreate));
    assert_eq!(event.sequence, Some(2));
    let message: Message = event.decode().unwrap();
    assert_eq!(message.content, "hello there");
    assert_eq!(message.author.username, "nelly");

    handle.destroy().await;
}

#[tokio::test]
async fn test_unknown_dispatch_is_forwarded() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, mut events, mut conn) = connected_client(&gateway).await;

    conn.send(dispatch("SOMETHING_NEW", 2, serde_json::json!({ "x": 1 })))
        .await
        .unwrap();

    let GatewayEvent::Dispatch(event) = next_event(&mut events).await.unwrap() else {
        panic!("expected dispatch");
    };
    assert_eq!(event.name, "SOMETHING_NEW");
    assert!(event.kind.is_none());
    assert_eq!(event.data["x"], 1);

    handle.destroy().await;
}

#[tokio::test]
async fn test_undecodable_frame_is_reported_and_skipped() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, mut events, mut conn) = connected_client(&gateway).await;

    // READY without a session id
    conn.send(serde_json::json!({ "op": 0, "t": "READY", "s": 2, "d": {} }))
        .await
        .unwrap();
    let event = next_event(&mut events).await.unwrap();
    assert!(matches!(event, GatewayEvent::Error(GatewayError::Decode(_))));

    // The connection is still usable
    conn.send(message_create(3, "still here")).await.unwrap();
    let event = next_event(&mut events).await.unwrap();
    assert!(matches!(event, GatewayEvent::Dispatch(ref d) if d.sequence == Some(3)));
    assert_eq!(handle.status(), ConnectionState::Connected);

    handle.destroy().await;
}

// ============================================================================
// Heartbeat
// ============================================================================

#[tokio::test]
async fn test_heartbeat_carries_last_sequence() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, mut events) = GatewayClient::connect(config(&gateway));
    let mut conn = gateway.accept().await.unwrap();

    conn.recv_op(2).await.unwrap();
    conn.send(hello(100)).await.unwrap();
    conn.recv_op(1).await.unwrap();
    conn.send(heartbeat_ack()).await.unwrap();
    conn.send(ready(1, &gateway.url())).await.unwrap();
    conn.send(message_create(2, "tick")).await.unwrap();
    wait_for_event(&mut events, |e| matches!(e, GatewayEvent::Dispatch(_)))
        .await
        .unwrap();

    // Periodic heartbeats keep flowing while acknowledged
    let mut beats = 0;
    loop {
        let heartbeat = conn.recv_op(1).await.unwrap();
        conn.send(heartbeat_ack()).await.unwrap();
        beats += 1;
        if heartbeat["d"] == 2 {
            break;
        }
        assert!(beats < 10, "heartbeat never caught up with sequence 2");
    }
    assert_eq!(handle.status(), ConnectionState::Connected);

    handle.destroy().await;
}

#[tokio::test]
async fn test_server_heartbeat_request_is_answered() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, _events, mut conn) = connected_client(&gateway).await;

    conn.send(serde_json::json!({ "op": 1, "d": null })).await.unwrap();
    let heartbeat = conn.recv_op(1).await.unwrap();
    assert_eq!(heartbeat["d"], 1);

    handle.destroy().await;
}

#[tokio::test]
async fn test_missed_ack_reconnects_and_resumes() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, mut events) = GatewayClient::connect(config(&gateway));
    let mut conn = gateway.accept().await.unwrap();

    conn.recv_op(2).await.unwrap();
    conn.send(hello(100)).await.unwrap();
    // First heartbeat is never acknowledged
    conn.recv_op(1).await.unwrap();
    conn.send(ready(1, &gateway.url())).await.unwrap();

    assert_eq!(conn.recv_close().await.unwrap(), Some(4000));
    let event = wait_for_event(&mut events, |e| close_code(e).is_some())
        .await
        .unwrap();
    let GatewayEvent::Close(close) = event else {
        unreachable!()
    };
    assert_eq!(close.reason, "heartbeat not acknowledged");

    let mut conn = gateway.accept().await.unwrap();
    let resume = conn.recv().await.unwrap();
    assert_eq!(resume["op"], 6);
    assert_eq!(resume["d"]["session_id"], TEST_SESSION_ID);
    assert_eq!(resume["d"]["seq"], 1);

    handle.destroy().await;
}

// ============================================================================
// Resume
// ============================================================================

#[tokio::test]
async fn test_resume_after_server_close() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, mut events, mut conn) = connected_client(&gateway).await;

    conn.send(message_create(2, "before the drop")).await.unwrap();
    wait_for_event(&mut events, |e| matches!(e, GatewayEvent::Dispatch(_)))
        .await
        .unwrap();

    conn.close(4000, "unknown error").await.unwrap();
    let event = next_event(&mut events).await.unwrap();
    assert_eq!(close_code(&event), Some(4000));

    let mut conn = gateway.accept().await.unwrap();
    assert!(conn.request_uri().starts_with("/?v=10&encoding=json"));
    let resume = conn.recv().await.unwrap();
    assert_eq!(resume["op"], 6);
    assert_eq!(resume["d"]["token"], TEST_TOKEN);
    assert_eq!(resume["d"]["session_id"], TEST_SESSION_ID);
    assert_eq!(resume["d"]["seq"], 2);

    conn.send(hello(QUIET_INTERVAL)).await.unwrap();
    // Replayed dispatch, then RESUMED
    conn.send(message_create(3, "missed")).await.unwrap();
    conn.send(resumed(4)).await.unwrap();

    let event = next_event(&mut events).await.unwrap();
    assert!(matches!(event, GatewayEvent::Dispatch(ref d) if d.sequence == Some(3)));
    let event = next_event(&mut events).await.unwrap();
    assert!(matches!(event, GatewayEvent::Resumed));
    assert_eq!(handle.status(), ConnectionState::Connected);

    handle.destroy().await;
}

#[tokio::test]
async fn test_reconnect_request_resumes() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, mut events, mut conn) = connected_client(&gateway).await;

    conn.send(reconnect()).await.unwrap();
    assert_eq!(conn.recv_close().await.unwrap(), Some(4000));
    let event = next_event(&mut events).await.unwrap();
    assert_eq!(close_code(&event), Some(4000));

    let mut conn = gateway.accept().await.unwrap();
    let resume = conn.recv().await.unwrap();
    assert_eq!(resume["op"], 6);

    handle.destroy().await;
}

#[tokio::test]
async fn test_invalid_session_identifies_again() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, mut events, mut conn) = connected_client(&gateway).await;

    conn.send(invalid_session(false)).await.unwrap();
    assert_eq!(conn.recv_close().await.unwrap(), Some(4000));
    wait_for_event(&mut events, |e| close_code(e).is_some())
        .await
        .unwrap();

    let mut conn = gateway.accept().await.unwrap();
    let identify = conn.recv().await.unwrap();
    assert_eq!(identify["op"], 2);

    conn.send(hello(QUIET_INTERVAL)).await.unwrap();
    conn.send(ready(1, &gateway.url())).await.unwrap();
    wait_for_event(&mut events, |e| matches!(e, GatewayEvent::Ready(_)))
        .await
        .unwrap();

    handle.destroy().await;
}

#[tokio::test]
async fn test_resumable_invalid_session_resumes() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, _events, mut conn) = connected_client(&gateway).await;

    conn.send(invalid_session(true)).await.unwrap();
    assert_eq!(conn.recv_close().await.unwrap(), Some(4000));

    let mut conn = gateway.accept().await.unwrap();
    let resume = conn.recv().await.unwrap();
    assert_eq!(resume["op"], 6);
    assert_eq!(resume["d"]["session_id"], TEST_SESSION_ID);

    handle.destroy().await;
}

// ============================================================================
// Closing
// ============================================================================

#[tokio::test]
async fn test_fatal_close_code_stops_client() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, mut events, conn) = connected_client(&gateway).await;

    conn.close(4004, "Authentication failed").await.unwrap();

    let GatewayEvent::Close(close) = next_event(&mut events).await.unwrap() else {
        panic!("expected close event");
    };
    assert_eq!(close.close_code(), Some(CloseCode::AuthenticationFailed));

    let rest = wait_for_end(&mut events).await.unwrap();
    assert!(rest.is_empty(), "unexpected events: {rest:?}");
    assert_eq!(handle.status(), ConnectionState::Disconnected);

    // No reconnect attempt
    let retry = tokio::time::timeout(Duration::from_millis(300), gateway.accept()).await;
    assert!(!matches!(retry, Ok(Ok(_))));
}

#[tokio::test]
async fn test_destroy_closes_normally() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, mut events, mut conn) = connected_client(&gateway).await;

    handle.destroy().await;
    assert_eq!(handle.status(), ConnectionState::Destroyed);
    assert_eq!(conn.recv_close().await.unwrap(), Some(1000));

    let rest = wait_for_end(&mut events).await.unwrap();
    assert!(rest.iter().all(|e| close_code(e).is_none()));

    // Repeated destroy and late sends are harmless
    handle.destroy().await;
    assert!(matches!(
        handle.update_presence(&PresenceUpdatePayload::new(Status::Online)).await,
        Err(GatewayError::Destroyed)
    ));
}

#[tokio::test]
async fn test_dropping_every_handle_destroys() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, mut events, mut conn) = connected_client(&gateway).await;

    drop(handle);
    assert_eq!(conn.recv_close().await.unwrap(), Some(1000));
    wait_for_end(&mut events).await.unwrap();
}

#[tokio::test]
async fn test_connect_failure_is_retried() {
    let gateway = MockGateway::bind().await.unwrap();
    let url = gateway.url();
    drop(gateway);

    let config = GatewayConfig::new(TEST_TOKEN, GatewayIntents::GUILDS)
        .with_url(url)
        .with_reconnect_delays(
            Duration::from_millis(10),
            Duration::from_millis(50),
            Duration::from_millis(10),
        );
    let (handle, mut events) = GatewayClient::connect(config);

    for _ in 0..2 {
        let event = next_event(&mut events).await.unwrap();
        assert!(matches!(event, GatewayEvent::Error(GatewayError::WebSocket(_))));
    }

    handle.destroy().await;
    assert_eq!(handle.status(), ConnectionState::Destroyed);
    wait_for_end(&mut events).await.unwrap();
}

// ============================================================================
// Compression
// ============================================================================

#[tokio::test]
async fn test_zlib_stream_frames() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, mut events) = GatewayClient::connect(config(&gateway).with_compress(true));
    let mut conn = gateway.accept().await.unwrap();

    assert_eq!(
        conn.request_uri(),
        "/?v=10&encoding=json&compress=zlib-stream"
    );
    conn.enable_compression();

    conn.recv_op(2).await.unwrap();
    conn.send(hello(QUIET_INTERVAL)).await.unwrap();
    conn.recv_op(1).await.unwrap();
    conn.send(heartbeat_ack()).await.unwrap();
    conn.send(ready(1, &gateway.url())).await.unwrap();
    conn.send(message_create(2, "compressed")).await.unwrap();

    assert!(matches!(
        next_event(&mut events).await.unwrap(),
        GatewayEvent::Ready(_)
    ));
    let GatewayEvent::Dispatch(event) = next_event(&mut events).await.unwrap() else {
        panic!("expected dispatch");
    };
    assert_eq!(event.decode::<Message>().unwrap().content, "compressed");

    handle.destroy().await;
}

// ============================================================================
// Outbound commands
// ============================================================================

#[tokio::test]
async fn test_presence_update() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, _events, mut conn) = connected_client(&gateway).await;

    let presence = PresenceUpdatePayload::new(Status::Idle).with_activity(Activity::playing("chess"));
    handle.update_presence(&presence).await.unwrap();

    let frame = conn.recv_op(3).await.unwrap();
    assert_eq!(frame["d"]["status"], "idle");
    assert_eq!(frame["d"]["activities"][0]["name"], "chess");
    assert_eq!(frame["d"]["activities"][0]["type"], 0);
    assert_eq!(frame["d"]["afk"], false);

    handle.destroy().await;
}

#[tokio::test]
async fn test_request_guild_members() {
    let gateway = MockGateway::bind().await.unwrap();
    let (handle, _events, mut conn) = connected_client(&gateway).await;

    let request = RequestGuildMembersPayload::by_query(Snowflake::new(41_771_983_423_143_937), "ne", 10)
        .with_nonce("n1");
    handle.request_guild_members(&request).await.unwrap();

    let frame = conn.recv_op(8).await.unwrap();
    assert_eq!(frame["d"]["guild_id"], "41771983423143937");
    assert_eq!(frame["d"]["query"], "ne");
    assert_eq!(frame["d"]["limit"], 10);
    assert_eq!(frame["d"]["nonce"], "n1");

    handle.destroy().await;
}
