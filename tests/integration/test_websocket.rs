//! Integration tests for the session event stream.
//!
//! These tests validate the WebSocket server functionality including
//! connection handling, event broadcasting, and events triggered through
//! the HTTP API.

use std::net::TcpListener;
use std::time::Duration;

use futures::SinkExt;
use futures::StreamExt;
use singularity_engine::websocket::SessionEvent;
use singularity_engine::{
    create_router, spawn_clock, AppState, Catalog, Config, SaveRecord, Session,
};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tungstenite::Message;

/// Helper to find an available port for testing.
fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Helper type for WebSocket client
type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn fresh_state() -> AppState {
    let catalog = Catalog::shipped().expect("Shipped catalog is consistent");
    let session = Session::new(Config::default(), catalog).expect("Session starts");
    AppState::new(Config::default(), session)
}

fn state_at(level: u32) -> AppState {
    let catalog = Catalog::shipped().expect("Shipped catalog is consistent");
    let record = SaveRecord {
        current_level_id: level,
        max_reached_level: Some(level),
        assessment_complete: true,
        ..SaveRecord::default()
    };
    let session =
        Session::restore(Config::default(), catalog, record).expect("Session restores");
    AppState::new(Config::default(), session)
}

/// Spawns the test server and returns the WebSocket URL.
async fn spawn_test_server(state: AppState) -> (String, tokio::task::JoinHandle<()>) {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");
    let ws_url = format!("ws://{addr}/api/ws");

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (ws_url, handle)
}

/// Connects a WebSocket client to the given URL.
async fn connect_client(url: &str) -> WsClient {
    let (ws_stream, _) = connect_async(url)
        .await
        .expect("Failed to connect to WebSocket");
    ws_stream
}

/// Receives the next text message and parses it as a `SessionEvent`.
/// Automatically handles ping frames by responding with pong.
async fn receive_event(client: &mut WsClient) -> SessionEvent {
    loop {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timeout waiting for message")
            .expect("Stream ended")
            .expect("WebSocket error");

        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text).expect("Failed to parse event");
            }
            Message::Ping(data) => {
                client
                    .send(Message::Pong(data))
                    .await
                    .expect("Failed to send pong");
            }
            Message::Pong(_) => {}
            other => panic!("Expected text message, got: {other:?}"),
        }
    }
}

/// Receives events until one named `name` arrives.
async fn receive_until(client: &mut WsClient, name: &str) -> SessionEvent {
    loop {
        let event = receive_event(client).await;
        if event.event_name() == name {
            return event;
        }
    }
}

/// Converts the HTTP base URL from a WebSocket URL.
fn http_base(ws_url: &str) -> String {
    ws_url.replace("ws://", "http://").replace("/ws", "")
}

// ============================================================================
// Connection Tests
// ============================================================================

/// Tests that a WebSocket client receives a connected event on connection.
#[tokio::test]
async fn test_client_receives_connected_event_on_connect() {
    let (ws_url, _handle) = spawn_test_server(fresh_state()).await;

    let mut client = connect_client(&ws_url).await;
    let event = receive_event(&mut client).await;

    if let SessionEvent::Connected(payload) = event {
        assert_eq!(payload.state.current_level_id, 1);
        assert!(!payload.state.assessment_complete);
    } else {
        panic!("Expected Connected event, got: {event:?}");
    }
}

/// Tests that the connected event contains the restored state.
#[tokio::test]
async fn test_connected_event_contains_current_state() {
    let (ws_url, _handle) = spawn_test_server(state_at(12)).await;

    let mut client = connect_client(&ws_url).await;
    let event = receive_event(&mut client).await;

    if let SessionEvent::Connected(payload) = event {
        assert_eq!(payload.state.current_level_id, 12);
        assert_eq!(payload.state.max_reached_level, 12);
        assert!(payload
            .state
            .unlocked_achievements
            .iter()
            .any(|id| id == "hacker"));
    } else {
        panic!("Expected Connected event, got: {event:?}");
    }
}

// ============================================================================
// Event Broadcast Tests
// ============================================================================

/// Tests that events are broadcast to all connected clients.
#[tokio::test]
async fn test_events_broadcast_to_all_clients() {
    let state = fresh_state();
    let broadcaster = state.broadcaster.clone();
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut client1 = connect_client(&ws_url).await;
    let mut client2 = connect_client(&ws_url).await;

    receive_event(&mut client1).await;
    receive_event(&mut client2).await;

    broadcaster.send(SessionEvent::level_changed(4, 6));

    let event1 = receive_event(&mut client1).await;
    let event2 = receive_event(&mut client2).await;

    assert_eq!(event1, SessionEvent::level_changed(4, 6));
    assert_eq!(event2, SessionEvent::level_changed(4, 6));
}

/// Tests that opening a panel over HTTP streams the achievement.
#[tokio::test]
async fn test_api_triggers_websocket_events() {
    let (ws_url, _handle) = spawn_test_server(fresh_state()).await;

    let mut client = connect_client(&ws_url).await;
    receive_event(&mut client).await;

    let response = reqwest::Client::new()
        .post(format!("{}/panel", http_base(&ws_url)))
        .json(&serde_json::json!({"panel": "vault"}))
        .send()
        .await
        .expect("Failed to send HTTP request");
    assert!(response.status().is_success());

    let event = receive_until(&mut client, "achievement_unlocked").await;
    if let SessionEvent::AchievementUnlocked(payload) = event {
        assert_eq!(payload.id, "curious_mind");
        assert_eq!(payload.title, "Curious Mind");
    } else {
        panic!("Expected AchievementUnlocked event, got: {event:?}");
    }
}

/// Tests that a run's verdict arrives on the stream once the clock fires it.
#[tokio::test]
async fn test_run_verdict_streams_after_delay() {
    let state = state_at(2);
    let _clock = spawn_clock(state.clone());
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut client = connect_client(&ws_url).await;
    receive_event(&mut client).await;

    let http = reqwest::Client::new();
    let base = http_base(&ws_url);
    let response = http
        .post(format!("{base}/code"))
        .json(&serde_json::json!({"code": "# nothing yet"}))
        .send()
        .await
        .expect("Failed to send HTTP request");
    assert_eq!(response.status(), 204);

    let response = http
        .post(format!("{base}/run"))
        .send()
        .await
        .expect("Failed to send HTTP request");
    assert_eq!(response.status(), 202);

    let event = receive_until(&mut client, "verdict").await;
    if let SessionEvent::Verdict(payload) = event {
        assert_eq!(payload.level_id, 2);
        assert!(!payload.verdict.success);
    } else {
        panic!("Expected Verdict event, got: {event:?}");
    }
}

// ============================================================================
// Disconnection Tests
// ============================================================================

/// Tests that client can cleanly disconnect.
#[tokio::test]
async fn test_client_can_disconnect() {
    let (ws_url, _handle) = spawn_test_server(fresh_state()).await;

    let mut client = connect_client(&ws_url).await;
    receive_event(&mut client).await;

    client
        .close(None)
        .await
        .expect("Failed to close connection");
}

/// Tests that server continues after client disconnects.
#[tokio::test]
async fn test_server_continues_after_client_disconnect() {
    let state = fresh_state();
    let broadcaster = state.broadcaster.clone();
    let (ws_url, _handle) = spawn_test_server(state).await;

    let mut client1 = connect_client(&ws_url).await;
    receive_event(&mut client1).await;
    client1.close(None).await.ok();
    drop(client1);

    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut client2 = connect_client(&ws_url).await;
    let event = receive_event(&mut client2).await;
    assert!(matches!(event, SessionEvent::Connected(_)));

    broadcaster.send(SessionEvent::hint_tier_changed(3));
    let event = receive_event(&mut client2).await;
    assert_eq!(event, SessionEvent::hint_tier_changed(3));
}
