//! Session events and their WebSocket stream.
//!
//! Every state change a client must render is queued by the [`Session`]
//! as a [`SessionEvent`], drained by the API layer and broadcast to all
//! connected clients.
//!
//! # Event Types
//!
//! - `connected` - Sent when a client connects, includes a state snapshot
//! - `log` - A console line was appended
//! - `phase_changed` - The scripted tutorial phase moved
//! - `level_changed` - A new level is on screen
//! - `verdict` - A run finished
//! - `hint_tier_changed` - The visible hint tier changed
//! - `achievement_unlocked` - An achievement was earned
//! - `xp_awarded` - XP was credited for a completion
//! - `code_changed` - The editor contents were replaced by the system
//! - `story_changed` - The story overlay opened, advanced or closed
//!
//! # Example
//!
//! ```no_run
//! use singularity_engine::websocket::{EventBroadcaster, SessionEvent};
//!
//! # async fn example() {
//! let broadcaster = EventBroadcaster::new(100);
//! let mut receiver = broadcaster.subscribe();
//!
//! broadcaster.send(SessionEvent::level_changed(2, 2));
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {}", event.event_name());
//! }
//! # }
//! ```
//!
//! [`Session`]: crate::Session

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::session::{GameState, LogEntry, StoryOverlay};
use crate::tutorial::TutorialPhase;
use crate::verdict::Verdict;

// ============================================================================
// Event Payloads
// ============================================================================

/// Payload for the `connected` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedPayload {
    /// The session state at connect time.
    pub state: GameState,
}

/// Payload for the `phase_changed` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChangedPayload {
    /// The new phase.
    pub phase: TutorialPhase,
}

/// Payload for the `level_changed` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelChangedPayload {
    /// Level now on screen.
    pub level_id: u32,
    /// Highest unlocked level.
    pub max_reached_level: u32,
}

/// Payload for the `verdict` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictPayload {
    /// Level the run was validated against.
    pub level_id: u32,
    /// The result.
    pub verdict: Verdict,
}

/// Payload for the `hint_tier_changed` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintTierChangedPayload {
    /// Visible tier, 0 when hidden.
    pub tier: u8,
}

/// Payload for the `achievement_unlocked` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementUnlockedPayload {
    /// Achievement id.
    pub id: String,
    /// Display title.
    pub title: String,
}

/// Payload for the `xp_awarded` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpAwardedPayload {
    /// XP credited by this completion.
    pub amount: u32,
    /// XP total afterwards.
    pub total: u32,
}

/// Payload for the `code_changed` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChangedPayload {
    /// New editor contents.
    pub code: String,
}

/// Payload for the `story_changed` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryChangedPayload {
    /// The open overlay, or `None` once closed.
    pub story: Option<StoryOverlay>,
}

// ============================================================================
// Event Enum
// ============================================================================

/// Events streamed to clients.
///
/// All events are serialized as JSON objects with "event" and "payload" fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Sent when a client connects.
    Connected(ConnectedPayload),
    /// A console line was appended.
    Log(LogEntry),
    /// The tutorial phase changed.
    PhaseChanged(PhaseChangedPayload),
    /// A new level is on screen.
    LevelChanged(LevelChangedPayload),
    /// A run finished.
    Verdict(VerdictPayload),
    /// The visible hint tier changed.
    HintTierChanged(HintTierChangedPayload),
    /// An achievement was earned.
    AchievementUnlocked(AchievementUnlockedPayload),
    /// XP was credited.
    XpAwarded(XpAwardedPayload),
    /// The editor contents were replaced.
    CodeChanged(CodeChangedPayload),
    /// The story overlay changed.
    StoryChanged(StoryChangedPayload),
}

impl SessionEvent {
    /// Creates a `Connected` event with a state snapshot.
    #[must_use]
    pub const fn connected(state: GameState) -> Self {
        Self::Connected(ConnectedPayload { state })
    }

    /// Creates a `Log` event.
    #[must_use]
    pub const fn log(entry: LogEntry) -> Self {
        Self::Log(entry)
    }

    /// Creates a `PhaseChanged` event.
    #[must_use]
    pub const fn phase_changed(phase: TutorialPhase) -> Self {
        Self::PhaseChanged(PhaseChangedPayload { phase })
    }

    /// Creates a `LevelChanged` event.
    #[must_use]
    pub const fn level_changed(level_id: u32, max_reached_level: u32) -> Self {
        Self::LevelChanged(LevelChangedPayload {
            level_id,
            max_reached_level,
        })
    }

    /// Creates a `Verdict` event.
    #[must_use]
    pub const fn verdict(level_id: u32, verdict: Verdict) -> Self {
        Self::Verdict(VerdictPayload { level_id, verdict })
    }

    /// Creates a `HintTierChanged` event.
    #[must_use]
    pub const fn hint_tier_changed(tier: u8) -> Self {
        Self::HintTierChanged(HintTierChangedPayload { tier })
    }

    /// Creates an `AchievementUnlocked` event.
    #[must_use]
    pub fn achievement_unlocked(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::AchievementUnlocked(AchievementUnlockedPayload {
            id: id.into(),
            title: title.into(),
        })
    }

    /// Creates an `XpAwarded` event.
    #[must_use]
    pub const fn xp_awarded(amount: u32, total: u32) -> Self {
        Self::XpAwarded(XpAwardedPayload { amount, total })
    }

    /// Creates a `CodeChanged` event.
    #[must_use]
    pub const fn code_changed(code: String) -> Self {
        Self::CodeChanged(CodeChangedPayload { code })
    }

    /// Creates a `StoryChanged` event.
    #[must_use]
    pub const fn story_changed(story: Option<StoryOverlay>) -> Self {
        Self::StoryChanged(StoryChangedPayload { story })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::Log(_) => "log",
            Self::PhaseChanged(_) => "phase_changed",
            Self::LevelChanged(_) => "level_changed",
            Self::Verdict(_) => "verdict",
            Self::HintTierChanged(_) => "hint_tier_changed",
            Self::AchievementUnlocked(_) => "achievement_unlocked",
            Self::XpAwarded(_) => "xp_awarded",
            Self::CodeChanged(_) => "code_changed",
            Self::StoryChanged(_) => "story_changed",
        }
    }
}

// ============================================================================
// Event Broadcaster
// ============================================================================

/// Broadcasts session events to all connected WebSocket clients.
///
/// Events are not replayed for clients that connect later; they start from
/// the `connected` snapshot instead.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBroadcaster {
    /// Creates a broadcaster buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new subscriber.
    ///
    /// A subscriber that falls more than `capacity` events behind receives a
    /// `Lagged` error and misses the overwritten events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts an event. Returns the number of receivers reached.
    pub fn send(&self, event: SessionEvent) -> usize {
        // send() returns Err only if there are no receivers, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Broadcasts each event in order. Returns the number sent.
    pub fn send_all(&self, events: impl IntoIterator<Item = SessionEvent>) -> usize {
        events.into_iter().map(|event| self.send(event)).count()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

// ============================================================================
// WebSocket Handler
// ============================================================================

/// Interval between heartbeat pings.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Maximum number of missed pong responses before disconnecting.
const MAX_MISSED_PONGS: u8 = 3;

/// WebSocket upgrade handler for `GET /api/ws`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("New WebSocket connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handles a single WebSocket connection.
///
/// - Subscribes, then sends `connected` with a snapshot, so no event
///   between the two is lost
/// - Forwards all broadcast events to the client
/// - Sends heartbeat pings every 30 seconds
/// - Closes the connection after 3 missed pongs
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut event_receiver = state.broadcaster.subscribe();
    let snapshot = state.session.lock().await.snapshot();

    let connected_json = match serde_json::to_string(&SessionEvent::connected(snapshot)) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize connected event: {}", e);
            return;
        }
    };

    if sender.send(Message::Text(connected_json)).await.is_err() {
        debug!("Client disconnected before receiving connected event");
        return;
    }

    info!("WebSocket client connected, sent initial state");

    let mut heartbeat_interval = interval(HEARTBEAT_INTERVAL);
    let mut missed_pongs = 0u8;

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Pong(_))) => {
                        missed_pongs = 0;
                        debug!("Received pong from client");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client requested close");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            debug!("Failed to send pong, client disconnected");
                            break;
                        }
                    }
                    Some(Ok(Message::Text(_) | Message::Binary(_))) => {
                        // commands go through the HTTP API
                        debug!("Ignoring data message from client");
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }

            event = event_receiver.recv() => {
                match event {
                    Ok(session_event) => {
                        let json = match serde_json::to_string(&session_event) {
                            Ok(j) => j,
                            Err(e) => {
                                warn!("Failed to serialize event: {}", e);
                                continue;
                            }
                        };

                        if sender.send(Message::Text(json)).await.is_err() {
                            debug!("Failed to send event, client disconnected");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Client lagged, missed {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Broadcaster closed");
                        break;
                    }
                }
            }

            _ = heartbeat_interval.tick() => {
                if sender.send(Message::Ping(vec![])).await.is_err() {
                    debug!("Failed to send ping, client disconnected");
                    break;
                }
                missed_pongs += 1;
                if missed_pongs >= MAX_MISSED_PONGS {
                    info!("Client missed {} pongs, closing connection", MAX_MISSED_PONGS);
                    break;
                }
            }
        }
    }

    info!("WebSocket client disconnected");
}

// ============================================================================
// Tests
// ============================================================================
