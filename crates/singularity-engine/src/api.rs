//! HTTP API for driving a tutorial session.
//!
//! The browser client renders [`GameState`] and forwards learner actions
//! here. Every handler locks the one [`Session`], applies a single
//! operation, and broadcasts the events it queued to `/api/ws`.
//!
//! # Endpoints
//!
//! - `GET /api/state` - Full state snapshot
//! - `POST /api/code` - Replace the editor contents
//! - `POST /api/run` - Start a run (verdict arrives on the event stream)
//! - `POST /api/level/select` - Jump to an unlocked level
//! - `POST /api/hint` - Show a hint tier, or the next one
//! - `POST /api/hint/dismiss` - Hide the hint panel
//! - `POST /api/solution` - Load the solution into the editor
//! - `GET /api/assessment` - Placement questions
//! - `POST /api/assessment` - Submit answers or pick a tier directly
//! - `POST /api/skill` - Change skill tier
//! - `POST /api/story/next` - Advance the story overlay
//! - `POST /api/panel` - Record that the vault or chat was opened
//! - `POST /api/reset-code` - Reload the seed template
//! - `POST /api/auth/sign-in` - Attach a learner and sync the remote mirror
//! - `POST /api/auth/sign-out` - Detach the learner
//! - `POST /api/reset` - Wipe all progress
//! - `GET /api/levels` - Level list with lock state
//! - `GET /api/levels/:id/hints/:tier` - One hint text
//! - `GET /api/vault` - Unlocked vault entries
//! - `GET /api/achievements` - Achievement list with unlock state
//! - `GET /api/ws` - Event stream
//!
//! # Example
//!
//! ```no_run
//! use singularity_engine::{create_router, spawn_clock, AppState, Config};
//!
//! # async fn example() -> singularity_engine::Result<()> {
//! let state = AppState::load(Config::default()).await?;
//! let _clock = spawn_clock(state.clone());
//!
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::achievements::ACHIEVEMENTS;
use crate::assessment::{self, AssessmentAnswer, AssessmentQuestion, QUESTIONS};
use crate::catalog::Catalog;
use crate::config::{Config, SkillLevel};
use crate::error::{Result, SingularityError};
use crate::persistence::{self, DirectoryRemoteStore, LocalStore, RemoteStore, SyncOutcome};
use crate::session::{GameState, MessageType, Panel, Session, StoryOverlay, UserProfile};
use crate::vault::{self, VaultEntry};
use crate::websocket::{ws_handler, EventBroadcaster};

/// Logged when the save on disk could not be read at boot.
pub const SAVE_CORRUPTED_MESSAGE: &str = "SAVE DATA CORRUPTED. STARTING FRESH.";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for `POST /api/code`.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeRequest {
    /// New editor contents.
    pub code: String,
}

/// Response body for `POST /api/run`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    /// Always `true`; rejected runs return an error instead.
    pub accepted: bool,
    /// Milliseconds until the verdict event.
    pub verdict_in_ms: u64,
}

/// Request body for `POST /api/level/select`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectLevelRequest {
    /// Target level.
    pub level_id: u32,
}

/// Response body for `POST /api/level/select`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectLevelResponse {
    /// `false` if the level was already on screen.
    pub changed: bool,
    /// Level now on screen.
    pub level_id: u32,
}

/// Request body for `POST /api/hint`.
///
/// Without a tier the next tier up is shown.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HintRequest {
    /// Tier between 1 and 4.
    #[serde(default)]
    pub tier: Option<u8>,
}

/// A hint text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintResponse {
    /// Level the hint belongs to.
    pub level_id: u32,
    /// Tier between 1 and 4.
    pub tier: u8,
    /// Hint text.
    pub text: String,
}

/// Response body for `POST /api/solution`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionResponse {
    /// Code loaded into the editor.
    pub code: String,
    /// Auto-solves used on this level so far.
    pub hints_used: u32,
}

/// Request body for `POST /api/assessment`.
///
/// `skillLevel` skips the quiz and picks a tier directly; otherwise `answers`
/// are scored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    /// Quiz answers.
    #[serde(default)]
    pub answers: Vec<AssessmentAnswer>,
    /// Tier chosen without taking the quiz.
    #[serde(default)]
    pub skill_level: Option<SkillLevel>,
}

/// Response body for `POST /api/assessment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    /// Correct answers, absent when the quiz was skipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<usize>,
    /// Resulting tier.
    pub skill_level: SkillLevel,
}

/// Request body for `POST /api/skill`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequest {
    /// New tier.
    pub skill_level: SkillLevel,
}

/// Response body for `POST /api/story/next`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
    /// The overlay after advancing, `None` once closed.
    pub story: Option<StoryOverlay>,
    /// Level on screen afterwards.
    pub current_level_id: u32,
}

/// Request body for `POST /api/panel`.
#[derive(Debug, Clone, Deserialize)]
pub struct PanelRequest {
    /// Panel opened.
    pub panel: Panel,
}

/// Response body for `POST /api/reset-code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetCodeResponse {
    /// `false` while the demonstration owns the editor.
    pub reset: bool,
}

/// Response body for `POST /api/auth/sign-in`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    /// The signed-in learner.
    pub user: UserProfile,
    /// What the remote sync did, absent without a remote mirror.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncOutcome>,
}

/// Request body for `POST /api/reset`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetRequest {
    /// Must be `true`.
    #[serde(default)]
    pub confirm: bool,
}

/// One row of `GET /api/levels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSummary {
    /// Level id.
    pub id: u32,
    /// Display title.
    pub title: String,
    /// Location line.
    pub sub_title: String,
    /// What the submission must do.
    pub objective: String,
    /// Exam topic.
    pub topic: String,
    /// Whether the learner may select it.
    pub unlocked: bool,
}

/// One row of `GET /api/achievements`.
///
/// Hidden achievements keep their description secret until unlocked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStatus {
    /// Achievement id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Unlock condition, or `???` for a locked hidden achievement.
    pub description: String,
    /// Display glyph.
    pub icon: String,
    /// Whether the learner has it.
    pub unlocked: bool,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server and the clock.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Session configuration.
    pub config: Config,
    /// The learner's session.
    pub session: Arc<Mutex<Session>>,
    /// Fan-out for session events.
    pub broadcaster: EventBroadcaster,
    /// Local save file, if persistence is enabled.
    pub local: Option<LocalStore>,
    /// Remote mirror, if configured.
    pub remote: Option<Arc<dyn RemoteStore>>,
}

impl AppState {
    /// Wraps a session without any persistence.
    #[must_use]
    pub fn new(config: Config, session: Session) -> Self {
        Self {
            config,
            session: Arc::new(Mutex::new(session)),
            broadcaster: EventBroadcaster::default(),
            local: None,
            remote: None,
        }
    }

    /// Adds a local save file.
    #[must_use]
    pub fn with_local_store(mut self, local: LocalStore) -> Self {
        self.local = Some(local);
        self
    }

    /// Adds a remote mirror.
    #[must_use]
    pub fn with_remote_store(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Boots from configuration: restores the local save if there is one
    /// and attaches the remote mirror if `remoteDir` is set.
    ///
    /// An unreadable save is logged and play starts from defaults.
    pub async fn load(config: Config) -> Result<Self> {
        let catalog = Catalog::shipped()?;
        let local = LocalStore::new(&config.save_file);

        let session = match local.load().await {
            Ok(Some(record)) => Session::restore(config.clone(), catalog, record)?,
            Ok(None) => Session::new(config.clone(), catalog)?,
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "Ignoring unreadable save");
                let mut session = Session::new(config.clone(), catalog)?;
                session.log(MessageType::Error, SAVE_CORRUPTED_MESSAGE);
                session
            }
            Err(e) => return Err(e),
        };

        let remote_dir = config.remote_dir.clone();
        let mut state = Self::new(config, session).with_local_store(local);
        if let Some(dir) = remote_dir {
            info!(dir = %dir, "Remote mirror enabled");
            state = state.with_remote_store(Arc::new(DirectoryRemoteStore::new(dir)));
        }
        Ok(state)
    }

    /// Applies one operation to the session and broadcasts what it queued.
    ///
    /// Events are broadcast even when the operation fails, since a rejected
    /// operation may still have logged.
    pub async fn apply<T>(&self, op: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
        let mut session = self.session.lock().await;
        let outcome = op(&mut session);
        self.broadcaster.send_all(session.drain_events());
        outcome
    }

    /// Broadcasts any events queued outside [`AppState::apply`].
    pub async fn flush(&self) -> usize {
        let events = self.session.lock().await.drain_events();
        self.broadcaster.send_all(events)
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// The request was well-formed JSON but not acceptable.
    BadRequest(String),
    /// The session rejected the operation.
    Session(SingularityError),
}

impl From<SingularityError> for ApiError {
    fn from(err: SingularityError) -> Self {
        Self::Session(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Session(err) => {
                let status = match &err {
                    SingularityError::UnknownLevel { .. } => StatusCode::NOT_FOUND,
                    SingularityError::LevelLocked { .. } => StatusCode::FORBIDDEN,
                    SingularityError::InvalidHintTier { .. } => StatusCode::BAD_REQUEST,
                    SingularityError::RunInProgress
                    | SingularityError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    warn!(error = %err, "Request failed");
                }
                (status, err.to_string())
            }
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints.
///
/// All routes live under `/api`, wrapped in permissive CORS for the
/// browser client and tracing middleware for request logging.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/state", get(handle_state))
        .route("/code", post(handle_code))
        .route("/run", post(handle_run))
        .route("/level/select", post(handle_select_level))
        .route("/hint", post(handle_hint))
        .route("/hint/dismiss", post(handle_dismiss_hint))
        .route("/solution", post(handle_solution))
        .route(
            "/assessment",
            get(handle_assessment_questions).post(handle_assessment),
        )
        .route("/skill", post(handle_skill))
        .route("/story/next", post(handle_story_next))
        .route("/panel", post(handle_panel))
        .route("/reset-code", post(handle_reset_code))
        .route("/auth/sign-in", post(handle_sign_in))
        .route("/auth/sign-out", post(handle_sign_out))
        .route("/reset", post(handle_reset))
        .route("/levels", get(handle_levels))
        .route("/levels/:id/hints/:tier", get(handle_level_hint))
        .route("/vault", get(handle_vault))
        .route("/achievements", get(handle_achievements))
        .route("/ws", get(ws_handler));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Clock
// ============================================================================

/// Drives session time from the wall clock.
///
/// Every tick advances the session by the real elapsed time, broadcasts the
/// resulting events and persists progress if it changed. The tick is the
/// finer of the typing interval and the idle tick.
pub fn spawn_clock(state: AppState) -> JoinHandle<()> {
    let period_ms = state
        .config
        .typing_interval_ms
        .min(state.config.idle_tick_ms)
        .max(1);

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(period_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = Instant::now();

        loop {
            ticker.tick().await;
            let now = Instant::now();
            let elapsed = now.duration_since(last);
            last = now;

            if let Err(e) = state.apply(|session| session.advance(elapsed)).await {
                warn!(error = %e, "Session clock failed");
            }
            if persistence::persist(&state.session, state.local.as_ref(), state.remote.as_deref())
                .await
            {
                state.flush().await;
            }
        }
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for `GET /api/state`.
async fn handle_state(State(state): State<Arc<AppState>>) -> Json<GameState> {
    Json(state.session.lock().await.snapshot())
}

/// Handler for `POST /api/code`.
async fn handle_code(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CodeRequest>,
) -> ApiResult<StatusCode> {
    state
        .apply(|session| session.edit_code(request.code))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `POST /api/run`.
///
/// Returns 202: the verdict arrives on the event stream after the run delay.
async fn handle_run(State(state): State<Arc<AppState>>) -> ApiResult<(StatusCode, Json<RunResponse>)> {
    state.apply(Session::run).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(RunResponse {
            accepted: true,
            verdict_in_ms: state.config.run_delay_ms,
        }),
    ))
}

/// Handler for `POST /api/level/select`.
async fn handle_select_level(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectLevelRequest>,
) -> ApiResult<Json<SelectLevelResponse>> {
    let changed = state
        .apply(|session| session.select_level(request.level_id))
        .await?;
    Ok(Json(SelectLevelResponse {
        changed,
        level_id: request.level_id,
    }))
}

/// Handler for `POST /api/hint`.
async fn handle_hint(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HintRequest>,
) -> ApiResult<Json<HintResponse>> {
    let response = state
        .apply(|session| {
            let tier = match request.tier {
                Some(tier) => {
                    session.request_hint(tier)?;
                    tier
                }
                None => session.escalate_hint()?,
            };
            let level_id = session.state().current_level_id;
            let text = session.catalog().hint(level_id, tier)?;
            Ok(HintResponse {
                level_id,
                tier,
                text: text.to_string(),
            })
        })
        .await?;
    Ok(Json(response))
}

/// Handler for `POST /api/hint/dismiss`.
async fn handle_dismiss_hint(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    state
        .apply(|session| {
            session.dismiss_hint();
            Ok(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `POST /api/solution`.
async fn handle_solution(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<SolutionResponse>> {
    let response = state
        .apply(|session| {
            let code = session.use_solution()?;
            Ok(SolutionResponse {
                code: code.to_string(),
                hints_used: session.state().hints_used,
            })
        })
        .await?;
    Ok(Json(response))
}

/// Handler for `GET /api/assessment`.
async fn handle_assessment_questions() -> Json<&'static [AssessmentQuestion]> {
    Json(QUESTIONS.as_slice())
}

/// Handler for `POST /api/assessment`.
async fn handle_assessment(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AssessmentRequest>,
) -> ApiResult<Json<AssessmentResponse>> {
    let (score, skill_level) = match request.skill_level {
        Some(skill) => (None, skill),
        None if request.answers.is_empty() => {
            return Err(ApiError::BadRequest(
                "Provide either answers or a skillLevel".to_string(),
            ));
        }
        None => {
            let score = assessment::score(&request.answers);
            (Some(score), assessment::placement(score))
        }
    };

    state
        .apply(|session| session.complete_assessment(skill_level))
        .await?;
    Ok(Json(AssessmentResponse { score, skill_level }))
}

/// Handler for `POST /api/skill`.
async fn handle_skill(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SkillRequest>,
) -> ApiResult<StatusCode> {
    state
        .apply(|session| {
            session.change_skill(request.skill_level);
            Ok(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `POST /api/story/next`.
async fn handle_story_next(State(state): State<Arc<AppState>>) -> ApiResult<Json<StoryResponse>> {
    let response = state
        .apply(|session| {
            session.story_next()?;
            Ok(StoryResponse {
                story: session.state().story.clone(),
                current_level_id: session.state().current_level_id,
            })
        })
        .await?;
    Ok(Json(response))
}

/// Handler for `POST /api/panel`.
async fn handle_panel(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PanelRequest>,
) -> ApiResult<StatusCode> {
    state
        .apply(|session| {
            session.open_panel(request.panel);
            Ok(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `POST /api/reset-code`.
async fn handle_reset_code(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ResetCodeResponse>> {
    let reset = state.apply(Session::reset_code).await?;
    Ok(Json(ResetCodeResponse { reset }))
}

/// Handler for `POST /api/auth/sign-in`.
///
/// With a remote mirror configured, sync runs before the response.
async fn handle_sign_in(
    State(state): State<Arc<AppState>>,
    Json(user): Json<UserProfile>,
) -> ApiResult<Json<SignInResponse>> {
    let profile = user.clone();
    state
        .apply(|session| {
            session.sign_in(user);
            Ok(())
        })
        .await?;

    let sync = match &state.remote {
        Some(remote) => {
            let outcome = persistence::sync_on_sign_in(&state.session, remote.as_ref()).await;
            state.flush().await;
            Some(outcome?)
        }
        None => None,
    };
    Ok(Json(SignInResponse {
        user: profile,
        sync,
    }))
}

/// Handler for `POST /api/auth/sign-out`.
async fn handle_sign_out(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    state
        .apply(|session| {
            session.sign_out();
            Ok(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `POST /api/reset`.
///
/// Wipes the session and deletes the local save.
async fn handle_reset(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetRequest>,
) -> ApiResult<StatusCode> {
    if !request.confirm {
        return Err(ApiError::BadRequest(
            "Resetting progress requires {\"confirm\": true}".to_string(),
        ));
    }

    state.apply(Session::reset_progress).await?;
    if let Some(local) = &state.local {
        if let Err(e) = local.clear().await {
            warn!(error = %e, "Failed to delete save after reset");
        }
    }
    info!("Progress wiped on request");
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `GET /api/levels`.
async fn handle_levels(State(state): State<Arc<AppState>>) -> Json<Vec<LevelSummary>> {
    let session = state.session.lock().await;
    let max_reached = session.state().max_reached_level;
    let levels = session
        .catalog()
        .levels()
        .map(|level| LevelSummary {
            id: level.id,
            title: level.title.to_string(),
            sub_title: level.sub_title.to_string(),
            objective: level.objective.to_string(),
            topic: level.exam.topic.to_string(),
            unlocked: level.id <= max_reached,
        })
        .collect();
    Json(levels)
}

/// Handler for `GET /api/levels/:id/hints/:tier`.
///
/// Locked levels keep their hints hidden.
async fn handle_level_hint(
    State(state): State<Arc<AppState>>,
    Path((level_id, tier)): Path<(u32, u8)>,
) -> ApiResult<Json<HintResponse>> {
    let session = state.session.lock().await;
    let catalog = session.catalog();
    if !catalog.contains(level_id) {
        return Err(SingularityError::unknown_level(level_id, catalog.last_id()).into());
    }
    let max_reached = session.state().max_reached_level;
    if level_id > max_reached {
        return Err(SingularityError::level_locked(level_id, max_reached).into());
    }
    let text = catalog.hint(level_id, tier)?;
    Ok(Json(HintResponse {
        level_id,
        tier,
        text: text.to_string(),
    }))
}

/// Handler for `GET /api/vault`.
async fn handle_vault(State(state): State<Arc<AppState>>) -> Json<Vec<VaultEntry>> {
    let level_id = state.session.lock().await.state().current_level_id;
    Json(vault::unlocked(level_id).copied().collect())
}

/// Handler for `GET /api/achievements`.
async fn handle_achievements(State(state): State<Arc<AppState>>) -> Json<Vec<AchievementStatus>> {
    let session = state.session.lock().await;
    let unlocked = &session.state().unlocked_achievements;
    let list = ACHIEVEMENTS
        .iter()
        .map(|achievement| {
            let is_unlocked = unlocked.iter().any(|id| id == achievement.id);
            let description = if achievement.is_hidden && !is_unlocked {
                "???"
            } else {
                achievement.description
            };
            AchievementStatus {
                id: achievement.id.to_string(),
                title: achievement.title.to_string(),
                description: description.to_string(),
                icon: achievement.icon.to_string(),
                unlocked: is_unlocked,
            }
        })
        .collect();
    Json(list)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use tower::util::ServiceExt;

    use super::*;
    use crate::persistence::{MemoryRemoteStore, SaveRecord};
    use crate::session::RunStatus;
    use crate::tutorial::TutorialPhase;

    fn test_state() -> AppState {
        let session = Session::new(Config::default(), Catalog::shipped().unwrap()).unwrap();
        AppState::new(Config::default(), session)
    }

    fn state_at(level: u32, max: u32) -> AppState {
        let record = SaveRecord {
            current_level_id: level,
            max_reached_level: Some(max),
            assessment_complete: true,
            ..SaveRecord::default()
        };
        let session =
            Session::restore(Config::default(), Catalog::shipped().unwrap(), record).unwrap();
        AppState::new(Config::default(), session)
    }

    async fn send(router: Router, method: Method, uri: &str, body: Option<&str>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        router.oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    // ------------------------------------------------------------------------
    // State and editing
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_get_state_returns_snapshot() {
        let router = create_router(test_state());
        let response = send(router, Method::GET, "/api/state", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let state: GameState = json_body(response).await;
        assert_eq!(state.current_level_id, 1);
        assert_eq!(state.max_reached_level, 1);
        assert!(!state.assessment_complete);
        assert!(state.story.is_some());
    }

    #[tokio::test]
    async fn test_post_code_updates_editor() {
        let state = test_state();
        let router = create_router(state.clone());
        let response = send(
            router,
            Method::POST,
            "/api/code",
            Some(r#"{"code": "print(\"hi\")"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.session.lock().await.state().code, "print(\"hi\")");
    }

    #[tokio::test]
    async fn test_post_code_invalid_json_is_rejected() {
        let router = create_router(test_state());
        let response = send(router, Method::POST, "/api/code", Some("{ not json")).await;
        assert!(response.status().is_client_error());
    }

    // ------------------------------------------------------------------------
    // Running
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_run_is_accepted_then_conflicts() {
        let state = state_at(2, 2);
        let response = send(create_router(state.clone()), Method::POST, "/api/run", None).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body: RunResponse = json_body(response).await;
        assert_eq!(body.verdict_in_ms, 800);

        let response = send(create_router(state), Method::POST, "/api/run", None).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: ErrorResponse = json_body(response).await;
        assert!(body.error.contains("already in progress"));
    }

    #[tokio::test]
    async fn test_run_verdict_is_broadcast() {
        let state = state_at(1, 1);
        let mut events = state.broadcaster.subscribe();
        let solution = Catalog::shipped().unwrap().solution(1).unwrap();
        state
            .apply(|session| session.edit_code(solution))
            .await
            .unwrap();

        let response = send(create_router(state.clone()), Method::POST, "/api/run", None).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        state
            .apply(|session| session.advance(Duration::from_millis(800)))
            .await
            .unwrap();

        assert_eq!(
            state.session.lock().await.state().status,
            RunStatus::Success
        );
        let mut names = Vec::new();
        while let Ok(event) = events.try_recv() {
            names.push(event.event_name());
        }
        assert!(names.contains(&"verdict"));
        assert!(names.contains(&"log"));
    }

    #[tokio::test]
    async fn test_run_conflicts_while_story_open() {
        let state = test_state();
        let response = send(create_router(state.clone()), Method::POST, "/api/run", None).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = send(create_router(state.clone()), Method::POST, "/api/solution", None).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(state.session.lock().await.state().hints_used, 0);
    }

    // ------------------------------------------------------------------------
    // Levels
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_select_level_errors_map_to_status() {
        let state = state_at(3, 5);

        let response = send(
            create_router(state.clone()),
            Method::POST,
            "/api/level/select",
            Some(r#"{"levelId": 9}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(
            create_router(state.clone()),
            Method::POST,
            "/api/level/select",
            Some(r#"{"levelId": 99}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            create_router(state.clone()),
            Method::POST,
            "/api/level/select",
            Some(r#"{"levelId": 4}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: SelectLevelResponse = json_body(response).await;
        assert!(body.changed);
        assert_eq!(state.session.lock().await.state().current_level_id, 4);
    }

    #[tokio::test]
    async fn test_levels_list_marks_unlocked() {
        let router = create_router(state_at(3, 5));
        let response = send(router, Method::GET, "/api/levels", None).await;
        let levels: Vec<LevelSummary> = json_body(response).await;
        assert_eq!(levels.len(), 41);
        assert_eq!(levels.iter().filter(|level| level.unlocked).count(), 5);
    }

    #[tokio::test]
    async fn test_level_hint_lookup() {
        let state = state_at(3, 5);

        let response = send(
            create_router(state.clone()),
            Method::GET,
            "/api/levels/2/hints/1",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let hint: HintResponse = json_body(response).await;
        assert_eq!(hint.level_id, 2);
        assert!(!hint.text.is_empty());

        let response = send(
            create_router(state.clone()),
            Method::GET,
            "/api/levels/2/hints/5",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            create_router(state),
            Method::GET,
            "/api/levels/12/hints/1",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    // ------------------------------------------------------------------------
    // Hints
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_hint_escalates_without_tier() {
        let state = state_at(2, 2);

        let response = send(create_router(state.clone()), Method::POST, "/api/hint", Some("{}")).await;
        let hint: HintResponse = json_body(response).await;
        assert_eq!(hint.tier, 1);

        let response = send(create_router(state.clone()), Method::POST, "/api/hint", Some("{}")).await;
        let hint: HintResponse = json_body(response).await;
        assert_eq!(hint.tier, 2);

        let response = send(
            create_router(state.clone()),
            Method::POST,
            "/api/hint/dismiss",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.session.lock().await.state().active_hint_tier, 0);
    }

    #[tokio::test]
    async fn test_hint_rejects_bad_tier() {
        let router = create_router(state_at(2, 2));
        let response = send(router, Method::POST, "/api/hint", Some(r#"{"tier": 0}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_solution_loads_code_and_counts() {
        let state = state_at(2, 2);
        let response = send(create_router(state.clone()), Method::POST, "/api/solution", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: SolutionResponse = json_body(response).await;
        assert_eq!(body.hints_used, 1);
        assert_eq!(state.session.lock().await.state().code, body.code);
    }

    // ------------------------------------------------------------------------
    // Assessment
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_assessment_questions_listed() {
        let router = create_router(test_state());
        let response = send(router, Method::GET, "/api/assessment", None).await;
        let questions: serde_json::Value = json_body(response).await;
        assert_eq!(questions.as_array().unwrap().len(), 3);
        assert!(questions[0]["options"][0].get("correct").is_none());
    }

    #[tokio::test]
    async fn test_assessment_skip_to_advanced() {
        let state = test_state();
        let response = send(
            create_router(state.clone()),
            Method::POST,
            "/api/assessment",
            Some(r#"{"skillLevel": "advanced"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: AssessmentResponse = json_body(response).await;
        assert_eq!(body.skill_level, SkillLevel::Advanced);
        assert!(body.score.is_none());

        let session = state.session.lock().await;
        assert!(session.state().assessment_complete);
        assert_eq!(session.state().tutorial_phase, TutorialPhase::Standard);
    }

    #[tokio::test]
    async fn test_assessment_is_one_shot() {
        let state = test_state();
        let body = Some(r#"{"skillLevel": "beginner"}"#);
        let first = send(create_router(state.clone()), Method::POST, "/api/assessment", body).await;
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(
            state.session.lock().await.state().tutorial_phase,
            TutorialPhase::Demonstration
        );

        let second = send(create_router(state), Method::POST, "/api/assessment", body).await;
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_assessment_requires_input() {
        let router = create_router(test_state());
        let response = send(router, Method::POST, "/api/assessment", Some("{}")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // ------------------------------------------------------------------------
    // Panels, vault, achievements
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_panel_unlocks_achievement() {
        let state = test_state();
        let response = send(
            create_router(state.clone()),
            Method::POST,
            "/api/panel",
            Some(r#"{"panel": "vault"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(create_router(state), Method::GET, "/api/achievements", None).await;
        let list: Vec<AchievementStatus> = json_body(response).await;
        let curious = list.iter().find(|a| a.id == "curious_mind").unwrap();
        assert!(curious.unlocked);
        let glitch = list.iter().find(|a| a.id == "syntax_error").unwrap();
        assert!(!glitch.unlocked);
        assert_eq!(glitch.description, "???");
    }

    #[tokio::test]
    async fn test_vault_follows_current_level() {
        let router = create_router(state_at(5, 5));
        let response = send(router, Method::GET, "/api/vault", None).await;
        let entries: serde_json::Value = json_body(response).await;
        assert_eq!(entries.as_array().unwrap().len(), 6);
    }

    // ------------------------------------------------------------------------
    // Identity and reset
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_sign_in_without_remote() {
        let state = test_state();
        let response = send(
            create_router(state.clone()),
            Method::POST,
            "/api/auth/sign-in",
            Some(r#"{"id": "u-1", "name": "Ada", "email": "ada@example.com"}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: SignInResponse = json_body(response).await;
        assert!(body.sync.is_none());
        assert!(state.session.lock().await.state().user.is_some());

        let response = send(
            create_router(state.clone()),
            Method::POST,
            "/api/auth/sign-out",
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.session.lock().await.state().user.is_none());
    }

    #[tokio::test]
    async fn test_sign_in_syncs_remote() {
        let remote = Arc::new(MemoryRemoteStore::new());
        let state = state_at(4, 4).with_remote_store(remote.clone());
        let response = send(
            create_router(state),
            Method::POST,
            "/api/auth/sign-in",
            Some(r#"{"id": "u-1", "name": "Ada", "email": "ada@example.com"}"#),
        )
        .await;
        let body: SignInResponse = json_body(response).await;
        assert_eq!(body.sync, Some(SyncOutcome::Created));
        assert_eq!(remote.get("u-1").await.unwrap().current_level_id, 4);
    }

    #[tokio::test]
    async fn test_reset_requires_confirmation() {
        let state = state_at(6, 6);

        let response = send(create_router(state.clone()), Method::POST, "/api/reset", Some("{}")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.session.lock().await.state().current_level_id, 6);

        let response = send(
            create_router(state.clone()),
            Method::POST,
            "/api/reset",
            Some(r#"{"confirm": true}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let session = state.session.lock().await;
        assert_eq!(session.state().current_level_id, 1);
        assert_eq!(session.state().max_reached_level, 1);
    }

    // ------------------------------------------------------------------------
    // Router configuration
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_cors_headers_present() {
        let router = create_router(test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/state")
                    .header("origin", "http://localhost:5173")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_success() || response.status() == StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_unknown_route_returns_404() {
        let router = create_router(test_state());
        let response = send(router, Method::GET, "/api/unknown", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_load_recovers_from_corrupted_save() {
        let path = std::env::temp_dir()
            .join(format!("singularity-api-{}", std::process::id()))
            .join("save.json");
        tokio::fs::create_dir_all(path.parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(&path, "{ garbage").await.unwrap();

        let config = Config {
            save_file: path.to_string_lossy().into_owned(),
            ..Config::default()
        };
        let state = AppState::load(config).await.unwrap();
        let session = state.session.lock().await;
        assert_eq!(session.state().current_level_id, 1);
        assert!(session
            .state()
            .logs
            .iter()
            .any(|entry| entry.content == SAVE_CORRUPTED_MESSAGE));
    }

    #[tokio::test]
    async fn test_load_restores_existing_save() {
        let path = std::env::temp_dir()
            .join(format!("singularity-api-restore-{}", std::process::id()))
            .join("save.json");
        let record = SaveRecord {
            current_level_id: 7,
            max_reached_level: Some(9),
            xp: 500,
            assessment_complete: true,
            ..SaveRecord::default()
        };
        LocalStore::new(&path).save(&record).await.unwrap();

        let config = Config {
            save_file: path.to_string_lossy().into_owned(),
            ..Config::default()
        };
        let state = AppState::load(config).await.unwrap();
        let session = state.session.lock().await;
        assert_eq!(session.state().current_level_id, 7);
        assert_eq!(session.state().max_reached_level, 9);
        assert_eq!(session.state().xp, 500);
    }
}
