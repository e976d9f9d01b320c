//! Integration tests for level progression.
//!
//! These tests drive whole learner journeys: the scripted walkthrough on
//! level 1, completing levels, save and restore, and the same flow over the
//! live HTTP API.

use std::net::TcpListener;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::{json, Value};
use singularity_engine::tutorial::GUIDED_SNIPPET;
use singularity_engine::{
    create_router, spawn_clock, AppState, Catalog, Config, LocalStore, RunStatus,
    Session, SkillLevel, TutorialPhase,
};
use tokio::time::{sleep, timeout};

fn catalog() -> &'static Catalog {
    Catalog::shipped().expect("Shipped catalog is consistent")
}

/// Timings short enough for real-time tests.
fn fast_config() -> Config {
    Config {
        run_delay_ms: 40,
        typing_interval_ms: 5,
        demo_run_delay_ms: 10,
        demo_handoff_delay_ms: 20,
        story_reveal_delay_ms: 40,
        ..Config::default()
    }
}

fn temp_save(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("singularity-it-{}", std::process::id()))
        .join(name)
}

fn close_story(session: &mut Session) {
    while session.state().story.is_some() {
        session.story_next().expect("Story advances");
    }
}

/// Submits the current level's solution and waits out the verdict and story.
fn solve_current_level(session: &mut Session) {
    let level_id = session.state().current_level_id;
    let solution = catalog().solution(level_id).expect("Solution exists");
    session.edit_code(solution).expect("Editor accepts code");
    session.run().expect("Run starts");
    session
        .advance(Duration::from_millis(800))
        .expect("Verdict arrives");
    assert_eq!(
        session.state().status,
        RunStatus::Success,
        "Level {level_id} rejected its own solution"
    );
    session
        .advance(Duration::from_millis(1500))
        .expect("Story reveals");
    close_story(session);
}

// ============================================================================
// Session Journeys
// ============================================================================

/// Tests the scripted walkthrough from assessment to level 2.
#[test]
fn test_beginner_walkthrough_reaches_level_two() {
    let mut session = Session::new(Config::default(), catalog()).expect("Session starts");
    close_story(&mut session);

    session
        .complete_assessment(SkillLevel::Beginner)
        .expect("Assessment accepted");
    assert_eq!(session.state().tutorial_phase, TutorialPhase::Demonstration);
    assert!(session.edit_code("print(1)").is_err());

    session
        .advance(Duration::from_secs(5))
        .expect("Demonstration plays");
    assert_eq!(session.state().tutorial_phase, TutorialPhase::GuidedPractice);
    assert!(session.state().code.is_empty());

    session.edit_code(GUIDED_SNIPPET).expect("Editor accepts code");
    session.run().expect("Run starts");
    session
        .advance(Duration::from_millis(800))
        .expect("Guided run finishes");
    assert_eq!(session.state().tutorial_phase, TutorialPhase::Independent);

    solve_current_level(&mut session);

    let state = session.state();
    assert_eq!(state.current_level_id, 2);
    assert_eq!(state.max_reached_level, 2);
    assert_eq!(state.tutorial_phase, TutorialPhase::Standard);
    assert_eq!(state.xp, 80);
    assert!(state.unlocked_achievements.iter().any(|id| id == "first_steps"));
    assert!(state.unlocked_achievements.iter().any(|id| id == "pure_coder"));
}

/// Tests that clearing the first five levels earns the milestone.
#[test]
fn test_five_levels_unlock_script_kiddie() {
    let mut session = Session::new(Config::default(), catalog()).expect("Session starts");
    close_story(&mut session);
    session
        .complete_assessment(SkillLevel::Advanced)
        .expect("Assessment accepted");

    for _ in 0..4 {
        solve_current_level(&mut session);
    }

    let state = session.state();
    assert_eq!(state.current_level_id, 5);
    assert_eq!(state.xp, 4 * 150);
    assert!(state
        .unlocked_achievements
        .iter()
        .any(|id| id == "script_kiddie"));
}

/// Tests that an auto-solve costs XP on the level it was used.
#[test]
fn test_solution_use_reduces_award() {
    let mut session = Session::new(Config::default(), catalog()).expect("Session starts");
    close_story(&mut session);
    session
        .complete_assessment(SkillLevel::Advanced)
        .expect("Assessment accepted");

    session.use_solution().expect("Solution loads");
    session.run().expect("Run starts");
    session
        .advance(Duration::from_millis(2300))
        .expect("Verdict and story arrive");

    let state = session.state();
    assert_eq!(state.xp, 135);
    assert!(!state.unlocked_achievements.iter().any(|id| id == "pure_coder"));
}

// ============================================================================
// Save and Restore
// ============================================================================

/// Tests that progress survives a save file round trip.
#[tokio::test]
async fn test_progress_survives_restart() {
    let mut session = Session::new(Config::default(), catalog()).expect("Session starts");
    close_story(&mut session);
    session
        .complete_assessment(SkillLevel::Advanced)
        .expect("Assessment accepted");
    solve_current_level(&mut session);
    solve_current_level(&mut session);

    let store = LocalStore::new(temp_save("restart/save.json"));
    let record = session.take_save_request().expect("Progress requests a save");
    store.save(&record).await.expect("Save written");

    let loaded = store.load().await.expect("Save readable").expect("Save exists");
    let restored = Session::restore(Config::default(), catalog(), loaded).expect("Restores");
    let state = restored.state();
    assert_eq!(state.current_level_id, 3);
    assert_eq!(state.max_reached_level, 3);
    assert_eq!(state.xp, 300);
    assert_eq!(state.skill_level, SkillLevel::Advanced);
    assert!(state
        .logs
        .iter()
        .any(|entry| entry.content == "SYSTEM RESTORED FROM LOCAL MEMORY."));

    store.clear().await.expect("Save removed");
}

// ============================================================================
// HTTP API
// ============================================================================

fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Spawns the server and clock, returning the API base URL.
async fn spawn_test_server(state: AppState) -> String {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");

    let _clock = spawn_clock(state.clone());
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });
    sleep(Duration::from_millis(50)).await;

    format!("http://{addr}/api")
}

async fn get_state(client: &reqwest::Client, base: &str) -> Value {
    client
        .get(format!("{base}/state"))
        .send()
        .await
        .expect("Request failed")
        .json()
        .await
        .expect("State is JSON")
}

/// Polls the state until `done` holds.
async fn wait_for(client: &reqwest::Client, base: &str, done: impl Fn(&Value) -> bool) -> Value {
    timeout(Duration::from_secs(5), async {
        loop {
            let state = get_state(client, base).await;
            if done(&state) {
                return state;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("Timed out waiting for state")
}

/// Tests completing level 1 over HTTP with the live clock.
#[tokio::test]
async fn test_http_level_completion() {
    let config = fast_config();
    let session = Session::new(config.clone(), catalog()).expect("Session starts");
    let base = spawn_test_server(AppState::new(config, session)).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/assessment"))
        .json(&json!({"skillLevel": "advanced"}))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 200);

    while !get_state(&client, &base).await["story"].is_null() {
        client
            .post(format!("{base}/story/next"))
            .send()
            .await
            .expect("Request failed");
    }

    let solution = catalog().solution(1).expect("Solution exists");
    let response = client
        .post(format!("{base}/code"))
        .json(&json!({ "code": solution }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 204);

    let response = client
        .post(format!("{base}/run"))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 202);

    let state = wait_for(&client, &base, |state| state["xp"] == 150).await;
    assert_eq!(state["status"], "success");
    assert!(!state["story"].is_null());

    while !get_state(&client, &base).await["story"].is_null() {
        client
            .post(format!("{base}/story/next"))
            .send()
            .await
            .expect("Request failed");
    }

    let state = get_state(&client, &base).await;
    assert_eq!(state["currentLevelId"], 2);
    assert_eq!(state["maxReachedLevel"], 2);
}

/// Tests that locked levels and bad hint tiers are rejected over HTTP.
#[tokio::test]
async fn test_http_rejections() {
    let config = fast_config();
    let session = Session::new(config.clone(), catalog()).expect("Session starts");
    let base = spawn_test_server(AppState::new(config, session)).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/level/select"))
        .json(&json!({"levelId": 10}))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.expect("Error is JSON");
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.contains("Suggestion:")));

    let response = client
        .post(format!("{base}/hint"))
        .json(&json!({"tier": 9}))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 400);

    let response = client
        .post(format!("{base}/reset"))
        .json(&json!({}))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 400);
}

/// Tests that the clock persists progress to the save file.
#[tokio::test]
async fn test_http_progress_is_saved() {
    let path = temp_save("http/save.json");
    let store = LocalStore::new(&path);
    store.clear().await.expect("Stale save removed");

    let config = Config {
        save_file: path.to_string_lossy().into_owned(),
        ..fast_config()
    };
    let state = AppState::load(config).await.expect("State boots");
    let base = spawn_test_server(state).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/panel"))
        .json(&json!({"panel": "chat"}))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), 204);

    let record = timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(Some(record)) = store.load().await {
                return record;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("Timed out waiting for save");

    assert!(record
        .unlocked_achievements
        .iter()
        .any(|id| id == "neural_link"));
    store.clear().await.expect("Save removed");
}
