//! Project Singularity engine
//!
//! Validates learner Python submissions against a fixed 41-level curriculum
//! without executing them, and drives the tutorial session around it:
//! story overlays, the scripted "I do / We do / You do" walkthrough, idle
//! hints, scoring, achievements, persistence, and the HTTP and WebSocket
//! surface the browser client talks to.

pub mod achievements;
pub mod api;
pub mod assessment;
pub mod catalog;
pub mod config;
pub mod error;
pub mod execution;
pub mod hints;
pub mod level;
pub mod normalize;
pub mod persistence;
pub mod session;
pub mod tutorial;
pub mod validator;
pub mod vault;
pub mod verdict;
pub mod websocket;

pub use api::{create_router, spawn_clock, AppState, ErrorResponse};
pub use catalog::Catalog;
pub use config::{Config, IdleThresholds, SkillLevel};
pub use error::{Result, SingularityError};
pub use execution::run_level;
pub use level::Level;
pub use normalize::{Submission, View};
pub use persistence::{LocalStore, RemoteStore, SaveRecord, SyncOutcome};
pub use session::{GameState, MessageType, RunStatus, Session};
pub use tutorial::TutorialPhase;
pub use verdict::Verdict;
pub use websocket::{EventBroadcaster, SessionEvent};
