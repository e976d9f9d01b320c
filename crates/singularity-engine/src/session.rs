//! The learner session.
//!
//! A [`Session`] owns one learner's [`GameState`] and is only ever changed
//! through its `&mut self` methods, one per learner action, plus
//! [`Session::advance`] for the passage of time. Each method finishes the
//! whole transition before returning, so transitions are atomic with respect
//! to each other. Observable changes are queued as [`SessionEvent`]s and
//! collected with [`Session::drain_events`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use singularity_engine::{Catalog, Config, Session, SkillLevel};
//!
//! # fn main() -> singularity_engine::Result<()> {
//! let mut session = Session::new(Config::default(), Catalog::shipped()?)?;
//! while session.state().story.is_some() {
//!     session.story_next()?;
//! }
//! session.complete_assessment(SkillLevel::Advanced)?;
//! session.edit_code("print(\"SYSTEM ONLINE\")")?;
//! session.run()?;
//! session.advance(Duration::from_millis(800))?;
//! assert!(session.state().level_complete);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::achievements::{
    self, CURIOUS_MIND, FIRST_STEPS, NEURAL_LINK, PERFECTIONIST, PURE_CODER, SPEED_DEMON,
    SYNTAX_ERROR,
};
use crate::catalog::Catalog;
use crate::config::{Config, SkillLevel};
use crate::error::{Result, SingularityError};
use crate::execution::run_level;
use crate::level::{Level, Mood, Speaker, StorySegment};
use crate::persistence::SaveRecord;
use crate::tutorial::{
    self, Scheduler, TimerKind, TutorialPhase, DEMO_INTRO, DEMO_OUTPUT, DEMO_SNIPPET,
    GUIDED_PROMPT, INDEPENDENT_OBJECTIVE, INDEPENDENT_PRAISE,
};
use crate::verdict::Verdict;
use crate::websocket::SessionEvent;

/// First log line of a fresh session.
pub const BOOT_MESSAGE: &str = "Connecting to Global Defense Grid...";

/// Logged when the final level's story closes.
pub const CAMPAIGN_COMPLETE_MESSAGE: &str = "ALL MODULES COMPLETE. STANDBY FOR EXPANSION.";

// ============================================================================
// State Types
// ============================================================================

/// Status of the run control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Nothing running.
    #[default]
    Idle,
    /// A verdict is pending.
    Running,
    /// The last run passed.
    Success,
    /// The last run failed.
    Failed,
}

/// Category of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// System announcements.
    System,
    /// Failed verdicts and sync problems.
    Error,
    /// Passed verdicts and good news.
    Success,
    /// Echo of learner actions.
    User,
    /// Narrative lines.
    Story,
}

/// One console line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Session-unique id.
    pub id: u64,
    /// Line category.
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Line text.
    pub content: String,
    /// When the line was written.
    pub timestamp: DateTime<Utc>,
}

/// One line of an open story overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryLine {
    /// Who speaks.
    pub speaker: Speaker,
    /// What they say.
    pub text: String,
    /// Delivery hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
}

impl From<&StorySegment> for StoryLine {
    fn from(segment: &StorySegment) -> Self {
        Self {
            speaker: segment.speaker,
            text: segment.text.to_string(),
            mood: segment.mood,
        }
    }
}

/// A story overlay: queued segments and the one being shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryOverlay {
    /// Queued lines.
    pub lines: Vec<StoryLine>,
    /// Index of the line on screen.
    pub cursor: usize,
}

impl StoryOverlay {
    fn from_segments(segments: &[StorySegment]) -> Self {
        Self {
            lines: segments.iter().map(StoryLine::from).collect(),
            cursor: 0,
        }
    }

    /// The line on screen, if any.
    #[must_use]
    pub fn current(&self) -> Option<&StoryLine> {
        self.lines.get(self.cursor)
    }

    /// Returns `true` when the cursor is on the final line.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.cursor + 1 >= self.lines.len()
    }
}

/// An authenticated learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Stable id, the remote mirror key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Avatar image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Optional panels whose first open earns an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    /// The code vault.
    Vault,
    /// The mentor chat.
    Chat,
}

/// Everything a client needs to render a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Level on screen.
    pub current_level_id: u32,
    /// Highest unlocked level. Never decreases.
    pub max_reached_level: u32,
    /// Accumulated XP. Never decreases except on full reset.
    pub xp: u32,
    /// Skill tier.
    pub skill_level: SkillLevel,
    /// Editor contents.
    pub code: String,
    /// Run control status.
    pub status: RunStatus,
    /// Scripted tutorial phase.
    pub tutorial_phase: TutorialPhase,
    /// Auto-solves used on this level.
    pub hints_used: u32,
    /// Hint tier on screen, 0 for none.
    pub active_hint_tier: u8,
    /// Idle ticks since the last edit.
    pub idle_seconds: u32,
    /// Failed runs on this level.
    pub failed_attempts: u32,
    /// Consecutive hint-free completions.
    pub clean_streak: u32,
    /// Whether the placement quiz is done.
    pub assessment_complete: bool,
    /// Whether the current level has been passed.
    pub level_complete: bool,
    /// Open story overlay.
    pub story: Option<StoryOverlay>,
    /// Unlocked achievement ids. Only grows.
    pub unlocked_achievements: Vec<String>,
    /// Console lines for this level.
    pub logs: Vec<LogEntry>,
    /// Signed-in learner.
    pub user: Option<UserProfile>,
}

/// The fields whose change makes a save worthwhile.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    level: u32,
    max: u32,
    xp: u32,
    skill: SkillLevel,
    user: Option<String>,
    achievements: usize,
}

/// XP for a completion: base minus the auto-solve penalty, scaled by skill.
///
/// # Examples
///
/// ```
/// use singularity_engine::{session::completion_xp, Config, SkillLevel};
///
/// let config = Config::default();
/// assert_eq!(completion_xp(&config, SkillLevel::Beginner, 2), 64);
/// assert_eq!(completion_xp(&config, SkillLevel::Advanced, 0), 150);
/// assert_eq!(completion_xp(&config, SkillLevel::Intermediate, 20), 0);
/// ```
#[must_use]
pub fn completion_xp(config: &Config, skill: SkillLevel, hints_used: u32) -> u32 {
    let penalty = config.hint_penalty.saturating_mul(hints_used);
    config
        .base_xp
        .saturating_sub(penalty)
        .saturating_mul(skill.multiplier_tenths())
        / 10
}

// ============================================================================
// Session
// ============================================================================

/// One learner's tutorial session.
#[derive(Debug)]
pub struct Session {
    config: Config,
    catalog: &'static Catalog,
    state: GameState,
    scheduler: Scheduler,
    events: Vec<SessionEvent>,
    next_log_id: u64,
    level_started_at: Duration,
    demo_typed: usize,
    pending_xp: u32,
    saved: Option<Fingerprint>,
    generation: u64,
}

impl Session {
    /// Starts a fresh session on level 1 with its opening story on screen.
    pub fn new(config: Config, catalog: &'static Catalog) -> Result<Self> {
        let first = catalog.level(1)?;
        let skill = SkillLevel::default();
        let mut session = Self {
            config,
            catalog,
            state: GameState {
                current_level_id: first.id,
                max_reached_level: first.id,
                xp: 0,
                skill_level: skill,
                code: first.seed_for(skill).to_string(),
                status: RunStatus::Idle,
                tutorial_phase: TutorialPhase::Standard,
                hints_used: 0,
                active_hint_tier: 0,
                idle_seconds: 0,
                failed_attempts: 0,
                clean_streak: 0,
                assessment_complete: false,
                level_complete: false,
                story: Some(StoryOverlay::from_segments(first.story_start)),
                unlocked_achievements: Vec::new(),
                logs: Vec::new(),
                user: None,
            },
            scheduler: Scheduler::new(),
            events: Vec::new(),
            next_log_id: 0,
            level_started_at: Duration::ZERO,
            demo_typed: 0,
            pending_xp: 0,
            saved: None,
            generation: 0,
        };
        session.log(MessageType::System, BOOT_MESSAGE);
        Ok(session)
    }

    /// Resumes a saved session.
    ///
    /// The level id is clamped into the catalog. A save taken mid
    /// demonstration resumes in guided practice, since the script cannot be
    /// replayed from the middle.
    pub fn restore(config: Config, catalog: &'static Catalog, record: SaveRecord) -> Result<Self> {
        let mut session = Self::new(config, catalog)?;
        let last = catalog.last_id();
        let level_id = record.current_level_id.clamp(1, last);
        let max_reached = record.max_reached().max(level_id).min(last);

        let phase = match record.tutorial_phase {
            _ if level_id != 1 => TutorialPhase::Standard,
            TutorialPhase::Demonstration => TutorialPhase::GuidedPractice,
            phase => phase,
        };

        let name = record
            .user
            .as_ref()
            .map_or_else(|| "Cipher".to_string(), |user| user.name.clone());

        let state = &mut session.state;
        state.current_level_id = level_id;
        state.max_reached_level = max_reached;
        state.xp = record.xp;
        state.skill_level = record.skill_level;
        state.code = record.code;
        state.hints_used = record.hints_used;
        state.assessment_complete = record.assessment_complete;
        state.tutorial_phase = phase;
        state.unlocked_achievements = record.unlocked_achievements;
        state.user = record.user;
        state.story = None;
        state.logs.clear();
        session.events.clear();

        session.saved = Some(session.fingerprint());
        session.log(MessageType::System, "SYSTEM RESTORED FROM LOCAL MEMORY.");
        session.log(
            MessageType::Success,
            format!("Welcome back, {name}. Level: {level_id}"),
        );
        session.evaluate_progress();
        session.sync_idle();
        info!(level_id, max_reached, "Session restored");
        Ok(session)
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The catalog this session plays.
    #[must_use]
    pub const fn catalog(&self) -> &'static Catalog {
        self.catalog
    }

    /// Current session time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Returns `true` if a timer of `kind` is pending.
    #[must_use]
    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.scheduler.is_scheduled(kind)
    }

    /// The level on screen.
    pub fn level(&self) -> Result<&'static Level> {
        self.catalog.level(self.state.current_level_id)
    }

    /// Takes every event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Jumps to an unlocked level.
    ///
    /// Returns `Ok(false)` if `id` is already on screen. Never moves the
    /// high-water mark.
    pub fn select_level(&mut self, id: u32) -> Result<bool> {
        if id == self.state.current_level_id {
            return Ok(false);
        }
        if !self.catalog.contains(id) {
            return Err(SingularityError::unknown_level(id, self.catalog.last_id()));
        }
        if id > self.state.max_reached_level {
            return Err(SingularityError::level_locked(
                id,
                self.state.max_reached_level,
            ));
        }
        self.enter_level(id)?;
        self.log(MessageType::System, format!("JUMPING TO SECTOR {id}..."));
        Ok(true)
    }

    /// Advances the open story, closing it after its last line.
    ///
    /// Closing the completion story enters the next level, or announces the
    /// end of the campaign after the final level.
    pub fn story_next(&mut self) -> Result<()> {
        let Some(story) = self.state.story.as_mut() else {
            return Err(SingularityError::invalid_transition("no story", "next line"));
        };
        if !story.is_last() {
            story.cursor += 1;
            let story = self.state.story.clone();
            self.emit(SessionEvent::story_changed(story));
            return Ok(());
        }

        self.state.story = None;
        self.emit(SessionEvent::story_changed(None));

        if self.state.level_complete {
            let next = self.state.current_level_id + 1;
            if self.catalog.contains(next) {
                self.state.max_reached_level = self.state.max_reached_level.max(next);
                self.enter_level(next)?;
            } else {
                self.log(MessageType::System, CAMPAIGN_COMPLETE_MESSAGE);
            }
        }
        self.sync_idle();
        Ok(())
    }

    /// Records the placement result.
    ///
    /// Below advanced on level 1, the scripted demonstration starts.
    pub fn complete_assessment(&mut self, skill: SkillLevel) -> Result<()> {
        if self.state.assessment_complete {
            return Err(SingularityError::invalid_transition(
                "assessment complete",
                "assessment",
            ));
        }
        let level = self.level()?;
        self.state.skill_level = skill;
        self.state.assessment_complete = true;
        self.set_code(level.seed_for(skill).to_string());
        info!(skill = %skill, "Assessment complete");

        if skill != SkillLevel::Advanced && level.id == 1 {
            self.start_demonstration();
        } else {
            self.set_phase(TutorialPhase::Standard);
        }
        self.sync_idle();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Editing and running
    // ------------------------------------------------------------------------

    /// Replaces the editor contents and restarts the idle streak.
    pub fn edit_code(&mut self, code: impl Into<String>) -> Result<()> {
        if self.state.tutorial_phase.is_locked() {
            return Err(SingularityError::invalid_transition(
                self.state.tutorial_phase,
                "edit",
            ));
        }
        self.state.code = code.into();
        self.state.idle_seconds = 0;
        Ok(())
    }

    /// Starts a run. The verdict arrives after the configured run delay.
    pub fn run(&mut self) -> Result<()> {
        if self.state.status == RunStatus::Running {
            return Err(SingularityError::RunInProgress);
        }
        if self.state.tutorial_phase.is_locked() {
            return Err(SingularityError::invalid_transition(
                self.state.tutorial_phase,
                "run",
            ));
        }
        if self.state.story.is_some() {
            return Err(SingularityError::invalid_transition("story open", "run"));
        }
        if self.state.level_complete {
            return Err(SingularityError::invalid_transition("level complete", "run"));
        }
        self.state.status = RunStatus::Running;
        self.log(MessageType::User, "Executing script...");
        self.scheduler
            .schedule(TimerKind::PendingRun, self.config.run_delay());
        Ok(())
    }

    /// Reloads the seed template for the current skill tier.
    ///
    /// Ignored during the demonstration; returns whether the reset happened.
    pub fn reset_code(&mut self) -> Result<bool> {
        if self.state.tutorial_phase.is_locked() {
            return Ok(false);
        }
        let seed = self.level()?.seed_for(self.state.skill_level);
        self.set_code(seed.to_string());
        self.state.status = RunStatus::Idle;
        self.log(
            MessageType::System,
            "Code reset to current difficulty template.",
        );
        Ok(true)
    }

    /// Changes the skill tier.
    pub fn change_skill(&mut self, skill: SkillLevel) {
        self.state.skill_level = skill;
        self.log(
            MessageType::System,
            format!("DIFFICULTY ADJUSTED TO: {}", skill.as_str().to_uppercase()),
        );
        self.sync_idle();
    }

    // ------------------------------------------------------------------------
    // Hints
    // ------------------------------------------------------------------------

    /// Shows a hint tier and returns its text.
    pub fn request_hint(&mut self, tier: u8) -> Result<&'static str> {
        let text = self.catalog.hint(self.state.current_level_id, tier)?;
        self.set_tier(tier);
        Ok(text)
    }

    /// Shows the next tier up, stopping at 4. Returns the new tier.
    pub fn escalate_hint(&mut self) -> Result<u8> {
        let tier = (self.state.active_hint_tier + 1).min(4);
        self.request_hint(tier)?;
        Ok(tier)
    }

    /// Jumps straight to the solution tier.
    pub fn sos(&mut self) -> Result<&'static str> {
        self.request_hint(4)
    }

    /// Hides the hint panel.
    pub fn dismiss_hint(&mut self) {
        self.set_tier(0);
    }

    /// Loads the tier-4 solution into the editor at the cost of one hint.
    pub fn use_solution(&mut self) -> Result<&'static str> {
        if self.state.tutorial_phase.is_locked() {
            return Err(SingularityError::invalid_transition(
                self.state.tutorial_phase,
                "use solution",
            ));
        }
        if self.state.story.is_some() {
            return Err(SingularityError::invalid_transition(
                "story open",
                "use solution",
            ));
        }
        let solution = self.catalog.solution(self.state.current_level_id)?;
        self.set_code(solution.to_string());
        self.state.hints_used += 1;
        self.state.clean_streak = 0;
        self.set_tier(0);
        debug!(
            level_id = self.state.current_level_id,
            hints_used = self.state.hints_used,
            "Solution loaded"
        );
        Ok(solution)
    }

    // ------------------------------------------------------------------------
    // Panels and identity
    // ------------------------------------------------------------------------

    /// Records that an optional panel was opened.
    pub fn open_panel(&mut self, panel: Panel) {
        match panel {
            Panel::Vault => self.unlock(CURIOUS_MIND),
            Panel::Chat => self.unlock(NEURAL_LINK),
        }
    }

    /// Attaches a learner identity. Remote sync is driven separately.
    pub fn sign_in(&mut self, user: UserProfile) {
        let message = format!("NEURAL LINK ESTABLISHED: {}", user.email);
        info!(user_id = %user.id, "Learner signed in");
        self.state.user = Some(user);
        self.log(MessageType::Success, message);
    }

    /// Detaches the learner identity.
    pub fn sign_out(&mut self) {
        self.state.user = None;
        self.log(MessageType::System, "DISCONNECTED FROM CLOUD.");
    }

    /// Adopts a remote save that is ahead of this session.
    ///
    /// XP keeps the larger value and achievements are merged, so neither
    /// shrinks. The signed-in identity is kept.
    pub fn adopt_remote(&mut self, record: SaveRecord) -> Result<()> {
        let last = self.catalog.last_id();
        let level_id = record.current_level_id.clamp(1, last);
        let level = self.catalog.level(level_id)?;
        let max_reached = record
            .max_reached()
            .max(level_id)
            .min(last)
            .max(self.state.max_reached_level);

        self.credit_pending_xp();
        self.scheduler.cancel_all();
        self.state.current_level_id = level.id;
        self.state.max_reached_level = max_reached;
        self.state.xp = self.state.xp.max(record.xp);
        self.state.skill_level = record.skill_level;
        if !record.code.is_empty() {
            self.state.code = record.code;
        }
        self.state.hints_used = record.hints_used;
        self.state.assessment_complete = true;
        self.state.level_complete = false;
        self.state.status = RunStatus::Idle;
        self.state.story = None;
        self.set_phase(TutorialPhase::Standard);
        self.set_tier(0);
        for id in &record.unlocked_achievements {
            achievements::unlock(&mut self.state.unlocked_achievements, id);
        }

        self.emit(SessionEvent::level_changed(level.id, max_reached));
        let code = self.state.code.clone();
        self.emit(SessionEvent::code_changed(code));
        self.log(
            MessageType::Success,
            format!("DATA RESTORED FROM CLOUD. SECTOR {max_reached} UNLOCKED."),
        );
        self.evaluate_progress();
        self.sync_idle();
        Ok(())
    }

    /// Wipes all progress and starts over on level 1.
    pub fn reset_progress(&mut self) -> Result<()> {
        let fresh = Self::new(self.config.clone(), self.catalog)?;
        self.scheduler.cancel_all();
        self.state = fresh.state;
        self.level_started_at = self.scheduler.now();
        self.demo_typed = 0;
        self.pending_xp = 0;
        self.saved = None;
        self.generation += 1;
        self.emit(SessionEvent::level_changed(1, 1));
        self.emit(SessionEvent::phase_changed(TutorialPhase::Standard));
        self.emit(SessionEvent::hint_tier_changed(0));
        self.emit(SessionEvent::story_changed(self.state.story.clone()));
        self.emit(SessionEvent::code_changed(self.state.code.clone()));
        info!("Progress reset");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Persistence hooks
    // ------------------------------------------------------------------------

    /// The persistable subset of the state.
    #[must_use]
    pub fn to_save_record(&self) -> SaveRecord {
        SaveRecord {
            current_level_id: self.state.current_level_id,
            max_reached_level: Some(self.state.max_reached_level),
            xp: self.state.xp,
            skill_level: self.state.skill_level,
            code: self.state.code.clone(),
            hints_used: self.state.hints_used,
            assessment_complete: self.state.assessment_complete,
            tutorial_phase: self.state.tutorial_phase,
            unlocked_achievements: self.state.unlocked_achievements.clone(),
            user: self.state.user.clone(),
        }
    }

    /// Returns a record to save if progress changed since the last call.
    ///
    /// A session that has made no progress at all is never saved.
    pub fn take_save_request(&mut self) -> Option<SaveRecord> {
        let state = &self.state;
        let has_progress = state.current_level_id > 1
            || state.xp > 0
            || !state.unlocked_achievements.is_empty();
        let fingerprint = self.fingerprint();
        if !has_progress || self.saved.as_ref() == Some(&fingerprint) {
            return None;
        }
        self.saved = Some(fingerprint);
        Some(self.to_save_record())
    }

    /// Forgets the last save so the next request writes again.
    ///
    /// Called when a write taken from [`Session::take_save_request`] failed.
    pub fn mark_unsaved(&mut self) {
        self.saved = None;
    }

    /// Counts full resets. A record taken under an older generation must
    /// not be written.
    #[must_use]
    pub const fn save_generation(&self) -> u64 {
        self.generation
    }

    /// Appends a console line.
    pub fn log(&mut self, kind: MessageType, content: impl Into<String>) {
        let entry = LogEntry {
            id: self.next_log_id,
            kind,
            content: content.into(),
            timestamp: Utc::now(),
        };
        self.next_log_id += 1;
        self.state.logs.push(entry.clone());
        self.emit(SessionEvent::log(entry));
    }

    // ------------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------------

    /// Moves session time forward, firing every timer that falls due.
    pub fn advance(&mut self, elapsed: Duration) -> Result<()> {
        let target = self.scheduler.now() + elapsed;
        while let Some(timer) = self.scheduler.pop_due(target) {
            self.fire(timer.kind)?;
        }
        self.scheduler.set_now(target);
        Ok(())
    }

    fn fire(&mut self, kind: TimerKind) -> Result<()> {
        match kind {
            TimerKind::IdleTick => self.idle_tick(),
            TimerKind::PendingRun => self.finish_run()?,
            TimerKind::DemoKeystroke => self.demo_keystroke(),
            TimerKind::DemoRun => {
                self.state.status = RunStatus::Running;
                self.scheduler
                    .schedule(TimerKind::DemoVerdict, self.config.run_delay());
                self.scheduler.schedule(
                    TimerKind::DemoHandoff,
                    Duration::from_millis(self.config.demo_handoff_delay_ms),
                );
            }
            TimerKind::DemoVerdict => {
                self.state.status = RunStatus::Idle;
                self.log(MessageType::System, format!("OUTPUT: {DEMO_OUTPUT}"));
            }
            TimerKind::DemoHandoff => {
                self.set_phase(TutorialPhase::GuidedPractice);
                self.set_code(String::new());
                self.log(MessageType::System, GUIDED_PROMPT);
                self.sync_idle();
            }
            TimerKind::StoryReveal => self.reveal_completion_story()?,
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    fn enter_level(&mut self, id: u32) -> Result<()> {
        let level = self.catalog.level(id)?;
        self.credit_pending_xp();
        self.scheduler.cancel_all();

        let state = &mut self.state;
        state.current_level_id = level.id;
        state.level_complete = false;
        state.status = RunStatus::Idle;
        state.hints_used = 0;
        state.idle_seconds = 0;
        state.failed_attempts = 0;
        state.logs.clear();
        state.story = Some(StoryOverlay::from_segments(level.story_start));
        self.level_started_at = self.scheduler.now();
        self.demo_typed = 0;

        let max_reached = self.state.max_reached_level;
        self.emit(SessionEvent::level_changed(level.id, max_reached));
        self.emit(SessionEvent::story_changed(self.state.story.clone()));
        self.set_code(level.seed_for(self.state.skill_level).to_string());
        self.set_phase(TutorialPhase::Standard);
        self.set_tier(0);
        info!(level_id = level.id, max_reached, "Entered level");

        self.evaluate_progress();
        self.sync_idle();
        Ok(())
    }

    fn start_demonstration(&mut self) {
        self.set_phase(TutorialPhase::Demonstration);
        self.state.logs.clear();
        self.set_code(String::new());
        self.log(MessageType::System, DEMO_INTRO);
        self.demo_typed = 0;
        self.scheduler.schedule(
            TimerKind::DemoKeystroke,
            Duration::from_millis(self.config.typing_interval_ms),
        );
    }

    fn demo_keystroke(&mut self) {
        let total = DEMO_SNIPPET.chars().count();
        self.demo_typed = (self.demo_typed + 1).min(total);
        self.set_code(DEMO_SNIPPET.chars().take(self.demo_typed).collect());
        if self.demo_typed < total {
            self.scheduler.schedule(
                TimerKind::DemoKeystroke,
                Duration::from_millis(self.config.typing_interval_ms),
            );
        } else {
            self.scheduler.schedule(
                TimerKind::DemoRun,
                Duration::from_millis(self.config.demo_run_delay_ms),
            );
        }
    }

    fn finish_run(&mut self) -> Result<()> {
        let level = self.level()?;

        if self.state.tutorial_phase == TutorialPhase::GuidedPractice
            && tutorial::is_guided_snippet(&self.state.code)
        {
            self.set_phase(TutorialPhase::Independent);
            self.set_code(String::new());
            self.log(MessageType::Success, INDEPENDENT_PRAISE);
            self.log(MessageType::System, INDEPENDENT_OBJECTIVE);
            self.state.status = RunStatus::Idle;
            self.sync_idle();
            return Ok(());
        }

        let verdict = run_level(&self.state.code, level);
        self.emit(SessionEvent::verdict(level.id, verdict.clone()));
        if verdict.success {
            self.on_success(level, &verdict);
        } else {
            self.on_failure(&verdict);
        }
        Ok(())
    }

    fn on_success(&mut self, level: &Level, verdict: &Verdict) {
        self.state.status = RunStatus::Success;
        self.state.level_complete = true;
        self.log(MessageType::Success, verdict.message.clone());
        if let Some(output) = &verdict.output {
            self.log(MessageType::System, format!("OUTPUT: {output}"));
        }

        if self.state.hints_used == 0 && self.state.active_hint_tier == 0 {
            self.unlock(PURE_CODER);
            self.state.clean_streak += 1;
            if self.state.clean_streak >= self.config.clean_streak_for_achievement {
                self.unlock(PERFECTIONIST);
            }
        } else {
            self.state.clean_streak = 0;
        }

        let elapsed = self.scheduler.now().saturating_sub(self.level_started_at);
        if elapsed < Duration::from_secs(self.config.speed_run_seconds) {
            self.unlock(SPEED_DEMON);
        }

        self.pending_xp =
            completion_xp(&self.config, self.state.skill_level, self.state.hints_used);
        info!(
            level_id = level.id,
            xp = self.pending_xp,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Level complete"
        );
        self.scheduler.schedule(
            TimerKind::StoryReveal,
            Duration::from_millis(self.config.story_reveal_delay_ms),
        );
        self.sync_idle();
    }

    fn on_failure(&mut self, verdict: &Verdict) {
        self.state.status = RunStatus::Failed;
        self.log(MessageType::Error, verdict.message.clone());
        self.state.failed_attempts += 1;
        if self.state.failed_attempts >= self.config.fail_streak_for_achievement {
            self.unlock(SYNTAX_ERROR);
        }
        if self.state.skill_level == SkillLevel::Beginner {
            self.set_tier(self.state.active_hint_tier.max(2));
        }
    }

    fn reveal_completion_story(&mut self) -> Result<()> {
        let level = self.level()?;
        self.state.story = Some(StoryOverlay::from_segments(level.story_end));
        self.emit(SessionEvent::story_changed(self.state.story.clone()));
        self.credit_pending_xp();
        self.sync_idle();
        Ok(())
    }

    /// Credits XP held back for the completion story.
    ///
    /// Runs on reveal, and before anything that cancels the reveal, so a
    /// passed level is always paid exactly once.
    fn credit_pending_xp(&mut self) {
        let amount = std::mem::take(&mut self.pending_xp);
        if amount == 0 {
            return;
        }
        self.state.xp = self.state.xp.saturating_add(amount);
        self.emit(SessionEvent::xp_awarded(amount, self.state.xp));
    }

    fn idle_tick(&mut self) {
        self.state.idle_seconds = self.state.idle_seconds.saturating_add(1);
        let ladder = self.config.idle_thresholds.ladder(self.state.skill_level);
        if let Some(rung) = tutorial::idle_hint_tier(&ladder, self.state.idle_seconds) {
            if rung > self.state.active_hint_tier {
                debug!(tier = rung, idle = self.state.idle_seconds, "Idle hint");
                self.set_tier(rung);
            }
        }
        self.scheduler
            .schedule(TimerKind::IdleTick, self.config.idle_tick());
    }

    /// Starts or stops idle tracking to match the current state.
    fn sync_idle(&mut self) {
        let state = &self.state;
        let tracking = state.assessment_complete
            && state.story.is_none()
            && !state.level_complete
            && state.tutorial_phase.allows_idle_hints();
        if !tracking {
            self.scheduler.cancel(TimerKind::IdleTick);
        } else if !self.scheduler.is_scheduled(TimerKind::IdleTick) {
            self.scheduler
                .schedule(TimerKind::IdleTick, self.config.idle_tick());
        }
    }

    fn evaluate_progress(&mut self) {
        if self.state.current_level_id > 1 {
            self.unlock(FIRST_STEPS);
        }
        for (id, threshold) in achievements::milestones(self.catalog.last_id()) {
            if self.state.max_reached_level >= threshold {
                self.unlock(id);
            }
        }
    }

    fn unlock(&mut self, id: &'static str) {
        if achievements::unlock(&mut self.state.unlocked_achievements, id) {
            let title = achievements::find(id).map_or(id, |achievement| achievement.title);
            info!(achievement = id, "Achievement unlocked");
            self.emit(SessionEvent::achievement_unlocked(id, title));
        }
    }

    fn set_phase(&mut self, phase: TutorialPhase) {
        if self.state.tutorial_phase != phase {
            debug!(from = %self.state.tutorial_phase, to = %phase, "Tutorial phase changed");
            self.state.tutorial_phase = phase;
            self.emit(SessionEvent::phase_changed(phase));
        }
    }

    fn set_tier(&mut self, tier: u8) {
        if self.state.active_hint_tier != tier {
            self.state.active_hint_tier = tier;
            self.emit(SessionEvent::hint_tier_changed(tier));
        }
    }

    fn set_code(&mut self, code: String) {
        self.state.code.clone_from(&code);
        self.emit(SessionEvent::code_changed(code));
    }

    fn emit(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    fn fingerprint(&self) -> Fingerprint {
        let state = &self.state;
        Fingerprint {
            level: state.current_level_id,
            max: state.max_reached_level,
            xp: state.xp,
            skill: state.skill_level,
            user: state.user.as_ref().map(|user| user.id.clone()),
            achievements: state.unlocked_achievements.len(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
