//! Tutorial phases and the deterministic timer queue.
//!
//! Level 1 can run a scripted "I do, we do, you do" sequence:
//!
//! - `Demonstration` types [`DEMO_SNIPPET`] into a read-only editor and runs it
//! - `GuidedPractice` waits for the learner to type [`GUIDED_SNIPPET`]
//! - `Independent` hands over to the level's own validator
//!
//! Every delayed effect in a session (idle ticks, pending runs, the
//! demonstration script, story reveal) is a [`Timer`] in a [`Scheduler`].
//! Time only moves when the owner calls [`Scheduler::pop_due`], so tests
//! drive the whole sequence without sleeping.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{HintLadder, IDLE_HINT_NEVER};
use crate::normalize::{Submission, View};

/// Snippet typed by the demonstration.
pub const DEMO_SNIPPET: &str = "print(\"System booting...\")";

/// Simulated output of the demonstration run.
pub const DEMO_OUTPUT: &str = "System booting...";

/// Snippet the learner must type during guided practice.
pub const GUIDED_SNIPPET: &str = "print(\"POWER_CORE_ONLINE\")";

/// Logged when the demonstration starts.
pub const DEMO_INTRO: &str = "A.D.A.M.: Watch closely. I will demonstrate the print command.";

/// Logged when guided practice starts.
pub const GUIDED_PROMPT: &str = "A.D.A.M.: Now you try. Type: print(\"POWER_CORE_ONLINE\")";

/// Logged when the guided snippet is accepted.
pub const INDEPENDENT_PRAISE: &str =
    "A.D.A.M.: Excellent syntax. Now apply it to the mission objective.";

/// Logged after [`INDEPENDENT_PRAISE`] with the real objective.
pub const INDEPENDENT_OBJECTIVE: &str = "MISSION UPDATE: Print \"SYSTEM ONLINE\" to finish.";

// ============================================================================
// TutorialPhase
// ============================================================================

/// Where the learner is in the scripted level-1 sequence.
///
/// Transitions:
/// - `Standard` -> `Demonstration` (assessment finished below advanced, on level 1)
/// - `Demonstration` -> `GuidedPractice` (script finished)
/// - `GuidedPractice` -> `Independent` (guided snippet run)
/// - any -> `Standard` (level change)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TutorialPhase {
    /// No scripted guidance.
    #[default]
    #[serde(rename = "NONE")]
    Standard,
    /// The system types and runs the demo snippet.
    #[serde(rename = "IDO")]
    Demonstration,
    /// The learner must type the guided snippet.
    #[serde(rename = "WEDO")]
    GuidedPractice,
    /// The learner attempts the real objective.
    #[serde(rename = "YOUDO")]
    Independent,
}

impl TutorialPhase {
    /// Returns the wire name.
    ///
    /// # Examples
    ///
    /// ```
    /// use singularity_engine::TutorialPhase;
    ///
    /// assert_eq!(TutorialPhase::Demonstration.as_str(), "IDO");
    /// assert_eq!(TutorialPhase::default().as_str(), "NONE");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "NONE",
            Self::Demonstration => "IDO",
            Self::GuidedPractice => "WEDO",
            Self::Independent => "YOUDO",
        }
    }

    /// Returns `true` while the editor is read-only.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self, Self::Demonstration)
    }

    /// Returns `true` if idle time may escalate hints in this phase.
    #[must_use]
    pub const fn allows_idle_hints(&self) -> bool {
        matches!(self, Self::Standard | Self::Independent)
    }
}

impl std::fmt::Display for TutorialPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `true` if `code` contains the guided snippet, ignoring whitespace
/// and quote style.
#[must_use]
pub fn is_guided_snippet(code: &str) -> bool {
    let needle = Submission::new(GUIDED_SNIPPET);
    Submission::new(code)
        .view(View::Stripped)
        .contains(needle.view(View::Stripped))
}

/// Returns the hint tier whose threshold is exactly `idle_ticks`.
///
/// Equality, not `>=`: each rung fires once per idle streak. When rungs
/// share a value the highest tier wins. A rung set to [`IDLE_HINT_NEVER`]
/// never fires.
///
/// # Examples
///
/// ```
/// use singularity_engine::tutorial::idle_hint_tier;
///
/// let ladder = [10, 25, 45, 70];
/// assert_eq!(idle_hint_tier(&ladder, 25), Some(2));
/// assert_eq!(idle_hint_tier(&ladder, 26), None);
/// ```
#[must_use]
pub fn idle_hint_tier(ladder: &HintLadder, idle_ticks: u32) -> Option<u8> {
    (1u8..)
        .zip(ladder.iter())
        .filter(|(_, threshold)| **threshold == idle_ticks && **threshold != IDLE_HINT_NEVER)
        .map(|(tier, _)| tier)
        .last()
}

// ============================================================================
// Scheduler
// ============================================================================

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Advance the idle counter by one tick.
    IdleTick,
    /// Deliver the verdict for a learner run.
    PendingRun,
    /// Type the next demonstration character.
    DemoKeystroke,
    /// Start the demonstration run.
    DemoRun,
    /// Finish the demonstration run.
    DemoVerdict,
    /// Hand the editor to the learner.
    DemoHandoff,
    /// Open the completion story and credit XP.
    StoryReveal,
}

/// A scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    /// Monotonic id, used to order timers due at the same instant.
    pub id: u64,
    /// Callback kind.
    pub kind: TimerKind,
    /// Session time at which the timer fires.
    pub due: Duration,
}

/// Virtual clock plus the set of pending timers.
///
/// At most one timer of each kind is pending: scheduling a kind replaces
/// the previous one, so repeating timers can never double-tick.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: Duration,
    next_id: u64,
    timers: Vec<Timer>,
}

impl Scheduler {
    /// Creates an empty scheduler at time zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            timers: Vec::new(),
        }
    }

    /// Current session time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Schedules `kind` to fire `delay` from now, replacing any pending timer
    /// of the same kind. Returns the timer id.
    pub fn schedule(&mut self, kind: TimerKind, delay: Duration) -> u64 {
        self.cancel(kind);
        let id = self.next_id;
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            kind,
            due: self.now + delay,
        });
        id
    }

    /// Cancels the pending timer of `kind`. Returns `true` if one existed.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.kind != kind);
        self.timers.len() != before
    }

    /// Cancels every pending timer.
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// Returns `true` if a timer of `kind` is pending.
    #[must_use]
    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.timers.iter().any(|timer| timer.kind == kind)
    }

    /// Number of pending timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Removes and returns the earliest timer due at or before `until`,
    /// moving the clock to its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<Timer> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= until)
            .min_by_key(|(_, timer)| (timer.due, timer.id))
            .map(|(index, _)| index)?;
        let timer = self.timers.swap_remove(index);
        self.now = self.now.max(timer.due);
        Some(timer)
    }

    /// Moves the clock forward to `now`. The clock never runs backwards.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}
