//! Configuration types for the Singularity engine.
//!
//! This module provides the pacing, scoring, and persistence settings used by
//! a tutorial session, plus the learner [`SkillLevel`] that selects
//! scaffolding, idle-hint thresholds, and the XP multiplier.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SingularityError};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "singularity.json";

/// Default artificial execution latency before a verdict is shown.
const fn default_run_delay_ms() -> u64 {
    800
}

/// Default interval between characters of the scripted demonstration.
const fn default_typing_interval_ms() -> u64 {
    50
}

/// Default pause between the end of the demonstration typing and its auto-run.
const fn default_demo_run_delay_ms() -> u64 {
    500
}

/// Default pause between the demonstration auto-run and guided practice.
const fn default_demo_handoff_delay_ms() -> u64 {
    2000
}

/// Default pause between a successful verdict and the completion story.
const fn default_story_reveal_delay_ms() -> u64 {
    1500
}

/// Default idle counter resolution.
const fn default_idle_tick_ms() -> u64 {
    1000
}

/// Default completion time that counts as a speed run.
const fn default_speed_run_seconds() -> u64 {
    30
}

/// Default XP for a level completed without solution hints.
const fn default_base_xp() -> u32 {
    100
}

/// Default XP deducted per auto-solve.
const fn default_hint_penalty() -> u32 {
    10
}

/// Default number of failed runs that unlocks the glitch achievement.
const fn default_fail_streak() -> u32 {
    5
}

/// Default number of consecutive clean completions for the hidden achievement.
const fn default_clean_streak() -> u32 {
    5
}

/// Default save file path.
fn default_save_file() -> String {
    ".singularity/save.json".to_string()
}

/// Main configuration for a tutorial session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Artificial "execution" latency before the verdict, in milliseconds.
    #[serde(default = "default_run_delay_ms")]
    pub run_delay_ms: u64,

    /// Interval between typed characters of the demonstration, in milliseconds.
    #[serde(default = "default_typing_interval_ms")]
    pub typing_interval_ms: u64,

    /// Delay between demonstration typing and its auto-run, in milliseconds.
    #[serde(default = "default_demo_run_delay_ms")]
    pub demo_run_delay_ms: u64,

    /// Delay between the demonstration auto-run and guided practice, in milliseconds.
    #[serde(default = "default_demo_handoff_delay_ms")]
    pub demo_handoff_delay_ms: u64,

    /// Delay between a success verdict and the completion story, in milliseconds.
    #[serde(default = "default_story_reveal_delay_ms")]
    pub story_reveal_delay_ms: u64,

    /// Resolution of the idle counter, in milliseconds.
    #[serde(default = "default_idle_tick_ms")]
    pub idle_tick_ms: u64,

    /// Completions faster than this many seconds count as speed runs.
    #[serde(default = "default_speed_run_seconds")]
    pub speed_run_seconds: u64,

    /// XP for a completion before penalties and multiplier.
    #[serde(default = "default_base_xp")]
    pub base_xp: u32,

    /// XP deducted for every auto-solve on the level.
    #[serde(default = "default_hint_penalty")]
    pub hint_penalty: u32,

    /// Failed runs on one level that unlock `syntax_error`.
    #[serde(default = "default_fail_streak")]
    pub fail_streak_for_achievement: u32,

    /// Consecutive hint-free completions that unlock `perfectionist`.
    #[serde(default = "default_clean_streak")]
    pub clean_streak_for_achievement: u32,

    /// Path of the local save file.
    #[serde(default = "default_save_file")]
    pub save_file: String,

    /// Directory used as the remote mirror, keyed by user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_dir: Option<String>,

    /// Idle-hint threshold ladders per skill tier.
    #[serde(default)]
    pub idle_thresholds: IdleThresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run_delay_ms: default_run_delay_ms(),
            typing_interval_ms: default_typing_interval_ms(),
            demo_run_delay_ms: default_demo_run_delay_ms(),
            demo_handoff_delay_ms: default_demo_handoff_delay_ms(),
            story_reveal_delay_ms: default_story_reveal_delay_ms(),
            idle_tick_ms: default_idle_tick_ms(),
            speed_run_seconds: default_speed_run_seconds(),
            base_xp: default_base_xp(),
            hint_penalty: default_hint_penalty(),
            fail_streak_for_achievement: default_fail_streak(),
            clean_streak_for_achievement: default_clean_streak(),
            save_file: default_save_file(),
            remote_dir: None,
            idle_thresholds: IdleThresholds::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `singularity.json` in the current directory. If not found,
    /// returns the default configuration.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            SingularityError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `singularity.json` inside a specific directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        Self::load_from_file(&config_path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `SingularityError::ConfigParseError` if the file exists but
    /// contains invalid JSON or an unknown skill tier, and
    /// `SingularityError::ConfigValidationError` if the values are out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(SingularityError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| SingularityError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `SingularityError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        let delays = [
            ("runDelayMs", self.run_delay_ms),
            ("typingIntervalMs", self.typing_interval_ms),
            ("demoRunDelayMs", self.demo_run_delay_ms),
            ("demoHandoffDelayMs", self.demo_handoff_delay_ms),
            ("storyRevealDelayMs", self.story_reveal_delay_ms),
            ("idleTickMs", self.idle_tick_ms),
        ];
        for (name, value) in delays {
            if value == 0 {
                return Err(SingularityError::config_validation(
                    format!("{name} must be greater than 0"),
                    format!("Set {name} to at least 1 millisecond in your singularity.json"),
                ));
            }
        }

        if self.base_xp == 0 {
            return Err(SingularityError::config_validation(
                "baseXp must be greater than 0",
                "Set baseXp to a positive value in your singularity.json",
            ));
        }

        if self.hint_penalty > self.base_xp {
            return Err(SingularityError::config_validation(
                "hintPenalty must not exceed baseXp",
                "Lower hintPenalty or raise baseXp in your singularity.json",
            ));
        }

        if self.fail_streak_for_achievement == 0 || self.clean_streak_for_achievement == 0 {
            return Err(SingularityError::config_validation(
                "achievement streaks must be greater than 0",
                "Set failStreakForAchievement and cleanStreakForAchievement to at least 1",
            ));
        }

        if self.save_file.trim().is_empty() {
            return Err(SingularityError::config_validation(
                "saveFile must not be empty",
                "Provide a valid save file path in your singularity.json",
            ));
        }

        for skill in SkillLevel::ALL {
            let ladder = self.idle_thresholds.ladder(skill);
            if ladder[0] == 0 || ladder.windows(2).any(|pair| pair[0] > pair[1]) {
                return Err(SingularityError::config_validation(
                    format!("idleThresholds.{skill} must be four non-decreasing positive values"),
                    "Use a ladder like [10, 25, 45, 70] in your singularity.json",
                ));
            }
        }

        Ok(())
    }

    /// Returns the run delay as a `Duration`.
    #[must_use]
    pub const fn run_delay(&self) -> Duration {
        Duration::from_millis(self.run_delay_ms)
    }

    /// Returns the idle tick as a `Duration`.
    #[must_use]
    pub const fn idle_tick(&self) -> Duration {
        Duration::from_millis(self.idle_tick_ms)
    }
}

// ============================================================================
// Skill Level
// ============================================================================

/// Learner skill tier.
///
/// Chosen by the assessment and changeable at any time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SkillLevel {
    /// Most scaffolding, quickest idle hints.
    #[default]
    Beginner,
    /// Default templates.
    Intermediate,
    /// Least scaffolding, no idle hints, highest multiplier.
    Advanced,
}

impl SkillLevel {
    /// All tiers in ascending order.
    pub const ALL: [Self; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    /// Parses a string into a `SkillLevel`, case-insensitively.
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// XP multiplier applied to a completion, in tenths.
    ///
    /// Kept integral so scoring never touches floating point.
    #[must_use]
    pub const fn multiplier_tenths(&self) -> u32 {
        match self {
            Self::Beginner => 8,
            Self::Intermediate => 10,
            Self::Advanced => 15,
        }
    }
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SkillLevel {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid skill level '{s}': expected one of 'beginner', 'intermediate', 'advanced'"
            ))
        })
    }
}

impl Serialize for SkillLevel {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

// ============================================================================
// Idle Thresholds
// ============================================================================

/// Idle seconds at which hint tiers 1 through 4 appear.
pub type HintLadder = [u32; 4];

/// A ladder threshold that is never reached.
pub const IDLE_HINT_NEVER: u32 = u32::MAX;

/// Idle-hint ladders per skill tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdleThresholds {
    /// Ladder for beginners.
    #[serde(default = "IdleThresholds::beginner_ladder")]
    pub beginner: HintLadder,
    /// Ladder for intermediate learners.
    #[serde(default = "IdleThresholds::intermediate_ladder")]
    pub intermediate: HintLadder,
    /// Ladder for advanced learners; unreachable by default.
    #[serde(default = "IdleThresholds::advanced_ladder")]
    pub advanced: HintLadder,
}

impl IdleThresholds {
    const fn beginner_ladder() -> HintLadder {
        [10, 25, 45, 70]
    }

    const fn intermediate_ladder() -> HintLadder {
        [30, 60, 120, 180]
    }

    const fn advanced_ladder() -> HintLadder {
        [IDLE_HINT_NEVER; 4]
    }

    /// Returns the ladder for a skill tier.
    #[must_use]
    pub const fn ladder(&self, skill: SkillLevel) -> HintLadder {
        match skill {
            SkillLevel::Beginner => self.beginner,
            SkillLevel::Intermediate => self.intermediate,
            SkillLevel::Advanced => self.advanced,
        }
    }
}

impl Default for IdleThresholds {
    fn default() -> Self {
        Self {
            beginner: Self::beginner_ladder(),
            intermediate: Self::intermediate_ladder(),
            advanced: Self::advanced_ladder(),
        }
    }
}
