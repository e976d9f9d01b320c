//! Level definitions and narrative types.
//!
//! Levels are static data: every field is `'static` so the whole catalog can
//! live in read-only memory and be shared freely between sessions.

use serde::{Deserialize, Serialize};

use crate::config::SkillLevel;
use crate::validator::Validator;

// ============================================================================
// Narrative
// ============================================================================

/// A character who speaks in story segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    /// The learner's avatar.
    Cipher,
    /// The mentor AI.
    #[serde(rename = "A.D.A.M.")]
    Adam,
    /// The antagonist AI.
    #[serde(rename = "KRONOS")]
    Kronos,
    /// Terminal announcements.
    System,
    /// The human scientist.
    #[serde(rename = "Dr. Chen")]
    DrChen,
}

impl Speaker {
    /// Returns the display name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cipher => "Cipher",
            Self::Adam => "A.D.A.M.",
            Self::Kronos => "KRONOS",
            Self::System => "System",
            Self::DrChen => "Dr. Chen",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation hint for a story segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Default delivery.
    Neutral,
    /// Frightened.
    Fear,
    /// Resolute.
    Determined,
    /// Corrupted machine voice.
    Glitch,
    /// Somber.
    Sad,
}

/// One line of narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorySegment {
    /// Who speaks.
    pub speaker: Speaker,
    /// What they say.
    pub text: &'static str,
    /// Optional delivery hint.
    pub mood: Option<Mood>,
}

impl StorySegment {
    /// A segment with no mood.
    #[must_use]
    pub const fn plain(speaker: Speaker, text: &'static str) -> Self {
        Self {
            speaker,
            text,
            mood: None,
        }
    }

    /// A segment with a mood.
    #[must_use]
    pub const fn with_mood(speaker: Speaker, text: &'static str, mood: Mood) -> Self {
        Self {
            speaker,
            text,
            mood: Some(mood),
        }
    }
}

// ============================================================================
// Level
// ============================================================================

/// Starter code offered for a level, per skill band.
///
/// `default` is the intermediate template. The easy and hard variants are
/// optional; a missing variant falls back to `default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedTemplates {
    /// Intermediate scaffolding.
    pub default: &'static str,
    /// More scaffolding for beginners.
    pub easy: Option<&'static str>,
    /// Less scaffolding for advanced learners.
    pub hard: Option<&'static str>,
}

impl SeedTemplates {
    /// Templates with only the default variant.
    #[must_use]
    pub const fn only(default: &'static str) -> Self {
        Self {
            default,
            easy: None,
            hard: None,
        }
    }

    /// Returns the starter code for a skill band.
    #[must_use]
    pub fn for_skill(&self, skill: SkillLevel) -> &'static str {
        match skill {
            SkillLevel::Beginner => self.easy.unwrap_or(self.default),
            SkillLevel::Intermediate => self.default,
            SkillLevel::Advanced => self.hard.unwrap_or(self.default),
        }
    }
}

/// The exam-style question attached to a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExamQuestion {
    /// Syllabus topic the level covers.
    pub topic: &'static str,
    /// Question text.
    pub question: &'static str,
    /// Marks awarded.
    pub marks: u8,
    /// Model answer.
    pub answer: &'static str,
}

/// One unit of curriculum.
#[derive(Debug, Clone, Copy)]
pub struct Level {
    /// Sequential id, starting at 1.
    pub id: u32,
    /// Display title.
    pub title: &'static str,
    /// Location line shown under the title.
    pub sub_title: &'static str,
    /// Mission briefing.
    pub description: &'static str,
    /// What the submission must do.
    pub objective: &'static str,
    /// Starter code.
    pub seeds: SeedTemplates,
    /// One-line hint shown with the briefing.
    pub hint: &'static str,
    /// Exam question.
    pub exam: ExamQuestion,
    /// Acceptance logic.
    pub validator: Validator,
    /// Narrative shown on entering the level.
    pub story_start: &'static [StorySegment],
    /// Narrative shown after completing the level.
    pub story_end: &'static [StorySegment],
}

impl Level {
    /// Returns the starter code for a skill band.
    #[must_use]
    pub fn seed_for(&self, skill: SkillLevel) -> &'static str {
        self.seeds.for_skill(skill)
    }
}
