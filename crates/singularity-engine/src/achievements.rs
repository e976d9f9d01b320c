//! Achievement catalog and unlock bookkeeping.
//!
//! Unlocked ids are stored as plain strings so saves written by other
//! versions, including ids this build no longer ships, load without error.

use serde::Serialize;

/// Complete level 1.
pub const FIRST_STEPS: &str = "first_steps";
/// Reach level 5.
pub const SCRIPT_KIDDIE: &str = "script_kiddie";
/// Reach level 10.
pub const HACKER: &str = "hacker";
/// Reach level 20.
pub const ARCHITECT: &str = "architect";
/// Reach the final level.
pub const SAVIOR: &str = "savior";
/// Complete a level without hints.
pub const PURE_CODER: &str = "pure_coder";
/// Several hint-free completions in a row.
pub const PERFECTIONIST: &str = "perfectionist";
/// Open the code vault.
pub const CURIOUS_MIND: &str = "curious_mind";
/// Open the mentor chat.
pub const NEURAL_LINK: &str = "neural_link";
/// Fail one level repeatedly.
pub const SYNTAX_ERROR: &str = "syntax_error";
/// Complete a level quickly.
pub const SPEED_DEMON: &str = "speed_demon";

/// Display data for an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    /// Stable identifier.
    pub id: &'static str,
    /// Display title.
    pub title: &'static str,
    /// Unlock condition as shown to the learner.
    pub description: &'static str,
    /// Display glyph.
    pub icon: &'static str,
    /// Hidden achievements keep their description secret until unlocked.
    pub is_hidden: bool,
}

const fn achievement(
    id: &'static str,
    title: &'static str,
    description: &'static str,
    icon: &'static str,
    is_hidden: bool,
) -> Achievement {
    Achievement {
        id,
        title,
        description,
        icon,
        is_hidden,
    }
}

/// Every shipped achievement.
pub static ACHIEVEMENTS: [Achievement; 11] = [
    achievement(FIRST_STEPS, "Hello World", "Complete the first level.", "🌱", false),
    achievement(SCRIPT_KIDDIE, "Script Kiddie", "Reach Level 5.", "💻", false),
    achievement(HACKER, "Hacker", "Reach Level 10.", "🔓", false),
    achievement(ARCHITECT, "System Architect", "Reach Level 20.", "🏗️", false),
    achievement(SAVIOR, "The Savior", "Complete the game (Level 41).", "🏆", false),
    achievement(PURE_CODER, "Pure Coder", "Complete a level without using any hints.", "🧠", false),
    achievement(PERFECTIONIST, "Perfectionist", "Complete 5 levels in a row without hints.", "✨", true),
    achievement(CURIOUS_MIND, "Curious Mind", "Open the Code Vault for the first time.", "📚", false),
    achievement(NEURAL_LINK, "Neural Link", "Initiate a chat with A.D.A.M.", "💬", false),
    achievement(SYNTAX_ERROR, "Glitch in the Matrix", "Fail a level execution 5 times.", "👾", true),
    achievement(SPEED_DEMON, "Overclocked", "Complete a level in under 30 seconds.", "⚡", true),
];

/// Looks up an achievement by id.
#[must_use]
pub fn find(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|achievement| achievement.id == id)
}

/// Achievements earned by the high-water mark, with the level that earns them.
///
/// `first_steps` is not listed: it follows the current level instead.
/// `savior` is keyed to the final level, passed in by the caller.
#[must_use]
pub const fn milestones(final_level: u32) -> [(&'static str, u32); 4] {
    [
        (SCRIPT_KIDDIE, 5),
        (HACKER, 10),
        (ARCHITECT, 20),
        (SAVIOR, final_level),
    ]
}

/// Adds `id` to `unlocked` if absent. Returns `true` on a fresh unlock.
pub fn unlock(unlocked: &mut Vec<String>, id: &str) -> bool {
    if unlocked.iter().any(|existing| existing == id) {
        return false;
    }
    unlocked.push(id.to_string());
    true
}
