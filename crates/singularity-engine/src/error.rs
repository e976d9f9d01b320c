//! Error types for the Singularity engine.
//!
//! This module defines the error hierarchy for configuration loading,
//! catalog assembly, session transitions, and save persistence. Validation
//! failures are not errors: a rejected submission is an ordinary
//! [`Verdict`](crate::Verdict).

use std::path::PathBuf;

/// A specialized `Result` type for Singularity engine operations.
pub type Result<T> = std::result::Result<T, SingularityError>;

/// Errors that can occur while running a tutorial session.
///
/// Error variants are organized by subsystem and include actionable suggestions
/// where possible to help users resolve issues.
#[derive(Debug, thiserror::Error)]
pub enum SingularityError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your singularity.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Catalog Errors
    // ========================================================================
    /// The level list or hint table is malformed.
    ///
    /// Raised once when the catalog is assembled; never mid-session.
    #[error("Level catalog is inconsistent: {message}\n\nSuggestion: Fix the level or hint definitions before starting a session")]
    CatalogInconsistency {
        /// Description of the inconsistency.
        message: String,
    },

    /// A validator pattern failed to compile.
    #[error("Invalid validator pattern '{pattern}': {message}")]
    PatternError {
        /// The offending pattern source.
        pattern: String,
        /// The compiler message.
        message: String,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// No level exists with the requested id.
    #[error("Unknown level {level_id}\n\nSuggestion: Pick a level between 1 and {max_level}")]
    UnknownLevel {
        /// The requested level id.
        level_id: u32,
        /// The highest level id in the catalog.
        max_level: u32,
    },

    /// The requested level has not been unlocked yet.
    #[error("Level {level_id} is locked (highest unlocked level is {max_reached})\n\nSuggestion: Complete the current level to unlock the next one")]
    LevelLocked {
        /// The requested level id.
        level_id: u32,
        /// The learner's high-water mark.
        max_reached: u32,
    },

    /// Hint tiers run from 1 to 4.
    #[error("Invalid hint tier {tier}\n\nSuggestion: Request a tier between 1 and 4")]
    InvalidHintTier {
        /// The requested tier.
        tier: u8,
    },

    /// A run was requested while another one is still pending.
    #[error("A run is already in progress\n\nSuggestion: Wait for the current verdict before running again")]
    RunInProgress,

    /// Invalid state transition attempted.
    #[error("Invalid state transition: cannot go from {from} to {to}")]
    InvalidStateTransition {
        /// The current state.
        from: String,
        /// The attempted target state.
        to: String,
    },

    // ========================================================================
    // Persistence Errors
    // ========================================================================
    /// Save file contains malformed JSON that cannot be recovered.
    #[error("Corrupted save file '{path}': {message}\n\nSuggestion: Remove the save file to start fresh, or restore from backup")]
    SaveCorrupted {
        /// Path to the corrupted save file.
        path: PathBuf,
        /// Description of the corruption.
        message: String,
    },

    /// Failed to write the save record.
    #[error("Failed to write save to '{path}': {message}\n\nSuggestion: Check write permissions and available disk space")]
    PersistenceError {
        /// Path where the save was to be written.
        path: PathBuf,
        /// Description of the write failure.
        message: String,
    },

    /// The remote mirror could not be read or written.
    #[error("Remote sync failed for user '{user_id}': {message}")]
    RemoteSyncError {
        /// The user whose record was being synced.
        user_id: String,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SingularityError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `CatalogInconsistency` error.
    #[must_use]
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::CatalogInconsistency {
            message: message.into(),
        }
    }

    /// Creates a new `PatternError` from a regex compile failure.
    #[must_use]
    pub fn pattern(pattern: impl Into<String>, err: &regex::Error) -> Self {
        Self::PatternError {
            pattern: pattern.into(),
            message: err.to_string(),
        }
    }

    /// Creates a new `UnknownLevel` error.
    #[must_use]
    pub const fn unknown_level(level_id: u32, max_level: u32) -> Self {
        Self::UnknownLevel {
            level_id,
            max_level,
        }
    }

    /// Creates a new `LevelLocked` error.
    #[must_use]
    pub const fn level_locked(level_id: u32, max_reached: u32) -> Self {
        Self::LevelLocked {
            level_id,
            max_reached,
        }
    }

    /// Creates a new `InvalidStateTransition` error.
    #[must_use]
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Creates a new `SaveCorrupted` error.
    #[must_use]
    pub fn save_corrupted(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SaveCorrupted {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `PersistenceError`.
    #[must_use]
    pub fn persistence(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::PersistenceError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `RemoteSyncError`.
    #[must_use]
    pub fn remote_sync(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteSyncError {
            user_id: user_id.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this error must stop startup.
    ///
    /// Only configuration and catalog problems are fatal; they are detected
    /// at load time, before any learner interaction.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError { .. }
                | Self::ConfigValidationError { .. }
                | Self::CatalogInconsistency { .. }
                | Self::PatternError { .. }
        )
    }

    /// Returns `true` if this error is reported to the learner log and play continues.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SaveCorrupted { .. }
                | Self::PersistenceError { .. }
                | Self::RemoteSyncError { .. }
                | Self::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = SingularityError::level_locked(7, 3);
        let msg = err.to_string();
        assert!(msg.contains("Level 7 is locked"));
        assert!(msg.contains("is 3"));
        assert!(msg.contains("Suggestion"));
    }

    #[test]
    fn test_unknown_level_mentions_range() {
        let err = SingularityError::unknown_level(99, 41);
        assert!(err.to_string().contains("between 1 and 41"));
    }

    #[test]
    fn test_is_fatal() {
        assert!(SingularityError::catalog("missing hints for level 4").is_fatal());
        assert!(SingularityError::config_validation("bad", "fix").is_fatal());
        assert!(!SingularityError::RunInProgress.is_fatal());
        assert!(!SingularityError::persistence("/tmp/save.json", "disk full").is_fatal());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(SingularityError::persistence("/tmp/save.json", "disk full").is_recoverable());
        assert!(SingularityError::remote_sync("u1", "offline").is_recoverable());
        assert!(!SingularityError::catalog("broken").is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SingularityError = io_err.into();
        assert!(matches!(err, SingularityError::Io(_)));
    }

    #[test]
    fn test_pattern_error_carries_source() {
        let Err(regex_err) = regex::Regex::new("print(") else {
            return;
        };
        let err = SingularityError::pattern("print(", &regex_err);
        assert!(err.to_string().contains("print("));
        assert!(err.is_fatal());
    }
}
