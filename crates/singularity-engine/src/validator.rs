//! Pattern-based acceptance rules for level submissions.
//!
//! Most levels are described declaratively as an ordered list of [`Check`]s
//! against one [`View`] of the submission. The first failing check decides the
//! verdict message; when every check holds the level's success verdict is
//! returned. Levels whose rules need ordering or captured values supply a
//! [`Validator::Custom`] function instead.
//!
//! Validators are pure: the same source always yields the same verdict, and no
//! submitted code is ever executed.

use regex::Regex;

use crate::error::{Result, SingularityError};
use crate::normalize::{Submission, View};
use crate::verdict::Verdict;

/// Signature of a hand-written level validator.
pub type ValidateFn = fn(&Submission) -> Result<Verdict>;

/// A single acceptance rule.
#[derive(Debug, Clone, Copy)]
pub enum Check {
    /// Holds when the view contains at least one of the needles.
    Contains {
        /// View of the submission to search.
        view: View,
        /// Accepted spellings; any one is enough.
        any_of: &'static [&'static str],
        /// Failure message when none is present.
        message: &'static str,
    },
    /// Holds when the regex matches somewhere in the view.
    Matches {
        /// View of the submission to search.
        view: View,
        /// Regex source, compiled on use.
        pattern: &'static str,
        /// Failure message when the pattern does not match.
        message: &'static str,
    },
    /// Holds when the needle occurs at least `times` times.
    Occurs {
        /// View of the submission to search.
        view: View,
        /// Substring to count.
        needle: &'static str,
        /// Minimum number of non-overlapping occurrences.
        times: usize,
        /// Failure message when the needle is too rare.
        message: &'static str,
    },
}

impl Check {
    /// Shorthand for a single-needle [`Check::Contains`].
    #[must_use]
    pub const fn has(view: View, needle: &'static [&'static str], message: &'static str) -> Self {
        Self::Contains {
            view,
            any_of: needle,
            message,
        }
    }

    /// Shorthand for [`Check::Matches`].
    #[must_use]
    pub const fn matches(view: View, pattern: &'static str, message: &'static str) -> Self {
        Self::Matches {
            view,
            pattern,
            message,
        }
    }

    /// Shorthand for [`Check::Occurs`].
    #[must_use]
    pub const fn occurs(
        view: View,
        needle: &'static str,
        times: usize,
        message: &'static str,
    ) -> Self {
        Self::Occurs {
            view,
            needle,
            times,
            message,
        }
    }

    /// The message reported when this check fails.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Contains { message, .. }
            | Self::Matches { message, .. }
            | Self::Occurs { message, .. } => message,
        }
    }

    /// Evaluates the check against a submission.
    pub fn holds(&self, submission: &Submission) -> Result<bool> {
        match *self {
            Self::Contains { view, any_of, .. } => {
                let text = submission.view(view);
                Ok(any_of.iter().any(|needle| text.contains(needle)))
            }
            Self::Matches { view, pattern, .. } => {
                Ok(compile(pattern)?.is_match(submission.view(view)))
            }
            Self::Occurs {
                view,
                needle,
                times,
                ..
            } => Ok(submission.view(view).matches(needle).count() >= times),
        }
    }
}

/// Compiles a validator regex, mapping failures to [`SingularityError::PatternError`].
pub fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| SingularityError::pattern(pattern, &e))
}

// ============================================================================
// Validator
// ============================================================================

/// The acceptance logic for one level.
#[derive(Debug, Clone, Copy)]
pub enum Validator {
    /// Ordered checks followed by a fixed success verdict.
    Rules {
        /// Checks evaluated in order; the first failure wins.
        checks: &'static [Check],
        /// Success message.
        success: &'static str,
        /// Simulated output shown on success.
        output: &'static str,
    },
    /// A hand-written validator.
    Custom(ValidateFn),
}

impl Validator {
    /// Validates a submission.
    ///
    /// Blank submissions are handled by the caller; validators only see
    /// non-empty source.
    pub fn validate(&self, submission: &Submission) -> Result<Verdict> {
        match self {
            Self::Rules {
                checks,
                success,
                output,
            } => {
                for check in *checks {
                    if !check.holds(submission)? {
                        return Ok(Verdict::fail(check.message()));
                    }
                }
                Ok(Verdict::pass(*success, *output))
            }
            Self::Custom(validate) => validate(submission),
        }
    }
}
