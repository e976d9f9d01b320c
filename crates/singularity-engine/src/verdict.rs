//! The structured result of validating a submission.

use serde::{Deserialize, Serialize};

/// Message for an empty submission, applied before any level logic.
pub const EMPTY_SUBMISSION_MESSAGE: &str = "SyntaxError: Unexpected EOF while parsing";

/// Message shown when a validator fails unexpectedly.
pub const CRASH_MESSAGE: &str = "RuntimeError: System Crash";

/// Pass/fail result of validating a submission.
///
/// `output` is simulated console flavor chosen by the validator, never the
/// product of running the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the submission satisfies the level objective.
    pub success: bool,
    /// Celebratory or corrective message.
    pub message: String,
    /// Simulated program output, if the validator reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Verdict {
    /// Creates a success verdict with simulated output.
    #[must_use]
    pub fn pass(message: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            output: Some(output.into()),
        }
    }

    /// Creates a failure verdict.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output: None,
        }
    }

    /// Creates a failure verdict that echoes what the code would have printed.
    #[must_use]
    pub fn fail_with_output(message: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output: Some(output.into()),
        }
    }

    /// The uniform verdict for a blank submission.
    #[must_use]
    pub fn empty_submission() -> Self {
        Self::fail_with_output(EMPTY_SUBMISSION_MESSAGE, "")
    }

    /// The uniform verdict for a validator that failed unexpectedly.
    #[must_use]
    pub fn crash() -> Self {
        Self::fail_with_output(CRASH_MESSAGE, "")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_carries_output() {
        let verdict = Verdict::pass("Boot Sequence Initiated...", "SYSTEM ONLINE");
        assert!(verdict.success);
        assert_eq!(verdict.output.as_deref(), Some("SYSTEM ONLINE"));
    }

    #[test]
    fn test_fail_omits_output_in_json() {
        let json = serde_json::to_value(Verdict::fail("Loop: range(3)")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"success": false, "message": "Loop: range(3)"})
        );
    }

    #[test]
    fn test_empty_submission_shape() {
        let verdict = Verdict::empty_submission();
        assert!(!verdict.success);
        assert_eq!(verdict.message, EMPTY_SUBMISSION_MESSAGE);
        assert_eq!(verdict.output.as_deref(), Some(""));
    }
}
