//! The single entry point for judging a submission.
//!
//! [`run_level`] applies the uniform empty-submission rule, then delegates to
//! the level's validator. A validator that errors or panics never takes the
//! session down: the learner sees the crash verdict and the cause is logged.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::level::Level;
use crate::normalize::Submission;
use crate::verdict::Verdict;

/// Validates `source` against `level`.
///
/// Total: always returns a verdict.
#[must_use]
pub fn run_level(source: &str, level: &Level) -> Verdict {
    let submission = Submission::new(source);
    if submission.is_blank() {
        return Verdict::empty_submission();
    }

    match panic::catch_unwind(AssertUnwindSafe(|| level.validator.validate(&submission))) {
        Ok(Ok(verdict)) => {
            debug!(
                level = level.id,
                success = verdict.success,
                "Submission validated"
            );
            verdict
        }
        Ok(Err(e)) => {
            warn!(level = level.id, error = %e, "Validator failed");
            Verdict::crash()
        }
        Err(_) => {
            warn!(level = level.id, "Validator panicked");
            Verdict::crash()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{Result, SingularityError};
    use crate::level::{ExamQuestion, SeedTemplates};
    use crate::validator::{Check, Validator};
    use crate::verdict::{CRASH_MESSAGE, EMPTY_SUBMISSION_MESSAGE};

    const EXAM: ExamQuestion = ExamQuestion {
        topic: "Testing",
        question: "?",
        marks: 1,
        answer: "!",
    };

    const fn level_with(validator: Validator) -> Level {
        Level {
            id: 99,
            title: "Test",
            sub_title: "Test",
            description: "",
            objective: "",
            seeds: SeedTemplates::only(""),
            hint: "",
            exam: EXAM,
            validator,
            story_start: &[],
            story_end: &[],
        }
    }

    fn failing(_: &Submission) -> Result<Verdict> {
        Err(SingularityError::catalog("boom"))
    }

    #[allow(clippy::panic)]
    fn panicking(_: &Submission) -> Result<Verdict> {
        panic!("validator bug")
    }

    #[test]
    fn test_blank_submission_short_circuits() {
        let level = level_with(Validator::Custom(panicking));
        for source in ["", "   ", "\n\t\n"] {
            let verdict = run_level(source, &level);
            assert!(!verdict.success);
            assert_eq!(verdict.message, EMPTY_SUBMISSION_MESSAGE);
            assert_eq!(verdict.output.as_deref(), Some(""));
        }
    }

    #[test]
    fn test_validator_error_becomes_crash() {
        let verdict = run_level("print(1)", &level_with(Validator::Custom(failing)));
        assert_eq!(verdict.message, CRASH_MESSAGE);
        assert!(!verdict.success);
    }

    #[test]
    fn test_validator_panic_becomes_crash() {
        let verdict = run_level("print(1)", &level_with(Validator::Custom(panicking)));
        assert_eq!(verdict.message, CRASH_MESSAGE);
    }

    #[test]
    fn test_bad_pattern_becomes_crash() {
        const CHECKS: &[Check] = &[Check::matches(
            crate::normalize::View::Raw,
            "print(",
            "never",
        )];
        let level = level_with(Validator::Rules {
            checks: CHECKS,
            success: "ok",
            output: "",
        });
        assert_eq!(run_level("print(1)", &level).message, CRASH_MESSAGE);
    }

    #[test]
    fn test_deterministic() {
        const CHECKS: &[Check] = &[Check::has(
            crate::normalize::View::Stripped,
            &["x=1"],
            "Set x",
        )];
        let level = level_with(Validator::Rules {
            checks: CHECKS,
            success: "ok",
            output: "1",
        });
        let first = run_level("x = 1", &level);
        let second = run_level("x = 1", &level);
        assert_eq!(first, second);
        assert!(first.success);
    }
}
