//! The three-question placement quiz taken before level 1.

use serde::{Deserialize, Serialize};

use crate::config::SkillLevel;

/// One answer choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssessmentOption {
    /// Choice letter.
    pub id: char,
    /// Choice text.
    pub text: &'static str,
    /// Whether this is the right answer.
    #[serde(skip)]
    pub correct: bool,
}

/// A placement question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssessmentQuestion {
    /// Question number.
    pub id: u8,
    /// Prompt text.
    pub question: &'static str,
    /// Answer choices.
    pub options: [AssessmentOption; 3],
}

const fn option(id: char, text: &'static str, correct: bool) -> AssessmentOption {
    AssessmentOption { id, text, correct }
}

/// The shipped quiz.
pub static QUESTIONS: [AssessmentQuestion; 3] = [
    AssessmentQuestion {
        id: 1,
        question: "Which line correctly prints 'Hello'?",
        options: [
            option('a', "print(Hello)", false),
            option('b', "print('Hello')", true),
            option('c', "echo 'Hello'", false),
        ],
    },
    AssessmentQuestion {
        id: 2,
        question: "How do you store the number 5 in a variable 'x'?",
        options: [
            option('a', "x = 5", true),
            option('b', "int x = 5", false),
            option('c', "5 -> x", false),
        ],
    },
    AssessmentQuestion {
        id: 3,
        question: "What is the output of: print(10 + 2)",
        options: [
            option('a', "102", false),
            option('b', "10 + 2", false),
            option('c', "12", true),
        ],
    },
];

/// A learner's answer to one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentAnswer {
    /// Question number.
    pub question: u8,
    /// Chosen option letter.
    pub option: char,
}

/// Counts correct answers. Unknown questions and options score nothing, and
/// only the first answer to each question counts.
#[must_use]
pub fn score(answers: &[AssessmentAnswer]) -> usize {
    QUESTIONS
        .iter()
        .filter(|question| {
            answers
                .iter()
                .find(|answer| answer.question == question.id)
                .is_some_and(|answer| {
                    question
                        .options
                        .iter()
                        .any(|opt| opt.correct && opt.id == answer.option)
                })
        })
        .count()
}

/// Maps a score to a skill tier: all correct is advanced, two is
/// intermediate, anything less is beginner.
#[must_use]
pub const fn placement(correct: usize) -> SkillLevel {
    match correct {
        0 | 1 => SkillLevel::Beginner,
        2 => SkillLevel::Intermediate,
        _ => SkillLevel::Advanced,
    }
}

/// Scores answers and returns the placement.
#[must_use]
pub fn evaluate(answers: &[AssessmentAnswer]) -> SkillLevel {
    placement(score(answers))
}
