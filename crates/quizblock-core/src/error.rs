//! Error types for the quiz core.
//!
//! Every state-machine error is a caller-contract violation: it is reported
//! immediately and the session is left exactly as it was before the call.
//! `GradingError` lives here too so the grading engine can downcast a
//! collaborator failure and decide whether to retry without string matching.

use thiserror::Error;

use crate::session::Phase;

/// Errors raised by `QuestionBank`, `QuizSession` and the score aggregator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuizError {
    /// A position outside `[0, count)` was requested from the bank.
    #[error("position {position} is out of range (bank has {count} questions)")]
    OutOfRange { position: usize, count: usize },

    /// A session cannot be built over a bank without questions.
    #[error("question bank is empty")]
    EmptyBank,

    /// The submitted value is not one of the active question's option ids.
    #[error("option '{option}' is not valid for question '{question_id}'")]
    InvalidOption { question_id: String, option: String },

    /// Discursive text below the minimum word count.
    #[error("answer has {words} words, at least {min} are required")]
    AnswerTooShort { words: usize, min: usize },

    /// Discursive text above the maximum character count.
    #[error("answer has {chars} characters, at most {max} are allowed")]
    AnswerTooLong { chars: usize, max: usize },

    /// The position has neither an answer nor an expired timer, or scoring
    /// was requested before every input was available.
    #[error("not ready: {0}")]
    NotReady(String),

    /// The external discursive grade is outside `0..=100` (or not a number).
    #[error("discursive grade {0} is outside 0..=100")]
    InvalidGrade(f64),

    /// The operation is not valid in the current phase.
    #[error("{operation} is not allowed while {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: Phase,
    },

    /// `go_to_previous` was called on the first question.
    #[error("already at the first question")]
    NoPreviousQuestion,

    /// The block has already been scored; only `reset` starts a new pass.
    #[error("block has already been scored")]
    AlreadyScored,
}

/// Structural problems found while building a `QuestionBank`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("duplicate question id: {0}")]
    DuplicateQuestion(String),

    #[error("question '{question_id}' has duplicate option id '{option_id}'")]
    DuplicateOption {
        question_id: String,
        option_id: String,
    },

    #[error("multiple-choice question '{0}' needs at least two options")]
    TooFewOptions(String),

    #[error("multiple-choice question '{question_id}' has {count} correct options, expected exactly one")]
    CorrectOptionCount { question_id: String, count: usize },

    #[error("discursive question '{0}' must not define options")]
    DiscursiveWithOptions(String),

    #[error("a block may contain at most one discursive question (found '{first}' and '{second}')")]
    MultipleDiscursive { first: String, second: String },

    #[error("difficulty {0} is outside 1..=5")]
    InvalidDifficulty(u8),
}

/// Failures reported by a discursive grading collaborator.
#[derive(Debug, Error)]
pub enum GradingError {
    /// The grader did not answer in time.
    #[error("grading timed out after {0}s")]
    Timeout(u64),

    /// The grader is temporarily unavailable.
    #[error("grader unavailable: {0}")]
    Unavailable(String),

    /// The grader answered with something that is not a usable grade.
    #[error("invalid grader response: {0}")]
    InvalidResponse(String),

    /// The grading request was dropped before a grade was delivered.
    #[error("grading cancelled")]
    Cancelled,
}

impl GradingError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            GradingError::InvalidResponse(_) | GradingError::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grading_error_permanence() {
        assert!(GradingError::Cancelled.is_permanent());
        assert!(GradingError::InvalidResponse("nan".into()).is_permanent());
        assert!(!GradingError::Timeout(5).is_permanent());
        assert!(!GradingError::Unavailable("busy".into()).is_permanent());
    }

    #[test]
    fn invalid_phase_message_names_the_phase() {
        let err = QuizError::InvalidPhase {
            operation: "advance",
            phase: Phase::Completed,
        };
        assert_eq!(err.to_string(), "advance is not allowed while completed");
    }
}
