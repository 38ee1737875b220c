//! The quiz session state machine.
//!
//! ```text
//!   Answering(p) --request_result--> ResultShown(p) --advance--> Answering(p+1)
//!        |  ^                                          \
//!        |  +-- go_to_previous (p > 0) from Answering(p+1)  +--> Completed (p = last)
//!        +-- advance (discursive only) --> Answering(p+1) | Completed
//!   any --reset--> Answering(0)
//! ```
//!
//! Every rejected call returns an error and leaves the session untouched.
//! A session is driven by one caller at a time; `tick` is plain `&mut self`
//! so interleaving it with the other transitions cannot tear state.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::answers::AnswerStore;
use crate::bank::QuestionBank;
use crate::error::QuizError;
use crate::model::{word_count, AnswerValue, Question, QuestionKind, QuestionView};
use crate::scoring::{aggregate, DiscursiveGrade, ScoreBreakdown};
use crate::timer::Timer;

/// Minimum words before a discursive answer is accepted.
pub const MIN_DISCURSIVE_WORDS: usize = 50;
/// Maximum characters accepted for a discursive answer.
pub const MAX_DISCURSIVE_CHARS: usize = 2000;

/// Where the session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "kebab-case")]
pub enum Phase {
    Answering { position: usize },
    ResultShown { position: usize },
    Completed,
}

impl Phase {
    pub fn position(self) -> Option<usize> {
        match self {
            Phase::Answering { position } | Phase::ResultShown { position } => Some(position),
            Phase::Completed => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Answering { position } => write!(f, "answering position {position}"),
            Phase::ResultShown { position } => write!(f, "showing result for position {position}"),
            Phase::Completed => write!(f, "completed"),
        }
    }
}

/// Limits applied to discursive answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub min_discursive_words: usize,
    pub max_discursive_chars: usize,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            min_discursive_words: MIN_DISCURSIVE_WORDS,
            max_discursive_chars: MAX_DISCURSIVE_CHARS,
        }
    }
}

/// Outcome of the active question once its answer is final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemResult {
    pub position: usize,
    pub question_id: String,
    pub kind: QuestionKind,
    pub answered: bool,
    /// The position was closed by timer expiry.
    pub expired: bool,
    /// Objective items only. A missing answer is incorrect.
    pub correct: Option<bool>,
    /// Objective items only.
    pub correct_option: Option<String>,
}

/// Result of `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next { position: usize },
    Completed,
}

/// Timer state for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerSnapshot {
    pub remaining_secs: u32,
    pub limit_secs: Option<u32>,
    pub running: bool,
    pub expired: bool,
    pub low: bool,
}

/// Everything a renderer needs after a transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub question_count: usize,
    pub answered: bool,
    pub is_last: bool,
    pub item_result: Option<ItemResult>,
    pub timer: TimerSnapshot,
    /// 1-based index of the active question (equals `question_count` once completed).
    pub progress_current: usize,
    pub progress_percent: f64,
    pub awaiting_grade: bool,
    pub score: Option<ScoreBreakdown>,
}

/// One learner's pass through a block.
#[derive(Debug, Clone)]
pub struct QuizSession {
    bank: QuestionBank,
    policy: SessionPolicy,
    phase: Phase,
    answers: AnswerStore,
    timer: Timer,
    expired_positions: BTreeSet<usize>,
    item_result: Option<ItemResult>,
    grade: Option<DiscursiveGrade>,
    score: Option<ScoreBreakdown>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a session at `Answering(0)` with the default policy.
    pub fn new(bank: QuestionBank) -> Result<Self, QuizError> {
        Self::with_policy(bank, SessionPolicy::default())
    }

    pub fn with_policy(bank: QuestionBank, policy: SessionPolicy) -> Result<Self, QuizError> {
        if bank.is_empty() {
            return Err(QuizError::EmptyBank);
        }
        let mut session = Self {
            bank,
            policy,
            phase: Phase::Answering { position: 0 },
            answers: AnswerStore::new(),
            timer: Timer::new(),
            expired_positions: BTreeSet::new(),
            item_result: None,
            grade: None,
            score: None,
            started_at: Utc::now(),
            completed_at: None,
        };
        session.arm_timer(0);
        tracing::debug!(
            "session started for block '{}' ({} questions)",
            session.bank.id(),
            session.bank.count()
        );
        Ok(session)
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Active position, `None` once completed.
    pub fn position(&self) -> Option<usize> {
        self.phase.position()
    }

    pub fn is_completed(&self) -> bool {
        self.phase == Phase::Completed
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn has_answer(&self, position: usize) -> bool {
        self.answers.has_answer(position)
    }

    pub fn is_last(&self, position: usize) -> bool {
        position + 1 == self.bank.count()
    }

    /// Whether `position` was closed by timer expiry at some point in this pass.
    pub fn is_expired(&self, position: usize) -> bool {
        self.expired_positions.contains(&position)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.position().and_then(|p| self.bank.question_at(p).ok())
    }

    /// Learner-facing view of the active question.
    pub fn current_view(&self) -> Option<QuestionView> {
        self.current_question().map(Question::learner_view)
    }

    /// Result of the active question while in `ResultShown`.
    pub fn item_result(&self) -> Option<&ItemResult> {
        self.item_result.as_ref()
    }

    pub fn score(&self) -> Option<&ScoreBreakdown> {
        self.score.as_ref()
    }

    pub fn grade(&self) -> Option<DiscursiveGrade> {
        self.grade
    }

    /// Completed but still waiting for the external discursive grade.
    pub fn is_awaiting_grade(&self) -> bool {
        self.is_completed() && self.score.is_none()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// The discursive question and its stored text, if the block has one.
    pub fn discursive_answer(&self) -> Option<(&Question, Option<&str>)> {
        let position = self.bank.discursive_position()?;
        let question = self.bank.question_at(position).ok()?;
        Some((question, self.answers.text(position)))
    }

    /// Record (or overwrite) the answer for the active question.
    ///
    /// Multiple-choice values must name one of the question's options.
    /// Discursive text must meet the word minimum unless the question's timer
    /// has expired, in which case whatever text exists is accepted.
    pub fn submit_answer(&mut self, value: &str) -> Result<(), QuizError> {
        let position = self.answering_position("submit_answer")?;
        let expired = self.position_expired(position);
        let question = self.bank.question_at(position)?;

        let answer = match question.kind {
            QuestionKind::MultipleChoice => {
                let option = value.trim();
                if question.option(option).is_none() {
                    return Err(QuizError::InvalidOption {
                        question_id: question.id.clone(),
                        option: option.to_string(),
                    });
                }
                AnswerValue::Choice(option.to_string())
            }
            QuestionKind::Discursive => {
                let chars = value.chars().count();
                if chars > self.policy.max_discursive_chars {
                    return Err(QuizError::AnswerTooLong {
                        chars,
                        max: self.policy.max_discursive_chars,
                    });
                }
                let words = word_count(value);
                if words < self.policy.min_discursive_words && !expired {
                    return Err(QuizError::AnswerTooShort {
                        words,
                        min: self.policy.min_discursive_words,
                    });
                }
                AnswerValue::Text(value.to_string())
            }
        };

        let replaced = self.answers.record(position, answer).is_some();
        tracing::debug!(
            "answer recorded at position {position}{}",
            if replaced { " (overwrote previous)" } else { "" }
        );
        Ok(())
    }

    /// Close the active question and reveal its result.
    ///
    /// Requires a stored answer or an expired timer; on expiry whatever is
    /// stored (possibly nothing) becomes final.
    pub fn request_result(&mut self) -> Result<&ItemResult, QuizError> {
        let position = self.answering_position("request_result")?;
        self.ensure_ready(position)?;

        let question = self.bank.question_at(position)?;
        let correct_option = question.correct_option().map(|o| o.id.clone());
        let correct = match question.kind {
            QuestionKind::MultipleChoice => Some(
                self.answers.choice(position).is_some()
                    && self.answers.choice(position) == correct_option.as_deref(),
            ),
            QuestionKind::Discursive => None,
        };

        let result = ItemResult {
            position,
            question_id: question.id.clone(),
            kind: question.kind,
            answered: self.answers.has_answer(position),
            expired: self.position_expired(position),
            correct,
            correct_option,
        };

        self.timer.stop();
        self.phase = Phase::ResultShown { position };
        tracing::debug!(
            "result shown for position {position} (correct: {:?})",
            result.correct
        );
        Ok(&*self.item_result.insert(result))
    }

    /// Move past the active question.
    ///
    /// Valid from `ResultShown`, or directly from `Answering` for items
    /// without immediate feedback once they are answered, expired or graded. From the
    /// last position the session completes and scores if it can.
    pub fn advance(&mut self) -> Result<Advance, QuizError> {
        let position = match self.phase {
            Phase::ResultShown { position } => position,
            Phase::Answering { position } => {
                let kind = self.bank.question_at(position)?.kind;
                if kind.shows_immediate_feedback() {
                    return Err(QuizError::InvalidPhase {
                        operation: "advance",
                        phase: self.phase,
                    });
                }
                self.ensure_ready(position)?;
                position
            }
            Phase::Completed => {
                return Err(QuizError::InvalidPhase {
                    operation: "advance",
                    phase: self.phase,
                })
            }
        };

        if self.is_last(position) {
            self.complete()?;
            return Ok(Advance::Completed);
        }

        let next = position + 1;
        self.item_result = None;
        self.phase = Phase::Answering { position: next };
        self.arm_timer(next);
        tracing::debug!("advanced to position {next}");
        Ok(Advance::Next { position: next })
    }

    /// Step back one question, keeping its stored answer.
    ///
    /// Time pressure is not restored for the revisited question.
    pub fn go_to_previous(&mut self) -> Result<(), QuizError> {
        let position = self.answering_position("go_to_previous")?;
        if position == 0 {
            return Err(QuizError::NoPreviousQuestion);
        }
        let previous = position - 1;
        self.timer.clear();
        self.item_result = None;
        self.phase = Phase::Answering { position: previous };
        tracing::debug!("moved back to position {previous}");
        Ok(())
    }

    /// Forward one external 1-second tick to the active timer.
    ///
    /// Only counts while answering. Returns `true` on the tick that expires
    /// the active question.
    pub fn tick(&mut self) -> bool {
        let Phase::Answering { position } = self.phase else {
            return false;
        };
        if !self.timer.tick() {
            return false;
        }
        self.expired_positions.insert(position);
        tracing::info!("time expired for position {position}");
        true
    }

    /// Supply the external discursive grade (0..=100).
    ///
    /// May arrive before or after completion. Scoring runs as soon as the
    /// session is completed and every input is present; the produced score
    /// is returned once it exists.
    pub fn submit_discursive_grade(
        &mut self,
        grade: f64,
    ) -> Result<Option<&ScoreBreakdown>, QuizError> {
        if self.score.is_some() {
            return Err(QuizError::AlreadyScored);
        }
        let grade = DiscursiveGrade::new(grade)?;
        self.grade = Some(grade);
        tracing::debug!("discursive grade {} received", grade.value());
        if self.is_completed() {
            self.try_score()?;
        }
        Ok(self.score.as_ref())
    }

    /// Discard every answer, grade and score and return to `Answering(0)`.
    pub fn reset(&mut self) {
        self.answers.clear();
        self.expired_positions.clear();
        self.item_result = None;
        self.grade = None;
        self.score = None;
        self.phase = Phase::Answering { position: 0 };
        self.started_at = Utc::now();
        self.completed_at = None;
        self.arm_timer(0);
        tracing::debug!("session reset for block '{}'", self.bank.id());
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let count = self.bank.count();
        let (answered, is_last, progress_current) = match self.position() {
            Some(p) => (self.has_answer(p), self.is_last(p), p + 1),
            None => (false, false, count),
        };
        SessionSnapshot {
            phase: self.phase,
            question_count: count,
            answered,
            is_last,
            item_result: self.item_result.clone(),
            timer: TimerSnapshot {
                remaining_secs: self.timer.remaining(),
                limit_secs: self.timer.limit(),
                running: self.timer.is_running(),
                expired: self.timer.expired(),
                low: self.timer.is_low(),
            },
            progress_current,
            progress_percent: (progress_current as f64 * 100.0 / count as f64).min(100.0),
            awaiting_grade: self.is_awaiting_grade(),
            score: self.score.clone(),
        }
    }

    fn answering_position(&self, operation: &'static str) -> Result<usize, QuizError> {
        match self.phase {
            Phase::Answering { position } => Ok(position),
            phase => Err(QuizError::InvalidPhase { operation, phase }),
        }
    }

    fn position_expired(&self, position: usize) -> bool {
        (self.timer.expired() && self.phase.position() == Some(position))
            || self.expired_positions.contains(&position)
    }

    /// A position is resolved by an answer or an expiry. A discursive
    /// position is also resolved once its grade has been supplied.
    fn ensure_ready(&self, position: usize) -> Result<(), QuizError> {
        let graded = self.grade.is_some()
            && self.bank.question_at(position)?.kind == QuestionKind::Discursive;
        if self.answers.has_answer(position) || self.position_expired(position) || graded {
            Ok(())
        } else {
            Err(QuizError::NotReady(format!(
                "position {position} has no answer and its timer has not expired"
            )))
        }
    }

    fn arm_timer(&mut self, position: usize) {
        self.timer.clear();
        let limit = self
            .bank
            .question_at(position)
            .ok()
            .and_then(|q| q.time_limit_secs);
        self.timer.start(limit);
    }

    fn complete(&mut self) -> Result<(), QuizError> {
        self.timer.stop();
        self.item_result = None;
        self.phase = Phase::Completed;
        self.completed_at = Some(Utc::now());
        tracing::info!(
            "block '{}' completed with {}/{} answers",
            self.bank.id(),
            self.answers.len(),
            self.bank.count()
        );
        self.try_score()
    }

    fn try_score(&mut self) -> Result<(), QuizError> {
        if self.bank.discursive_position().is_some() && self.grade.is_none() {
            tracing::info!("scoring deferred until the discursive grade arrives");
            return Ok(());
        }
        let score = aggregate(&self.bank, &self.answers, self.grade)?;
        tracing::info!(
            "block '{}' scored: composite {} (objective {:.1}%, discursive {:?})",
            self.bank.id(),
            score.composite,
            score.objective_percent,
            score.discursive_percent
        );
        self.score = Some(score);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerOption;

    fn mc(id: &str, limit: Option<u32>) -> Question {
        let q = Question::multiple_choice(
            id,
            "Pick one",
            vec![
                AnswerOption::new("a", "Wrong", false),
                AnswerOption::new("b", "Right", true),
                AnswerOption::new("c", "Also wrong", false),
            ],
        );
        match limit {
            Some(secs) => q.with_time_limit(secs),
            None => q,
        }
    }

    fn essay() -> Question {
        Question::discursive("essay", "Explain it").with_time_limit(600)
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    fn block() -> QuizSession {
        let bank = QuestionBank::new(
            "block-1",
            "Block 1",
            vec![
                mc("q1", Some(3)),
                mc("q2", Some(120)),
                mc("q3", None),
                mc("q4", Some(120)),
                mc("q5", Some(120)),
                essay(),
            ],
        )
        .unwrap();
        QuizSession::new(bank).unwrap()
    }

    fn answer_and_next(session: &mut QuizSession, option: &str) {
        session.submit_answer(option).unwrap();
        session.request_result().unwrap();
        session.advance().unwrap();
    }

    #[test]
    fn empty_bank_is_rejected() {
        let bank = QuestionBank::new("b", "Empty", vec![]).unwrap();
        assert_eq!(QuizSession::new(bank).unwrap_err(), QuizError::EmptyBank);
    }

    #[test]
    fn starts_answering_first_question_with_timer() {
        let session = block();
        assert_eq!(session.phase(), Phase::Answering { position: 0 });
        assert_eq!(session.timer().remaining(), 3);
        assert!(session.timer().is_running());
    }

    #[test]
    fn invalid_option_is_rejected_without_state_change() {
        let mut session = block();
        let err = session.submit_answer("z").unwrap_err();
        assert!(matches!(err, QuizError::InvalidOption { .. }));
        assert!(!session.has_answer(0));
        assert_eq!(session.phase(), Phase::Answering { position: 0 });
    }

    #[test]
    fn reanswering_overwrites() {
        let mut session = block();
        session.submit_answer("a").unwrap();
        session.submit_answer("b").unwrap();
        assert_eq!(session.answers().choice(0), Some("b"));
        let result = session.request_result().unwrap();
        assert_eq!(result.correct, Some(true));
    }

    #[test]
    fn request_result_needs_answer_or_expiry() {
        let mut session = block();
        assert!(matches!(
            session.request_result().unwrap_err(),
            QuizError::NotReady(_)
        ));

        assert!(!session.tick());
        assert!(!session.tick());
        assert!(session.tick());
        assert!(session.timer().expired());

        let result = session.request_result().unwrap().clone();
        assert!(!result.answered);
        assert!(result.expired);
        assert_eq!(result.correct, Some(false));
        assert_eq!(result.correct_option.as_deref(), Some("b"));
        assert_eq!(session.phase(), Phase::ResultShown { position: 0 });
    }

    #[test]
    fn timer_frozen_while_result_shown() {
        let mut session = block();
        session.submit_answer("b").unwrap();
        session.tick();
        session.request_result().unwrap();
        assert!(!session.tick());
        assert_eq!(session.timer().remaining(), 2);
        assert!(!session.timer().is_running());
    }

    #[test]
    fn objective_item_cannot_skip_feedback() {
        let mut session = block();
        session.submit_answer("b").unwrap();
        let err = session.advance().unwrap_err();
        assert!(matches!(
            err,
            QuizError::InvalidPhase {
                operation: "advance",
                ..
            }
        ));
    }

    #[test]
    fn advance_resets_timer_for_next_question() {
        let mut session = block();
        answer_and_next(&mut session, "b");
        assert_eq!(session.phase(), Phase::Answering { position: 1 });
        assert_eq!(session.timer().remaining(), 120);
        assert!(session.item_result().is_none());

        answer_and_next(&mut session, "b");
        // q3 has no time limit
        assert_eq!(session.timer().limit(), None);
        assert!(!session.timer().is_running());
    }

    #[test]
    fn discursive_word_gate() {
        let mut session = block();
        for _ in 0..5 {
            answer_and_next(&mut session, "b");
        }
        assert_eq!(session.phase(), Phase::Answering { position: 5 });

        let err = session.submit_answer(&words(49)).unwrap_err();
        assert_eq!(err, QuizError::AnswerTooShort { words: 49, min: 50 });
        assert!(!session.has_answer(5));

        session.submit_answer(&words(50)).unwrap();
        assert!(session.has_answer(5));
    }

    #[test]
    fn discursive_length_cap() {
        let bank = QuestionBank::new("b", "B", vec![essay()]).unwrap();
        let mut session = QuizSession::with_policy(
            bank,
            SessionPolicy {
                min_discursive_words: 1,
                max_discursive_chars: 10,
            },
        )
        .unwrap();
        let err = session.submit_answer("far too long an answer").unwrap_err();
        assert!(matches!(err, QuizError::AnswerTooLong { max: 10, .. }));
    }

    #[test]
    fn expiry_waives_word_minimum() {
        let bank =
            QuestionBank::new("b", "B", vec![Question::discursive("d", "x").with_time_limit(1)])
                .unwrap();
        let mut session = QuizSession::new(bank).unwrap();
        assert!(session.tick());
        session.submit_answer("just a draft").unwrap();
        assert_eq!(session.answers().text(0), Some("just a draft"));
    }

    #[test]
    fn full_pass_completes_and_waits_for_grade() {
        let mut session = block();
        for option in ["b", "b", "b", "a", "c"] {
            answer_and_next(&mut session, option);
        }
        session.submit_answer(&words(60)).unwrap();
        assert_eq!(session.advance().unwrap(), Advance::Completed);
        assert!(session.is_completed());
        assert!(session.is_awaiting_grade());
        assert!(session.score().is_none());

        let score = session.submit_discursive_grade(75.0).unwrap().cloned().unwrap();
        assert_eq!(score.objective_correct, 3);
        assert_eq!(score.objective_percent, 60.0);
        assert_eq!(score.composite, 66);
        assert!(!session.is_awaiting_grade());
    }

    #[test]
    fn completed_never_returns_to_answering_without_reset() {
        let bank = QuestionBank::new("b", "B", vec![mc("q1", None)]).unwrap();
        let mut session = QuizSession::new(bank).unwrap();
        answer_and_next(&mut session, "b");
        assert!(session.is_completed());
        assert_eq!(session.score().map(|s| s.composite), Some(100));

        assert!(session.advance().is_err());
        assert!(session.submit_answer("a").is_err());
        assert!(session.go_to_previous().is_err());
        assert!(session.request_result().is_err());
        assert!(session.is_completed());
    }

    #[test]
    fn grade_before_completion_is_kept() {
        let bank = QuestionBank::new("b", "B", vec![mc("q1", None), essay()]).unwrap();
        let mut session = QuizSession::new(bank).unwrap();
        assert_eq!(session.submit_discursive_grade(80.0).unwrap(), None);
        answer_and_next(&mut session, "b");
        session.submit_answer(&words(55)).unwrap();
        session.advance().unwrap();
        let score = session.score().unwrap();
        assert_eq!(score.composite, 92);
    }

    #[test]
    fn supplied_grade_resolves_unanswered_essay() {
        let bank = QuestionBank::new(
            "b",
            "B",
            vec![Question::discursive("essay", "Explain it")],
        )
        .unwrap();
        let mut session = QuizSession::new(bank).unwrap();
        assert!(matches!(
            session.advance().unwrap_err(),
            QuizError::NotReady(_)
        ));

        session.submit_discursive_grade(70.0).unwrap();
        assert_eq!(session.advance().unwrap(), Advance::Completed);
        assert!(!session.has_answer(0));
        let score = session.score().unwrap();
        assert_eq!(score.discursive_percent, Some(70.0));
        assert_eq!(score.composite, 70);
    }

    #[test]
    fn grade_does_not_resolve_objective_items() {
        let bank = QuestionBank::new("b", "B", vec![mc("q1", None), essay()]).unwrap();
        let mut session = QuizSession::new(bank).unwrap();
        session.submit_discursive_grade(70.0).unwrap();
        assert!(matches!(
            session.request_result().unwrap_err(),
            QuizError::NotReady(_)
        ));
    }

    #[test]
    fn expired_unanswered_choice_scores_as_incorrect() {
        let bank = QuestionBank::new(
            "b",
            "B",
            vec![mc("q1", Some(2)), mc("q2", None), essay()],
        )
        .unwrap();
        let mut session = QuizSession::new(bank).unwrap();
        assert!(!session.tick());
        assert!(session.tick());
        session.request_result().unwrap();
        session.advance().unwrap();

        answer_and_next(&mut session, "b");
        session.submit_answer(&words(50)).unwrap();
        assert_eq!(session.advance().unwrap(), Advance::Completed);

        let score = session.submit_discursive_grade(50.0).unwrap().cloned().unwrap();
        assert_eq!(score.objective_total, 2);
        assert_eq!(score.objective_correct, 1);
        assert_eq!(score.objective_percent, 50.0);
        // 50 × 0.6 + 50 × 0.4
        assert_eq!(score.composite, 50);
    }

    #[test]
    fn tick_interleaves_with_answering() {
        let mut session = block();
        assert!(!session.tick());
        session.submit_answer("b").unwrap();
        assert!(!session.tick());
        assert_eq!(session.answers().choice(0), Some("b"));
        assert_eq!(session.timer().remaining(), 1);
        assert!(session.timer().is_running());
        assert_eq!(session.phase(), Phase::Answering { position: 0 });
        assert_eq!(session.request_result().unwrap().correct, Some(true));
    }

    #[test]
    fn invalid_grade_leaves_session_waiting() {
        let bank = QuestionBank::new("b", "B", vec![essay()]).unwrap();
        let mut session = QuizSession::new(bank).unwrap();
        session.submit_answer(&words(50)).unwrap();
        session.advance().unwrap();
        assert_eq!(
            session.submit_discursive_grade(101.0).unwrap_err(),
            QuizError::InvalidGrade(101.0)
        );
        assert!(session.is_awaiting_grade());
        session.submit_discursive_grade(70.0).unwrap();
        assert_eq!(
            session.submit_discursive_grade(90.0).unwrap_err(),
            QuizError::AlreadyScored
        );
        assert_eq!(session.score().unwrap().composite, 70);
    }

    #[test]
    fn go_to_previous_at_first_position_fails() {
        let mut session = block();
        assert_eq!(
            session.go_to_previous().unwrap_err(),
            QuizError::NoPreviousQuestion
        );
        assert_eq!(session.phase(), Phase::Answering { position: 0 });
    }

    #[test]
    fn go_to_previous_keeps_answers_and_drops_time_pressure() {
        let mut session = block();
        answer_and_next(&mut session, "a");
        session.submit_answer("c").unwrap();

        session.go_to_previous().unwrap();
        assert_eq!(session.phase(), Phase::Answering { position: 0 });
        assert_eq!(session.answers().choice(0), Some("a"));
        assert_eq!(session.answers().choice(1), Some("c"));
        assert!(!session.timer().is_running());
        assert!(!session.tick());
    }

    #[test]
    fn expired_position_stays_skippable_after_revisit() {
        let mut session = block();
        for _ in 0..3 {
            session.tick();
        }
        session.request_result().unwrap();
        session.advance().unwrap();
        session.go_to_previous().unwrap();
        assert!(session.is_expired(0));
        // no answer and no running timer, but the position expired earlier
        assert!(session.request_result().is_ok());
    }

    #[test]
    fn position_stays_in_range() {
        let mut session = block();
        let count = session.bank().count();
        for _ in 0..5 {
            assert!(session.position().unwrap() < count);
            answer_and_next(&mut session, "b");
        }
        assert!(session.position().unwrap() < count);
    }

    #[test]
    fn reset_from_completed_returns_to_start() {
        let bank = QuestionBank::new("b", "B", vec![mc("q1", Some(30)), mc("q2", None)]).unwrap();
        let mut session = QuizSession::new(bank).unwrap();
        answer_and_next(&mut session, "b");
        answer_and_next(&mut session, "a");
        assert!(session.is_completed());

        session.reset();
        assert_eq!(session.phase(), Phase::Answering { position: 0 });
        assert!(session.answers().is_empty());
        assert!(session.score().is_none());
        assert_eq!(session.timer().remaining(), 30);
        assert!(session.timer().is_running());
        assert!(session.completed_at().is_none());
    }

    #[test]
    fn snapshot_reports_progress_and_result() {
        let mut session = block();
        session.submit_answer("a").unwrap();
        session.request_result().unwrap();
        let snap = session.snapshot();
        assert_eq!(snap.phase, Phase::ResultShown { position: 0 });
        assert!(snap.answered);
        assert!(!snap.is_last);
        assert_eq!(snap.progress_current, 1);
        assert_eq!(snap.question_count, 6);
        assert_eq!(snap.item_result.unwrap().correct, Some(false));
        assert!(!snap.timer.running);
    }
}
