//! Ordered, immutable question bank for one block.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{BankError, QuizError};
use crate::model::{Question, QuestionKind};

/// An ordered block of questions. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionBank {
    id: String,
    title: String,
    description: String,
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank, assigning positions in the given order.
    ///
    /// Checks that ids are unique, that every multiple-choice question has at
    /// least two distinct options with exactly one correct, and that the block
    /// holds at most one discursive question without options. An empty list is
    /// accepted; `QuizSession::new` is what rejects it.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        mut questions: Vec<Question>,
    ) -> Result<Self, BankError> {
        let mut seen = HashSet::new();
        let mut discursive: Option<&str> = None;

        for q in &questions {
            if !seen.insert(q.id.as_str()) {
                return Err(BankError::DuplicateQuestion(q.id.clone()));
            }
            match q.kind {
                QuestionKind::MultipleChoice => check_options(q)?,
                QuestionKind::Discursive => {
                    if !q.options.is_empty() {
                        return Err(BankError::DiscursiveWithOptions(q.id.clone()));
                    }
                    if let Some(first) = discursive {
                        return Err(BankError::MultipleDiscursive {
                            first: first.to_string(),
                            second: q.id.clone(),
                        });
                    }
                    discursive = Some(q.id.as_str());
                }
            }
        }

        for (position, q) in questions.iter_mut().enumerate() {
            q.position = position;
        }

        Ok(Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            questions,
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Question at `position`, or `OutOfRange` outside `[0, count)`.
    pub fn question_at(&self, position: usize) -> Result<&Question, QuizError> {
        self.questions.get(position).ok_or(QuizError::OutOfRange {
            position,
            count: self.questions.len(),
        })
    }

    pub fn count(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Position of the discursive item, if the block has one.
    pub fn discursive_position(&self) -> Option<usize> {
        self.questions
            .iter()
            .position(|q| q.kind == QuestionKind::Discursive)
    }

    pub fn objective_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_objective()).count()
    }
}

fn check_options(q: &Question) -> Result<(), BankError> {
    if q.options.len() < 2 {
        return Err(BankError::TooFewOptions(q.id.clone()));
    }
    let mut ids = HashSet::new();
    for o in &q.options {
        if !ids.insert(o.id.as_str()) {
            return Err(BankError::DuplicateOption {
                question_id: q.id.clone(),
                option_id: o.id.clone(),
            });
        }
    }
    let correct = q.options.iter().filter(|o| o.is_correct()).count();
    if correct != 1 {
        return Err(BankError::CorrectOptionCount {
            question_id: q.id.clone(),
            count: correct,
        });
    }
    Ok(())
}
