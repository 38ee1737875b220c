//! Block scoring: objective accuracy blended with the external discursive grade.
//!
//! composite = objective% × 0.6 + discursive% × 0.4
//!
//! The weights are fixed policy. When the block has no discursive item the
//! composite is the objective percentage; when it has no objective items the
//! composite is the discursive percentage.

use serde::{Deserialize, Serialize};

use crate::answers::AnswerStore;
use crate::bank::QuestionBank;
use crate::error::QuizError;

/// Weight of the objective percentage in the composite.
pub const OBJECTIVE_WEIGHT: f64 = 0.6;
/// Weight of the discursive percentage in the composite.
pub const DISCURSIVE_WEIGHT: f64 = 0.4;

/// Externally supplied discursive grade, validated to `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DiscursiveGrade(f64);

impl DiscursiveGrade {
    pub fn new(value: f64) -> Result<Self, QuizError> {
        if (0.0..=100.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(QuizError::InvalidGrade(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for DiscursiveGrade {
    type Error = QuizError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DiscursiveGrade> for f64 {
    fn from(g: DiscursiveGrade) -> Self {
        g.0
    }
}

/// Final score of one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Objective positions whose stored option is the correct one.
    pub objective_correct: usize,
    /// Number of objective positions in the block.
    pub objective_total: usize,
    /// `objective_correct / objective_total × 100` (0 when there are none).
    pub objective_percent: f64,
    /// External grade, present iff the block has a discursive item.
    pub discursive_percent: Option<f64>,
    /// Unrounded composite, kept for auditing.
    pub composite_raw: f64,
    /// Composite rounded to the nearest integer for display.
    pub composite: u32,
}

/// Percentage of correct objective answers. Zero when there are no objective items.
pub fn objective_percentage(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (correct as f64 * 100.0) / total as f64
}

/// Weighted blend of the two sub-scores, falling back to whichever exists.
pub fn composite_score(objective: Option<f64>, discursive: Option<f64>) -> f64 {
    match (objective, discursive) {
        (Some(o), Some(d)) => o * OBJECTIVE_WEIGHT + d * DISCURSIVE_WEIGHT,
        (Some(o), None) => o,
        (None, Some(d)) => d,
        (None, None) => 0.0,
    }
}

/// Compute the block score from the stored answers and the answer key.
///
/// A missing objective answer counts as incorrect. `grade` is required when
/// the bank has a discursive item and ignored otherwise.
pub fn aggregate(
    bank: &QuestionBank,
    answers: &AnswerStore,
    grade: Option<DiscursiveGrade>,
) -> Result<ScoreBreakdown, QuizError> {
    if bank.is_empty() {
        return Err(QuizError::EmptyBank);
    }

    let mut objective_total = 0usize;
    let mut objective_correct = 0usize;
    for q in bank.questions().iter().filter(|q| q.is_objective()) {
        objective_total += 1;
        let chosen = answers.choice(q.position);
        let correct = q.correct_option().map(|o| o.id.as_str());
        if chosen.is_some() && chosen == correct {
            objective_correct += 1;
        }
    }

    let discursive_percent = match bank.discursive_position() {
        Some(position) => {
            let grade = grade.ok_or_else(|| {
                QuizError::NotReady(format!(
                    "discursive grade for position {position} has not been supplied"
                ))
            })?;
            Some(grade.value())
        }
        None => None,
    };

    let objective_percent = objective_percentage(objective_correct, objective_total);
    let objective = (objective_total > 0).then_some(objective_percent);
    let composite_raw = composite_score(objective, discursive_percent);

    Ok(ScoreBreakdown {
        objective_correct,
        objective_total,
        objective_percent,
        discursive_percent,
        composite_raw,
        composite: composite_raw.round() as u32,
    })
}
