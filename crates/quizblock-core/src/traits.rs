//! The discursive grading collaborator.
//!
//! The core never grades free text. It hands the discursive answer to a
//! `DiscursiveGrader` and feeds the returned 0..=100 grade back into the
//! session. Implementations live in the `quizblock-grading` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Grader trait
// ---------------------------------------------------------------------------

/// Backend that turns a discursive answer into a grade.
#[async_trait]
pub trait DiscursiveGrader: Send + Sync {
    /// Human-readable grader name (e.g. "fixed").
    fn name(&self) -> &str;

    /// Interactive graders wait on a person and are not subject to the
    /// per-attempt timeout.
    fn interactive(&self) -> bool {
        false
    }

    /// Grade one discursive answer. The result may take arbitrarily long.
    async fn grade(&self, request: &GradeRequest) -> anyhow::Result<GradeResponse>;
}

/// What the grader is asked to grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeRequest {
    /// Block the answer belongs to.
    pub block_id: String,
    /// Discursive question id.
    pub question_id: String,
    /// Question text.
    pub prompt: String,
    /// Learner's text; `None` when the question expired unanswered.
    #[serde(default)]
    pub answer_text: Option<String>,
    /// Whitespace-separated word count of `answer_text`.
    pub word_count: usize,
}

/// Grade returned by a grader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeResponse {
    /// Grade in 0..=100. Validated by the session, not here.
    pub grade: f64,
    /// Per-criterion breakdown, if the grader used a rubric.
    #[serde(default)]
    pub rubric: Option<RubricBreakdown>,
    /// Free-text feedback for the learner.
    #[serde(default)]
    pub feedback: Option<String>,
}

impl GradeResponse {
    pub fn plain(grade: f64) -> Self {
        Self {
            grade,
            rubric: None,
            feedback: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Rubric
// ---------------------------------------------------------------------------

/// One rubric criterion with its maximum points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricCriterion {
    pub name: String,
    pub max_points: u32,
}

/// Default discursive rubric; maxima add up to 100.
pub fn default_rubric() -> Vec<RubricCriterion> {
    [
        ("Conceptual understanding", 40),
        ("Coherence", 20),
        ("Connectivity", 25),
        ("Language", 15),
    ]
    .into_iter()
    .map(|(name, max_points)| RubricCriterion {
        name: name.to_string(),
        max_points,
    })
    .collect()
}

/// Points awarded for one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricScore {
    pub criterion: String,
    pub awarded: f64,
    pub max_points: u32,
}

/// Points per criterion for one discursive answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RubricBreakdown {
    pub scores: Vec<RubricScore>,
}

impl RubricBreakdown {
    pub fn awarded(&self) -> f64 {
        self.scores.iter().map(|s| s.awarded).sum()
    }

    pub fn max_points(&self) -> u32 {
        self.scores.iter().map(|s| s.max_points).sum()
    }

    /// Awarded over maximum as a 0..=100 percentage.
    pub fn percentage(&self) -> f64 {
        let max = self.max_points();
        if max == 0 {
            return 0.0;
        }
        (self.awarded() * 100.0 / f64::from(max)).clamp(0.0, 100.0)
    }
}
