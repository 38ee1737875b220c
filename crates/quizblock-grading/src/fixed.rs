//! Grader that always returns the configured grade.

use async_trait::async_trait;

use quizblock_core::traits::{DiscursiveGrader, GradeRequest, GradeResponse};

/// Returns the same grade for every answer.
#[derive(Debug, Clone)]
pub struct FixedGrader {
    grade: f64,
    feedback: Option<String>,
}

impl FixedGrader {
    pub fn new(grade: f64) -> Self {
        Self {
            grade,
            feedback: None,
        }
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }
}

#[async_trait]
impl DiscursiveGrader for FixedGrader {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn grade(&self, request: &GradeRequest) -> anyhow::Result<GradeResponse> {
        tracing::debug!(
            "fixed grade {} for '{}' ({} words)",
            self.grade,
            request.question_id,
            request.word_count
        );
        Ok(GradeResponse {
            grade: self.grade,
            rubric: None,
            feedback: self.feedback.clone(),
        })
    }
}
