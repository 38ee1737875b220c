//! Grading engine.
//!
//! Takes a completed session, obtains the discursive grade from the
//! configured grader with a timeout and retries, feeds it back into the
//! session and produces the block report.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::error::GradingError;
use crate::report::{BlockReport, GradeDetails};
use crate::scoring::DiscursiveGrade;
use crate::session::QuizSession;
use crate::traits::{DiscursiveGrader, GradeRequest, GradeResponse};

/// Configuration for the grading engine.
#[derive(Debug, Clone)]
pub struct GradingEngineConfig {
    /// Deadline for a single grading attempt.
    pub timeout: Duration,
    /// Retries on transient grader errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay: Duration,
    /// Grade applied when grading ultimately fails. `None` makes the failure an error.
    pub fallback_grade: Option<f64>,
}

impl Default for GradingEngineConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
            fallback_grade: None,
        }
    }
}

/// Progress reporting trait.
pub trait GradingReporter: Send + Sync {
    fn on_grading_start(&self, question_id: &str, attempt: u32);
    fn on_grading_error(&self, attempt: u32, error: &str);
    fn on_grade(&self, grade: f64, elapsed: Duration);
    fn on_fallback(&self, grade: f64);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl GradingReporter for NoopReporter {
    fn on_grading_start(&self, _: &str, _: u32) {}
    fn on_grading_error(&self, _: u32, _: &str) {}
    fn on_grade(&self, _: f64, _: Duration) {}
    fn on_fallback(&self, _: f64) {}
}

/// Finalizes completed sessions.
pub struct GradingEngine {
    grader: Arc<dyn DiscursiveGrader>,
    config: GradingEngineConfig,
}

impl GradingEngine {
    pub fn new(grader: Arc<dyn DiscursiveGrader>, config: GradingEngineConfig) -> Self {
        Self { grader, config }
    }

    pub fn config(&self) -> &GradingEngineConfig {
        &self.config
    }

    pub fn grader_name(&self) -> &str {
        self.grader.name()
    }

    /// Grade the session's discursive answer if needed and build its report.
    ///
    /// A grade already supplied to the session is kept and the grader is not
    /// called. Blocks without a discursive item are reported immediately.
    pub async fn finalize(
        &self,
        session: &mut QuizSession,
        progress: &dyn GradingReporter,
    ) -> Result<BlockReport> {
        if !session.is_completed() {
            anyhow::bail!(
                "block '{}' is not completed ({})",
                session.bank().id(),
                session.phase()
            );
        }

        if session.score().is_some() {
            return BlockReport::from_session(session, None);
        }

        let request = build_request(session)?;
        let details = match self.request_grade(&request, progress).await {
            Ok(response) => {
                session.submit_discursive_grade(response.grade)?;
                GradeDetails {
                    grader: self.grader.name().to_string(),
                    rubric: response.rubric,
                    feedback: response.feedback,
                    fallback: false,
                }
            }
            Err(e) => {
                let Some(fallback) = self.config.fallback_grade else {
                    return Err(e.context(format!(
                        "grading failed for question '{}'",
                        request.question_id
                    )));
                };
                tracing::warn!(
                    "grading failed for '{}', applying fallback grade {}: {:#}",
                    request.question_id,
                    fallback,
                    e
                );
                progress.on_fallback(fallback);
                session
                    .submit_discursive_grade(fallback)
                    .context("invalid fallback grade")?;
                GradeDetails {
                    grader: self.grader.name().to_string(),
                    rubric: None,
                    feedback: None,
                    fallback: true,
                }
            }
        };

        BlockReport::from_session(session, Some(details))
    }

    /// Ask the grader for a grade, retrying transient failures with exponential backoff.
    pub async fn request_grade(
        &self,
        request: &GradeRequest,
        progress: &dyn GradingReporter,
    ) -> Result<GradeResponse> {
        let start = Instant::now();
        let mut last_error = None;
        let mut retry_delay = self.config.retry_delay;

        for attempt in 1..=self.config.max_retries + 1 {
            if attempt > 1 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(Duration::from_secs(60));
            }
            progress.on_grading_start(&request.question_id, attempt);

            match self.attempt(request).await {
                Ok(response) => {
                    tracing::info!(
                        "'{}' graded {} by {} (attempt {})",
                        request.question_id,
                        response.grade,
                        self.grader.name(),
                        attempt
                    );
                    progress.on_grade(response.grade, start.elapsed());
                    return Ok(response);
                }
                Err(e) => {
                    progress.on_grading_error(attempt, &format!("{e:#}"));
                    let permanent = e
                        .downcast_ref::<GradingError>()
                        .is_some_and(GradingError::is_permanent);
                    if permanent {
                        tracing::warn!("grading attempt {attempt} failed permanently: {e:#}");
                        last_error = Some(e);
                        break;
                    }
                    tracing::warn!("grading attempt {attempt} failed: {e:#}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("grading was never attempted")))
    }

    async fn attempt(&self, request: &GradeRequest) -> Result<GradeResponse> {
        let response = if self.grader.interactive() {
            self.grader.grade(request).await?
        } else {
            tokio::time::timeout(self.config.timeout, self.grader.grade(request))
                .await
                .map_err(|_| GradingError::Timeout(self.config.timeout.as_secs()))??
        };

        if DiscursiveGrade::new(response.grade).is_err() {
            return Err(GradingError::InvalidResponse(format!(
                "grade {} is outside 0..=100",
                response.grade
            ))
            .into());
        }
        Ok(response)
    }
}

fn build_request(session: &QuizSession) -> Result<GradeRequest> {
    let (question, text) = session
        .discursive_answer()
        .context("block has no discursive question to grade")?;
    Ok(GradeRequest {
        block_id: session.bank().id().to_string(),
        question_id: question.id.clone(),
        prompt: question.prompt.clone(),
        answer_text: text.map(str::to_string),
        word_count: text.map(crate::model::word_count).unwrap_or(0),
    })
}
