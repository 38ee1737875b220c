//! Mock grader for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use quizblock_core::error::GradingError;
use quizblock_core::traits::{DiscursiveGrader, GradeRequest, GradeResponse};

/// One scripted reaction of the mock.
#[derive(Debug)]
pub enum MockOutcome {
    Grade(f64),
    Fail(GradingError),
    /// Sleep for the given time before grading with the default grade.
    Delay(Duration),
}

/// A mock grader for exercising the engine without a person or channel.
///
/// Replays scripted outcomes in order, then falls back to the default grade.
pub struct MockGrader {
    script: Mutex<VecDeque<MockOutcome>>,
    default_grade: f64,
    call_count: AtomicU32,
    last_request: Mutex<Option<GradeRequest>>,
}

impl MockGrader {
    pub fn new(script: Vec<MockOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            default_grade: 0.0,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same grade.
    pub fn with_fixed_grade(grade: f64) -> Self {
        Self {
            default_grade: grade,
            ..Self::new(Vec::new())
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<GradeRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

#[async_trait]
impl DiscursiveGrader for MockGrader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn grade(&self, request: &GradeRequest) -> anyhow::Result<GradeResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(MockOutcome::Grade(grade)) => Ok(GradeResponse::plain(grade)),
            Some(MockOutcome::Fail(e)) => Err(e.into()),
            Some(MockOutcome::Delay(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(GradeResponse::plain(self.default_grade))
            }
            None => Ok(GradeResponse::plain(self.default_grade)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use quizblock_core::bank::QuestionBank;
    use quizblock_core::engine::{GradingEngine, GradingEngineConfig, NoopReporter};
    use quizblock_core::model::{AnswerOption, Question};
    use quizblock_core::session::QuizSession;

    fn completed_session() -> QuizSession {
        let bank = QuestionBank::new(
            "b",
            "B",
            vec![
                Question::multiple_choice(
                    "q1",
                    "Pick",
                    vec![
                        AnswerOption::new("a", "A", true),
                        AnswerOption::new("b", "B", false),
                    ],
                ),
                Question::discursive("essay", "Explain").with_time_limit(1),
            ],
        )
        .unwrap();
        let mut session = QuizSession::new(bank).unwrap();
        session.submit_answer("b").unwrap();
        session.request_result().unwrap();
        session.advance().unwrap();
        // essay expires unanswered
        assert!(session.tick());
        session.advance().unwrap();
        session
    }

    #[tokio::test]
    async fn fixed_grade() {
        let grader = MockGrader::with_fixed_grade(40.0);
        let request = GradeRequest {
            block_id: "b".into(),
            question_id: "essay".into(),
            prompt: "Explain".into(),
            answer_text: None,
            word_count: 0,
        };
        assert_eq!(grader.grade(&request).await.unwrap().grade, 40.0);
        assert_eq!(grader.call_count(), 1);
        assert_eq!(grader.last_request().unwrap().question_id, "essay");
    }

    #[tokio::test]
    async fn expired_essay_is_still_graded() {
        let grader = Arc::new(MockGrader::with_fixed_grade(20.0));
        let engine = GradingEngine::new(grader.clone(), GradingEngineConfig::default());
        let mut session = completed_session();

        let report = engine.finalize(&mut session, &NoopReporter).await.unwrap();
        let request = grader.last_request().unwrap();
        assert!(request.answer_text.is_none());
        assert_eq!(request.word_count, 0);
        assert!(report.items[1].expired);
        // 0 × 0.6 + 20 × 0.4
        assert_eq!(report.score.composite, 8);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_grader_times_out_and_retries() {
        let grader = Arc::new(MockGrader::new(vec![
            MockOutcome::Delay(Duration::from_secs(120)),
            MockOutcome::Fail(GradingError::Unavailable("busy".into())),
            MockOutcome::Grade(90.0),
        ]));
        let config = GradingEngineConfig {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_delay: Duration::from_millis(100),
            fallback_grade: None,
        };
        let engine = GradingEngine::new(grader.clone(), config);
        let mut session = completed_session();

        let report = engine.finalize(&mut session, &NoopReporter).await.unwrap();
        assert_eq!(grader.call_count(), 3);
        assert_eq!(report.score.discursive_percent, Some(90.0));
    }

    #[tokio::test]
    async fn exhausted_retries_without_fallback_fail() {
        let grader = Arc::new(MockGrader::new(vec![
            MockOutcome::Fail(GradingError::Unavailable("down".into())),
            MockOutcome::Fail(GradingError::Unavailable("down".into())),
        ]));
        let config = GradingEngineConfig {
            max_retries: 1,
            retry_delay: Duration::from_millis(1),
            ..GradingEngineConfig::default()
        };
        let engine = GradingEngine::new(grader.clone(), config);
        let mut session = completed_session();

        let err = engine
            .finalize(&mut session, &NoopReporter)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("down"));
        assert_eq!(grader.call_count(), 2);
        assert!(session.is_awaiting_grade());
    }
}
