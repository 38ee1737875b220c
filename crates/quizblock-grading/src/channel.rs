//! Grader that hands discursive answers to another task.
//!
//! `ChannelGrader` sends each request as a `GradeTicket` through a tokio
//! channel; whoever owns the `GradeInbox` answers it whenever the grade is
//! ready. The session stays in its waiting state in the meantime.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use quizblock_core::error::GradingError;
use quizblock_core::traits::{DiscursiveGrader, GradeRequest, GradeResponse};

/// A pending grading request.
#[derive(Debug)]
pub struct GradeTicket {
    request: GradeRequest,
    reply: oneshot::Sender<GradeResponse>,
}

impl GradeTicket {
    pub fn request(&self) -> &GradeRequest {
        &self.request
    }

    /// Deliver the grade. Fails if the requester has gone away.
    pub fn respond(self, response: GradeResponse) -> anyhow::Result<()> {
        self.reply
            .send(response)
            .map_err(|_| anyhow::anyhow!("grade requester for '{}' is gone", self.request.question_id))
    }
}

/// Sending half; implements `DiscursiveGrader`.
#[derive(Debug, Clone)]
pub struct ChannelGrader {
    tx: mpsc::Sender<GradeTicket>,
}

/// Receiving half, owned by whoever produces grades.
#[derive(Debug)]
pub struct GradeInbox {
    rx: mpsc::Receiver<GradeTicket>,
}

impl GradeInbox {
    /// Wait for the next request. `None` once every grader handle is dropped.
    pub async fn recv(&mut self) -> Option<GradeTicket> {
        self.rx.recv().await
    }
}

/// Create a connected grader/inbox pair holding up to `capacity` pending tickets.
pub fn grade_channel(capacity: usize) -> (ChannelGrader, GradeInbox) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelGrader { tx }, GradeInbox { rx })
}

#[async_trait]
impl DiscursiveGrader for ChannelGrader {
    fn name(&self) -> &str {
        "channel"
    }

    async fn grade(&self, request: &GradeRequest) -> anyhow::Result<GradeResponse> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(GradeTicket {
                request: request.clone(),
                reply,
            })
            .await
            .map_err(|_| GradingError::Unavailable("grade inbox is closed".into()))?;
        tracing::debug!("grade request for '{}' queued", request.question_id);

        response.await.map_err(|_| GradingError::Cancelled.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use quizblock_core::bank::QuestionBank;
    use quizblock_core::engine::{GradingEngine, GradingEngineConfig, NoopReporter};
    use quizblock_core::model::Question;
    use quizblock_core::session::QuizSession;

    fn request() -> GradeRequest {
        GradeRequest {
            block_id: "b".into(),
            question_id: "essay".into(),
            prompt: "Explain".into(),
            answer_text: Some("text".into()),
            word_count: 1,
        }
    }

    #[tokio::test]
    async fn grade_arrives_from_another_task() {
        let (grader, mut inbox) = grade_channel(4);
        let worker = tokio::spawn(async move {
            let ticket = inbox.recv().await.unwrap();
            assert_eq!(ticket.request().question_id, "essay");
            tokio::time::sleep(Duration::from_millis(5)).await;
            ticket.respond(GradeResponse::plain(64.0)).unwrap();
        });

        let response = grader.grade(&request()).await.unwrap();
        assert_eq!(response.grade, 64.0);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn closed_inbox_is_unavailable() {
        let (grader, inbox) = grade_channel(1);
        drop(inbox);
        let err = grader.grade(&request()).await.unwrap_err();
        let err = err.downcast_ref::<GradingError>().unwrap();
        assert!(matches!(err, GradingError::Unavailable(_)));
        assert!(!err.is_permanent());
    }

    #[tokio::test]
    async fn dropped_ticket_cancels() {
        let (grader, mut inbox) = grade_channel(1);
        tokio::spawn(async move {
            let ticket = inbox.recv().await;
            drop(ticket);
        });
        let err = grader.grade(&request()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GradingError>(),
            Some(GradingError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn engine_waits_for_late_grade() {
        let bank = QuestionBank::new("b", "B", vec![Question::discursive("essay", "Explain")])
            .unwrap();
        let mut session = QuizSession::new(bank).unwrap();
        session.submit_answer(&vec!["word"; 50].join(" ")).unwrap();
        session.advance().unwrap();
        assert!(session.is_awaiting_grade());

        let (grader, mut inbox) = grade_channel(1);
        tokio::spawn(async move {
            if let Some(ticket) = inbox.recv().await {
                let _ = ticket.respond(GradeResponse::plain(88.0));
            }
        });

        let engine = GradingEngine::new(Arc::new(grader), GradingEngineConfig::default());
        let report = engine.finalize(&mut session, &NoopReporter).await.unwrap();
        assert_eq!(report.score.composite, 88);
        assert_eq!(report.grader.as_deref(), Some("channel"));
    }
}
