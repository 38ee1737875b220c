//! Operator-scored rubric grader.
//!
//! Shows the discursive answer to a person and asks for points on each
//! rubric criterion over any async reader/writer pair (stdin/stderr in the
//! CLI, in-memory buffers in tests).

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use quizblock_core::error::GradingError;
use quizblock_core::traits::{
    default_rubric, DiscursiveGrader, GradeRequest, GradeResponse, RubricBreakdown,
    RubricCriterion, RubricScore,
};

struct PromptIo<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> PromptIo<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn say(&mut self, text: &str) -> anyhow::Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Print `question` and read one trimmed line. End of input cancels grading.
    async fn ask(&mut self, question: &str) -> anyhow::Result<String> {
        self.say(question).await?;
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Err(GradingError::Cancelled.into());
        }
        Ok(line.trim().to_string())
    }
}

/// Asks an operator to score each rubric criterion.
pub struct RubricPromptGrader<R, W> {
    io: Mutex<PromptIo<R, W>>,
    criteria: Vec<RubricCriterion>,
}

impl<R, W> RubricPromptGrader<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new(PromptIo { reader, writer }),
            criteria: default_rubric(),
        }
    }

    pub fn with_criteria(mut self, criteria: Vec<RubricCriterion>) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn criteria(&self) -> &[RubricCriterion] {
        &self.criteria
    }

    pub fn into_inner(self) -> (R, W) {
        let io = self.io.into_inner();
        (io.reader, io.writer)
    }
}

impl RubricPromptGrader<BufReader<tokio::io::Stdin>, tokio::io::Stderr> {
    /// Grader reading scores from stdin and prompting on stderr.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stderr())
    }
}

#[async_trait]
impl<R, W> DiscursiveGrader for RubricPromptGrader<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &str {
        "rubric-prompt"
    }

    fn interactive(&self) -> bool {
        true
    }

    async fn grade(&self, request: &GradeRequest) -> anyhow::Result<GradeResponse> {
        let mut io = self.io.lock().await;

        io.say(&format!(
            "\n--- Grading '{}' ---\n{}\n\n",
            request.question_id, request.prompt
        ))
        .await?;
        match &request.answer_text {
            Some(text) => {
                io.say(&format!("{text}\n({} words)\n\n", request.word_count))
                    .await?
            }
            None => io.say("(no answer submitted)\n\n").await?,
        }

        let mut scores = Vec::with_capacity(self.criteria.len());
        for criterion in &self.criteria {
            let max = f64::from(criterion.max_points);
            loop {
                let line = io
                    .ask(&format!("{} (0-{}): ", criterion.name, criterion.max_points))
                    .await?;
                match line.parse::<f64>() {
                    Ok(points) if (0.0..=max).contains(&points) => {
                        scores.push(RubricScore {
                            criterion: criterion.name.clone(),
                            awarded: points,
                            max_points: criterion.max_points,
                        });
                        break;
                    }
                    _ => {
                        io.say(&format!(
                            "enter a number between 0 and {}\n",
                            criterion.max_points
                        ))
                        .await?
                    }
                }
            }
        }

        let rubric = RubricBreakdown { scores };
        let feedback = io.ask("Feedback (optional): ").await?;
        tracing::debug!(
            "operator awarded {}/{} for '{}'",
            rubric.awarded(),
            rubric.max_points(),
            request.question_id
        );

        Ok(GradeResponse {
            grade: rubric.percentage(),
            rubric: Some(rubric),
            feedback: (!feedback.is_empty()).then_some(feedback),
        })
    }
}
