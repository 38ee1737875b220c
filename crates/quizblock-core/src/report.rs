//! Block report types with JSON persistence and markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QuizError;
use crate::model::{AnswerValue, QuestionKind};
use crate::scoring::ScoreBreakdown;
use crate::session::QuizSession;
use crate::traits::RubricBreakdown;

/// The outcome of one scored block pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the block.
    pub block: BlockSummary,
    /// One entry per position, in order.
    pub items: Vec<ItemOutcome>,
    /// Final score.
    pub score: ScoreBreakdown,
    /// Rubric breakdown of the discursive grade, if the grader produced one.
    #[serde(default)]
    pub rubric: Option<RubricBreakdown>,
    /// Grader feedback on the discursive answer.
    #[serde(default)]
    pub feedback: Option<String>,
    /// Name of the grader that produced the discursive grade.
    #[serde(default)]
    pub grader: Option<String>,
    /// The discursive grade is the configured fallback.
    #[serde(default)]
    pub fallback_applied: bool,
    /// Seconds from session start to completion.
    pub duration_secs: i64,
}

/// Summary of a block (without the answer key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSummary {
    pub id: String,
    pub title: String,
    pub question_count: usize,
}

/// What happened at one position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub position: usize,
    pub question_id: String,
    pub title: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub answer: Option<AnswerValue>,
    /// Objective items only.
    #[serde(default)]
    pub correct: Option<bool>,
    /// Objective items only.
    #[serde(default)]
    pub correct_option: Option<String>,
    pub expired: bool,
}

/// How the discursive grade was obtained.
#[derive(Debug, Clone, Default)]
pub struct GradeDetails {
    pub grader: String,
    pub rubric: Option<RubricBreakdown>,
    pub feedback: Option<String>,
    pub fallback: bool,
}

impl BlockReport {
    /// Build a report from a completed, scored session.
    pub fn from_session(session: &QuizSession, details: Option<GradeDetails>) -> Result<Self> {
        let score = session
            .score()
            .cloned()
            .ok_or_else(|| {
                QuizError::NotReady(format!("block '{}' has no score yet", session.bank().id()))
            })?;

        let bank = session.bank();
        let answers = session.answers();
        let items = bank
            .questions()
            .iter()
            .map(|q| {
                let answer = answers.get(q.position).cloned();
                let correct_option = q.correct_option().map(|o| o.id.clone());
                let correct = q.is_objective().then(|| {
                    answers.choice(q.position).is_some()
                        && answers.choice(q.position) == correct_option.as_deref()
                });
                ItemOutcome {
                    position: q.position,
                    question_id: q.id.clone(),
                    title: q.title.clone(),
                    kind: q.kind,
                    answer,
                    correct,
                    correct_option,
                    expired: session.is_expired(q.position),
                }
            })
            .collect();

        let completed_at = session.completed_at().unwrap_or_else(Utc::now);
        let details = details.unwrap_or_default();
        let has_grader = !details.grader.is_empty();

        Ok(Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            block: BlockSummary {
                id: bank.id().to_string(),
                title: bank.title().to_string(),
                question_count: bank.count(),
            },
            items,
            score,
            rubric: details.rubric,
            feedback: details.feedback,
            grader: has_grader.then_some(details.grader),
            fallback_applied: details.fallback,
            duration_secs: (completed_at - session.started_at()).num_seconds().max(0),
        })
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: BlockReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("# {}\n\n", self.block.title));
        md.push_str(&format!(
            "**Score:** {} (objective {}/{} = {:.1}%",
            self.score.composite,
            self.score.objective_correct,
            self.score.objective_total,
            self.score.objective_percent
        ));
        match self.score.discursive_percent {
            Some(d) => md.push_str(&format!(", discursive {d:.1}%)\n\n")),
            None => md.push_str(")\n\n"),
        }

        md.push_str("| # | Question | Kind | Answer | Result |\n");
        md.push_str("|---|----------|------|--------|--------|\n");
        for item in &self.items {
            let answer = match &item.answer {
                Some(AnswerValue::Choice(id)) => id.clone(),
                Some(AnswerValue::Text(text)) => {
                    format!("{} words", crate::model::word_count(text))
                }
                None => "-".to_string(),
            };
            let result = match item.correct {
                Some(true) => "correct".to_string(),
                Some(false) => match &item.correct_option {
                    Some(id) => format!("incorrect (expected {id})"),
                    None => "incorrect".to_string(),
                },
                None => "graded".to_string(),
            };
            let expired = if item.expired { " (time expired)" } else { "" };
            let name = if item.title.is_empty() {
                &item.question_id
            } else {
                &item.title
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {}{} |\n",
                item.position + 1,
                name,
                item.kind,
                answer,
                result,
                expired
            ));
        }
        md.push('\n');

        if let Some(rubric) = &self.rubric {
            md.push_str("### Rubric\n\n");
            md.push_str("| Criterion | Points |\n");
            md.push_str("|-----------|--------|\n");
            for s in &rubric.scores {
                md.push_str(&format!(
                    "| {} | {:.1}/{} |\n",
                    s.criterion, s.awarded, s.max_points
                ));
            }
            md.push('\n');
        }

        if let Some(feedback) = &self.feedback {
            md.push_str("### Feedback\n\n");
            md.push_str(feedback);
            md.push_str("\n\n");
        }

        if let Some(grader) = &self.grader {
            md.push_str(&format!("_Graded by {grader}"));
            if self.fallback_applied {
                md.push_str(" (fallback grade applied)");
            }
            md.push_str("_\n");
        }

        md
    }
}
