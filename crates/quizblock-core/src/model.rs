//! Core data model types for quizblock.
//!
//! Questions, their options, and the raw answers a learner gives to them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BankError;

/// Kind of assessment item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    /// Objective item with a single correct option and immediate feedback.
    MultipleChoice,
    /// Free-text item graded outside the core.
    Discursive,
}

impl QuestionKind {
    /// Whether the item shows correctness right after the answer is final.
    pub fn shows_immediate_feedback(self) -> bool {
        matches!(self, QuestionKind::MultipleChoice)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::MultipleChoice => write!(f, "multiple-choice"),
            QuestionKind::Discursive => write!(f, "discursive"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "multiple-choice" | "multiple_choice" | "mc" => Ok(QuestionKind::MultipleChoice),
            "discursive" | "essay" => Ok(QuestionKind::Discursive),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// Difficulty tier, 1 (basic) to 5 (expert).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(tier: u8) -> Result<Self, BankError> {
        if (Self::MIN..=Self::MAX).contains(&tier) {
            Ok(Self(tier))
        } else {
            Err(BankError::InvalidDifficulty(tier))
        }
    }

    pub fn tier(self) -> u8 {
        self.0
    }

    /// Human-readable label for the tier.
    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Basic",
            2 => "Easy",
            3 => "Medium",
            4 => "Hard",
            _ => "Expert",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = BankError;

    fn try_from(tier: u8) -> Result<Self, Self::Error> {
        Self::new(tier)
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One selectable option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Option identity, unique within its question (e.g. "a").
    pub id: String,
    /// Text shown to the learner.
    pub text: String,
    #[serde(default)]
    correct: bool,
}

impl AnswerOption {
    pub fn new(id: impl Into<String>, text: impl Into<String>, correct: bool) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            correct,
        }
    }

    /// Correctness flag. Not part of the learner-facing `QuestionView`.
    pub fn is_correct(&self) -> bool {
        self.correct
    }
}

/// A single assessment item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier.
    pub id: String,
    /// 0-indexed position in the owning bank. Assigned by `QuestionBank::new`.
    #[serde(default)]
    pub position: usize,
    pub kind: QuestionKind,
    /// Short heading.
    #[serde(default)]
    pub title: String,
    /// Question text.
    pub prompt: String,
    /// Ordered options (multiple-choice only).
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    /// Countdown in seconds; `None` means no time pressure.
    #[serde(default)]
    pub time_limit_secs: Option<u32>,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Informational tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Question {
    pub fn multiple_choice(
        id: impl Into<String>,
        prompt: impl Into<String>,
        options: Vec<AnswerOption>,
    ) -> Self {
        Self::new(id, QuestionKind::MultipleChoice, prompt, options)
    }

    pub fn discursive(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(id, QuestionKind::Discursive, prompt, Vec::new())
    }

    fn new(
        id: impl Into<String>,
        kind: QuestionKind,
        prompt: impl Into<String>,
        options: Vec<AnswerOption>,
    ) -> Self {
        Self {
            id: id.into(),
            position: 0,
            kind,
            title: String::new(),
            prompt: prompt.into(),
            options,
            time_limit_secs: None,
            difficulty: Difficulty::default(),
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_time_limit(mut self, secs: u32) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_objective(&self) -> bool {
        self.kind == QuestionKind::MultipleChoice
    }

    /// The single correct option, if this is a multiple-choice item.
    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.is_correct())
    }

    pub fn option(&self, id: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == id)
    }

    /// Learner-facing projection without correctness flags.
    pub fn learner_view(&self) -> QuestionView {
        QuestionView {
            id: self.id.clone(),
            position: self.position,
            kind: self.kind,
            title: self.title.clone(),
            prompt: self.prompt.clone(),
            options: self
                .options
                .iter()
                .map(|o| OptionView {
                    id: o.id.clone(),
                    text: o.text.clone(),
                })
                .collect(),
            time_limit_secs: self.time_limit_secs,
            difficulty: self.difficulty,
            tags: self.tags.clone(),
        }
    }
}

/// What a learner may see of a question before it is scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub position: usize,
    pub kind: QuestionKind,
    pub title: String,
    pub prompt: String,
    pub options: Vec<OptionView>,
    pub time_limit_secs: Option<u32>,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub id: String,
    pub text: String,
}

/// Raw learner answer for one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AnswerValue {
    /// Selected option identity (multiple-choice).
    Choice(String),
    /// Free text (discursive).
    Text(String),
}

impl AnswerValue {
    pub fn as_str(&self) -> &str {
        match self {
            AnswerValue::Choice(s) | AnswerValue::Text(s) => s,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
