//! TOML question bank parser.
//!
//! Loads blocks from TOML files and directories, and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::bank::QuestionBank;
use crate::model::{AnswerOption, Difficulty, Question, QuestionKind};

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    block: TomlBlockHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBlockHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    kind: String,
    #[serde(default)]
    title: String,
    prompt: String,
    #[serde(default = "default_difficulty")]
    difficulty: u8,
    #[serde(default)]
    time_limit_secs: Option<u32>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    options: Vec<TomlOption>,
}

#[derive(Debug, Deserialize)]
struct TomlOption {
    id: String,
    text: String,
    #[serde(default)]
    correct: bool,
}

fn default_difficulty() -> u8 {
    Difficulty::MIN
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bank file: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let kind: QuestionKind = q
                .kind
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question '{}': {}", q.id, e))?;
            let difficulty = Difficulty::new(q.difficulty)
                .with_context(|| format!("question '{}'", q.id))?;

            let options = q
                .options
                .into_iter()
                .map(|o| AnswerOption::new(o.id, o.text, o.correct))
                .collect();

            Ok(Question {
                id: q.id,
                position: 0,
                kind,
                title: q.title,
                prompt: q.prompt,
                options,
                time_limit_secs: q.time_limit_secs,
                difficulty,
                tags: q.tags,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let bank = QuestionBank::new(parsed.block.id, parsed.block.title, questions)
        .with_context(|| format!("invalid bank: {}", source_path.display()))?;

    Ok(bank.with_description(parsed.block.description))
}

/// Recursively load all `.toml` bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check a structurally valid bank for authoring issues.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if bank.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "block has no questions and cannot be started".into(),
        });
        return warnings;
    }

    if bank.discursive_position().is_none() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "block has no discursive question; composite equals the objective score"
                .into(),
        });
    }

    for q in bank.questions() {
        if q.prompt.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "prompt is empty".into(),
            });
        }
        if q.options.iter().any(|o| o.text.trim().is_empty()) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "an option has empty text".into(),
            });
        }
    }

    // A partly timed block usually means a forgotten limit
    let timed = bank
        .questions()
        .iter()
        .filter(|q| q.time_limit_secs.is_some())
        .count();
    if timed > 0 {
        for q in bank
            .questions()
            .iter()
            .filter(|q| q.is_objective() && q.time_limit_secs.is_none())
        {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "no time_limit_secs while other questions in the block are timed".into(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[block]
id = "behaviorism-1"
title = "Behaviorism - Block 1"
description = "Classical and operant conditioning"

[[questions]]
id = "q1"
kind = "multiple-choice"
title = "Classical conditioning"
prompt = "In Pavlov's experiment, what is the natural response to an unconditioned stimulus called?"
difficulty = 2
time_limit_secs = 120
tags = ["behaviorism", "pavlov"]

[[questions.options]]
id = "a"
text = "Conditioned response"

[[questions.options]]
id = "b"
text = "Unconditioned response"
correct = true

[[questions]]
id = "q2"
kind = "discursive"
prompt = "Explain how classical and operant conditioning can be combined."
difficulty = 4
time_limit_secs = 600
"#;

    #[test]
    fn parse_valid_toml() {
        let bank = parse_bank_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(bank.id(), "behaviorism-1");
        assert_eq!(bank.title(), "Behaviorism - Block 1");
        assert_eq!(bank.count(), 2);
        let q1 = bank.question_at(0).unwrap();
        assert_eq!(q1.kind, QuestionKind::MultipleChoice);
        assert_eq!(q1.time_limit_secs, Some(120));
        assert_eq!(q1.correct_option().unwrap().id, "b");
        assert_eq!(bank.question_at(1).unwrap().difficulty.label(), "Hard");
        assert_eq!(bank.discursive_position(), Some(1));
    }

    #[test]
    fn parse_missing_optional_fields() {
        let toml = r#"
[block]
id = "minimal"
title = "Minimal"

[[questions]]
id = "only"
kind = "discursive"
prompt = "Write something"
"#;
        let bank = parse_bank_str(toml, &PathBuf::from("test.toml")).unwrap();
        let q = bank.question_at(0).unwrap();
        assert_eq!(q.difficulty.tier(), 1);
        assert!(q.time_limit_secs.is_none());
        assert!(q.tags.is_empty());
        assert!(bank.description().is_empty());
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        let toml = r#"
[block]
id = "bad"
title = "Bad"

[[questions]]
id = "q1"
kind = "true-false"
prompt = "?"
"#;
        let err = parse_bank_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("unknown question kind"));
    }

    #[test]
    fn parse_rejects_structurally_invalid_bank() {
        let toml = r#"
[block]
id = "bad"
title = "Bad"

[[questions]]
id = "q1"
kind = "multiple-choice"
prompt = "No correct option"

[[questions.options]]
id = "a"
text = "A"

[[questions.options]]
id = "b"
text = "B"
"#;
        let err = parse_bank_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("0 correct options"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_bank_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_flags_untimed_objective_in_timed_block() {
        let toml = r#"
[block]
id = "mixed"
title = "Mixed"

[[questions]]
id = "timed"
kind = "mc"
prompt = "?"
time_limit_secs = 60
options = [{ id = "a", text = "A", correct = true }, { id = "b", text = "B" }]

[[questions]]
id = "untimed"
kind = "mc"
prompt = "?"
options = [{ id = "a", text = "A", correct = true }, { id = "b", text = "" }]
"#;
        let bank = parse_bank_str(toml, &PathBuf::from("mixed.toml")).unwrap();
        let warnings = validate_bank(&bank);
        assert!(warnings
            .iter()
            .any(|w| w.question_id.as_deref() == Some("untimed")
                && w.message.contains("time_limit_secs")));
        assert!(warnings.iter().any(|w| w.message.contains("empty text")));
        assert!(warnings.iter().any(|w| w.message.contains("no discursive")));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("block.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "not toml {").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let banks = load_bank_directory(dir.path()).unwrap();
        assert_eq!(banks.len(), 1);
        assert_eq!(banks[0].id(), "behaviorism-1");
    }
}
