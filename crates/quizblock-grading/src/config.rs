//! quizblock configuration and grader factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizblock_core::engine::GradingEngineConfig;
use quizblock_core::scoring::DiscursiveGrade;
use quizblock_core::session::{SessionPolicy, MAX_DISCURSIVE_CHARS, MIN_DISCURSIVE_WORDS};
use quizblock_core::traits::DiscursiveGrader;

use crate::fixed::FixedGrader;
use crate::prompt::RubricPromptGrader;

/// Environment variable forcing a fixed discursive grade.
pub const FIXED_GRADE_ENV: &str = "QUIZBLOCK_FIXED_GRADE";

/// Which grader produces the discursive grade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GraderConfig {
    Fixed {
        grade: f64,
        #[serde(default)]
        feedback: Option<String>,
    },
    #[default]
    RubricPrompt,
}

/// Top-level quizblock configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizblockConfig {
    #[serde(default)]
    pub grader: GraderConfig,
    /// Grade applied when grading fails; unset makes the failure an error.
    #[serde(default)]
    pub fallback_grade: Option<f64>,
    #[serde(default = "default_grading_timeout")]
    pub grading_timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_min_words")]
    pub min_discursive_words: usize,
    #[serde(default = "default_max_chars")]
    pub max_discursive_chars: usize,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_timer_enabled")]
    pub timer_enabled: bool,
}

fn default_grading_timeout() -> u64 {
    30
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    500
}
fn default_min_words() -> usize {
    MIN_DISCURSIVE_WORDS
}
fn default_max_chars() -> usize {
    MAX_DISCURSIVE_CHARS
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./quizblock-results")
}
fn default_timer_enabled() -> bool {
    true
}

impl Default for QuizblockConfig {
    fn default() -> Self {
        Self {
            grader: GraderConfig::default(),
            fallback_grade: None,
            grading_timeout_secs: default_grading_timeout(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            min_discursive_words: default_min_words(),
            max_discursive_chars: default_max_chars(),
            output_dir: default_output_dir(),
            timer_enabled: default_timer_enabled(),
        }
    }
}

impl QuizblockConfig {
    pub fn engine_config(&self) -> GradingEngineConfig {
        GradingEngineConfig {
            timeout: Duration::from_secs(self.grading_timeout_secs),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            fallback_grade: self.fallback_grade,
        }
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            min_discursive_words: self.min_discursive_words,
            max_discursive_chars: self.max_discursive_chars,
        }
    }

    /// Reject values no session could work with.
    pub fn validate(&self) -> Result<()> {
        if let GraderConfig::Fixed { grade, .. } = &self.grader {
            DiscursiveGrade::new(*grade).context("invalid fixed grade")?;
        }
        if let Some(fallback) = self.fallback_grade {
            DiscursiveGrade::new(fallback).context("invalid fallback_grade")?;
        }
        if self.grading_timeout_secs == 0 {
            anyhow::bail!("grading_timeout_secs must be at least 1");
        }
        if self.min_discursive_words > 0 && self.max_discursive_chars < self.min_discursive_words {
            anyhow::bail!(
                "max_discursive_chars ({}) cannot hold min_discursive_words ({})",
                self.max_discursive_chars,
                self.min_discursive_words
            );
        }
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in `load_config_from`).
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = lookup(FIXED_GRADE_ENV) {
            let grade: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("{FIXED_GRADE_ENV} is not a number: {value}"))?;
            tracing::debug!("{FIXED_GRADE_ENV} forces fixed grade {grade}");
            self.grader = GraderConfig::Fixed {
                grade,
                feedback: None,
            };
        }
        Ok(())
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizblock.toml` in the current directory
/// 2. `~/.config/quizblock/config.toml`
///
/// Environment variable override: `QUIZBLOCK_FIXED_GRADE`.
pub fn load_config() -> Result<QuizblockConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizblockConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizblock.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!("loading config from {}", path.display());
            toml::from_str::<QuizblockConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizblockConfig::default(),
    };

    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizblock"))
}

/// Create a grader instance from its configuration.
pub fn create_grader(config: &GraderConfig) -> Result<Arc<dyn DiscursiveGrader>> {
    match config {
        GraderConfig::Fixed { grade, feedback } => {
            DiscursiveGrade::new(*grade).context("invalid fixed grade")?;
            let grader = match feedback {
                Some(text) => FixedGrader::new(*grade).with_feedback(text.clone()),
                None => FixedGrader::new(*grade),
            };
            Ok(Arc::new(grader))
        }
        GraderConfig::RubricPrompt => Ok(Arc::new(RubricPromptGrader::stdio())),
    }
}
