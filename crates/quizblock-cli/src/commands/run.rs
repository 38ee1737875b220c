//! The `quizblock run` command.
//!
//! Answers come from stdin, one per line. `:back` returns to the previous
//! question and `:quit` abandons the block. A one-second interval drives the
//! question timers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use quizblock_core::engine::{GradingEngine, GradingReporter};
use quizblock_core::error::QuizError;
use quizblock_core::model::QuestionKind;
use quizblock_core::parser;
use quizblock_core::report::BlockReport;
use quizblock_core::session::{Advance, ItemResult, Phase, QuizSession};
use quizblock_core::timer::LOW_TIME_SECS;
use quizblock_core::traits::DiscursiveGrader;
use quizblock_grading::config::load_config_from;
use quizblock_grading::{create_grader, GraderConfig, RubricPromptGrader};

/// Console progress reporter.
struct ConsoleReporter;

impl GradingReporter for ConsoleReporter {
    fn on_grading_start(&self, question_id: &str, attempt: u32) {
        eprintln!("  Grading: {question_id} (attempt {attempt})");
    }

    fn on_grading_error(&self, attempt: u32, error: &str) {
        eprintln!("  ERROR: grading attempt {attempt}: {error}");
    }

    fn on_grade(&self, grade: f64, elapsed: Duration) {
        eprintln!("  Graded: {grade:.1} ({:.1}s)", elapsed.as_secs_f64());
    }

    fn on_fallback(&self, grade: f64) {
        eprintln!("  Grading failed, using fallback grade {grade:.1}");
    }
}

enum Flow {
    Continue,
    Quit,
}

pub async fn execute(
    bank_path: PathBuf,
    grade: Option<f64>,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    no_timer: bool,
    format: String,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(grade) = grade {
        anyhow::ensure!(
            (0.0..=100.0).contains(&grade),
            "--grade must be between 0 and 100"
        );
        config.grader = GraderConfig::Fixed {
            grade,
            feedback: None,
        };
    }

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "markdown"]
    } else {
        format.split(',').map(str::trim).collect()
    };
    for fmt in &formats {
        anyhow::ensure!(
            matches!(*fmt, "json" | "markdown" | "md"),
            "unknown format: {fmt}"
        );
    }

    let bank = parser::parse_bank(&bank_path)?;
    for w in parser::validate_bank(&bank) {
        tracing::warn!(
            "{}: {}",
            w.question_id.as_deref().unwrap_or(bank.id()),
            w.message
        );
    }

    let timer_enabled = config.timer_enabled && !no_timer;
    let mut session = QuizSession::with_policy(bank, config.session_policy())?;
    eprintln!(
        "quizblock v{}: {} ({} questions)",
        env!("CARGO_PKG_VERSION"),
        session.bank().title(),
        session.bank().count()
    );
    eprintln!("Type an option id or your answer and press Enter. `:back` goes back, `:quit` exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    render(&session, timer_enabled);
    while !session.is_completed() {
        let before = session.phase();
        tokio::select! {
            _ = ticker.tick(), if timer_enabled => on_tick(&mut session),
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read answer from stdin")? else {
                    anyhow::bail!(
                        "input ended before block '{}' was completed",
                        session.bank().id()
                    );
                };
                if let Flow::Quit = handle_line(&mut session, line.trim(), timer_enabled) {
                    eprintln!("Block abandoned, no report written.");
                    return Ok(());
                }
            }
        }
        // a new question gets a full first second
        if session.phase() != before && matches!(session.phase(), Phase::Answering { .. }) {
            ticker.reset();
        }
    }

    let grader: Arc<dyn DiscursiveGrader> = match &config.grader {
        GraderConfig::RubricPrompt => Arc::new(RubricPromptGrader::new(
            lines.into_inner(),
            tokio::io::stderr(),
        )),
        other => create_grader(other)?,
    };
    let engine = GradingEngine::new(grader, config.engine_config());
    let report = engine.finalize(&mut session, &ConsoleReporter).await?;

    print_summary(&report);

    let output = output.unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&output)
        .with_context(|| format!("failed to create output directory {}", output.display()))?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let stem = format!("{}-{timestamp}", report.block.id);

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("{stem}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "markdown" | "md" => {
                let path = output.join(format!("{stem}.md"));
                std::fs::write(&path, report.to_markdown())
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
                eprintln!("Markdown report: {}", path.display());
            }
            _ => {}
        }
    }

    Ok(())
}

fn handle_line(session: &mut QuizSession, line: &str, timer_enabled: bool) -> Flow {
    let outcome = match line {
        ":quit" => return Flow::Quit,
        ":back" => {
            let moved = session.go_to_previous();
            if moved.is_ok() {
                render(session, timer_enabled);
            }
            moved
        }
        _ => match session.phase() {
            Phase::ResultShown { .. } => advance(session, timer_enabled),
            Phase::Answering { .. } => answer(session, line, timer_enabled),
            Phase::Completed => Ok(()),
        },
    };
    if let Err(e) = outcome {
        eprintln!("  {e}");
    }
    Flow::Continue
}

fn answer(session: &mut QuizSession, line: &str, timer_enabled: bool) -> Result<(), QuizError> {
    match session.current_question().map(|q| q.kind) {
        Some(QuestionKind::MultipleChoice) => {
            if !line.is_empty() {
                session.submit_answer(line)?;
            }
            print_result(session.request_result()?);
        }
        Some(QuestionKind::Discursive) => {
            if !line.is_empty() {
                session.submit_answer(line)?;
            }
            advance(session, timer_enabled)?;
        }
        None => {}
    }
    Ok(())
}

fn advance(session: &mut QuizSession, timer_enabled: bool) -> Result<(), QuizError> {
    match session.advance()? {
        Advance::Next { .. } => render(session, timer_enabled),
        Advance::Completed => println!("\nBlock complete."),
    }
    Ok(())
}

fn on_tick(session: &mut QuizSession) {
    if session.tick() {
        match session.current_question().map(|q| q.kind) {
            Some(QuestionKind::MultipleChoice) => {
                println!("\nTime is up!");
                match session.request_result() {
                    Ok(result) => print_result(result),
                    Err(e) => eprintln!("  {e}"),
                }
            }
            Some(QuestionKind::Discursive) => {
                println!("\nTime is up! Submit what you have, or press Enter to finish.");
            }
            None => {}
        }
    } else if session.timer().is_running() && session.timer().remaining() == LOW_TIME_SECS {
        println!("  {} remaining", session.timer());
    }
}

fn render(session: &QuizSession, timer_enabled: bool) {
    let Some(view) = session.current_view() else {
        return;
    };
    let snapshot = session.snapshot();

    println!(
        "\nQuestion {}/{} [{}, {}]",
        snapshot.progress_current,
        snapshot.question_count,
        view.kind,
        view.difficulty.label()
    );
    if !view.title.is_empty() {
        println!("{}", view.title);
    }
    println!("{}", view.prompt.trim());
    for option in &view.options {
        println!("  {}) {}", option.id, option.text);
    }

    if snapshot.answered {
        if let Some(previous) = session.answers().get(view.position) {
            println!("(current answer: {previous})");
        }
    }
    if session.is_expired(view.position) {
        println!("(time expired earlier; press Enter to keep the current answer)");
    } else if timer_enabled && snapshot.timer.running {
        println!("Time limit: {}", session.timer());
    }
    if view.kind == QuestionKind::Discursive {
        println!(
            "Answer on one line, at least {} words.",
            session.policy().min_discursive_words
        );
    }
}

fn print_result(result: &ItemResult) {
    match (result.correct, result.correct_option.as_deref()) {
        (Some(true), _) => println!("Correct!"),
        (Some(false), Some(expected)) if result.answered => {
            println!("Incorrect. The correct option was {expected}.")
        }
        (Some(false), Some(expected)) => println!("No answer. The correct option was {expected}."),
        _ => {}
    }
    println!("Press Enter to continue.");
}

fn print_summary(report: &BlockReport) {
    println!("\n{}", super::show::item_table(report));
    println!("{}", score_table(report));
    if let Some(feedback) = &report.feedback {
        println!("Feedback: {feedback}");
    }
}

pub fn score_table(report: &BlockReport) -> Table {
    let score = &report.score;
    let mut table = Table::new();
    table.set_header(vec!["Objective", "Discursive", "Composite"]);
    table.add_row(vec![
        Cell::new(format!(
            "{}/{} ({:.1}%)",
            score.objective_correct, score.objective_total, score.objective_percent
        )),
        Cell::new(
            score
                .discursive_percent
                .map(|d| format!("{d:.1}%"))
                .unwrap_or_else(|| "-".to_string()),
        ),
        Cell::new(score.composite),
    ]);
    table
}
