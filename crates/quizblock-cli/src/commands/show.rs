//! The `quizblock show` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizblock_core::model::AnswerValue;
use quizblock_core::report::BlockReport;

pub fn execute(report_path: PathBuf, format: String) -> Result<()> {
    let report = BlockReport::load_json(&report_path)?;

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "{} ({}), completed {}",
                report.block.title,
                report.block.id,
                report.created_at.format("%Y-%m-%d %H:%M")
            );
            println!("{}", item_table(&report));
            println!("{}", super::run::score_table(&report));
            if let Some(feedback) = &report.feedback {
                println!("Feedback: {feedback}");
            }
        }
    }

    Ok(())
}

pub fn item_table(report: &BlockReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "Kind", "Answer", "Result"]);

    for item in &report.items {
        let answer = match &item.answer {
            Some(AnswerValue::Choice(id)) => id.clone(),
            Some(AnswerValue::Text(text)) => {
                format!("{} words", quizblock_core::model::word_count(text))
            }
            None => "-".to_string(),
        };
        let mut result = match (item.correct, &item.correct_option) {
            (Some(true), _) => "correct".to_string(),
            (Some(false), Some(expected)) => format!("incorrect (expected {expected})"),
            (Some(false), None) => "incorrect".to_string(),
            (None, _) => "graded".to_string(),
        };
        if item.expired {
            result.push_str(", time expired");
        }
        table.add_row(vec![
            Cell::new(item.position + 1),
            Cell::new(&item.question_id),
            Cell::new(item.kind),
            Cell::new(answer),
            Cell::new(result),
        ]);
    }

    table
}
