//! The `quizblock init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("quizblock.toml").exists() {
        println!("quizblock.toml already exists, skipping.");
    } else {
        std::fs::write("quizblock.toml", SAMPLE_CONFIG)?;
        println!("Created quizblock.toml");
    }

    std::fs::create_dir_all("banks")?;
    let example_path = std::path::Path::new("banks/example.toml");
    if example_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit quizblock.toml to pick a grader");
    println!("  2. Run: quizblock validate --bank banks/example.toml");
    println!("  3. Run: quizblock run --bank banks/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizblock configuration

# Grade used when the grader fails; leave unset to treat failure as an error.
# fallback_grade = 0.0
grading_timeout_secs = 30
max_retries = 2
retry_delay_ms = 500
min_discursive_words = 50
max_discursive_chars = 2000
output_dir = "./quizblock-results"
timer_enabled = true

# An operator scores the discursive answer against the rubric.
[grader]
type = "rubric-prompt"

# Or grade every discursive answer with a constant:
# [grader]
# type = "fixed"
# grade = 70.0
"#;

const EXAMPLE_BANK: &str = r#"[block]
id = "example"
title = "Example Block"
description = "A short block to get started"

[[questions]]
id = "q1"
kind = "multiple-choice"
title = "Operant conditioning"
prompt = "Who is most closely associated with operant conditioning?"
difficulty = 1
time_limit_secs = 60
tags = ["basics"]

[[questions.options]]
id = "a"
text = "Ivan Pavlov"

[[questions.options]]
id = "b"
text = "B. F. Skinner"
correct = true

[[questions.options]]
id = "c"
text = "Albert Bandura"

[[questions]]
id = "q2"
kind = "multiple-choice"
title = "Reinforcement"
prompt = "Removing an unpleasant stimulus to increase a behavior is called:"
difficulty = 2
time_limit_secs = 60
tags = ["basics"]

[[questions.options]]
id = "a"
text = "Negative reinforcement"
correct = true

[[questions.options]]
id = "b"
text = "Positive punishment"

[[questions.options]]
id = "c"
text = "Extinction"

[[questions]]
id = "q3"
kind = "discursive"
title = "Reflection"
prompt = "Describe an everyday habit that was shaped by reinforcement and explain how."
difficulty = 3
time_limit_secs = 300
tags = ["reflection"]
"#;
