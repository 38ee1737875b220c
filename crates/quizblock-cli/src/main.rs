//! quizblock CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quizblock", version, about = "Timed quiz blocks with composite scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a block interactively
    Run {
        /// Path to a .toml question bank
        #[arg(long)]
        bank: PathBuf,

        /// Use this fixed discursive grade (0-100) instead of the configured grader
        #[arg(long)]
        grade: Option<f64>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory (defaults to the configured output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Disable per-question time limits
        #[arg(long)]
        no_timer: bool,

        /// Output format: json, markdown, all
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Validate question bank TOML files
    Validate {
        /// Path to bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Show a saved block report
    Show {
        /// Report JSON
        #[arg(long)]
        report: PathBuf,

        /// Output format: text, markdown, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create starter config and example bank
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("quizblock=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            bank,
            grade,
            config,
            output,
            no_timer,
            format,
        } => commands::run::execute(bank, grade, config, output, no_timer, format).await,
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Show { report, format } => commands::show::execute(report, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
