//! marksman CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "marksman", version, about = "Multi-examiner LLM grading engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a response
    Grade {
        /// The exam question text
        #[arg(long, conflicts_with = "question_file")]
        question: Option<String>,

        /// Read the question from a file
        #[arg(long)]
        question_file: Option<PathBuf>,

        /// The student response text
        #[arg(long, conflicts_with = "essay_file")]
        essay: Option<String>,

        /// Read the student response from a file
        #[arg(long)]
        essay_file: Option<PathBuf>,

        /// Subject: economics or geography
        #[arg(long)]
        subject: String,

        /// Syllabus unit (defaults per subject)
        #[arg(long)]
        unit: Option<String>,

        /// Question type: essay, data_response, short_answer
        #[arg(long, default_value = "essay")]
        question_type: String,

        /// The response references a diagram
        #[arg(long)]
        diagram: bool,

        /// Identity used for rate limiting
        #[arg(long, default_value = "cli")]
        identity: String,

        /// Rate-limit tier: free, basic, premium
        #[arg(long)]
        tier: Option<String>,

        /// Custom examiner set TOML (default: built-in panel)
        #[arg(long)]
        examiners: Option<PathBuf>,

        /// Output directory for the JSON report
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the full result as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the examiner panel for a question type
    Examiners {
        /// Question type: essay, data_response, short_answer
        #[arg(long, default_value = "essay")]
        question_type: String,

        /// Custom examiner set TOML instead of the built-in panel
        #[arg(long)]
        examiners: Option<PathBuf>,
    },

    /// Validate an examiner set TOML file
    Validate {
        /// Path to the examiner set file
        #[arg(long)]
        examiners: PathBuf,
    },

    /// Create starter config and example examiner set
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("marksman=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            question,
            question_file,
            essay,
            essay_file,
            subject,
            unit,
            question_type,
            diagram,
            identity,
            tier,
            examiners,
            output,
            json,
            config,
        } => {
            commands::grade::execute(commands::grade::GradeArgs {
                question,
                question_file,
                essay,
                essay_file,
                subject,
                unit,
                question_type,
                diagram,
                identity,
                tier,
                examiners,
                output,
                json,
                config,
            })
            .await
        }
        Commands::Examiners {
            question_type,
            examiners,
        } => commands::examiners::execute(question_type, examiners),
        Commands::Validate { examiners } => commands::validate::execute(examiners),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
