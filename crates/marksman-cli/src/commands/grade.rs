//! The `marksman grade` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use marksman_core::engine::GradingEngine;
use marksman_core::examiners::{parse_examiner_set, validate_examiner_set, ExaminerSet};
use marksman_core::limiter::{RateLimiter, Tier};
use marksman_core::model::{GradeRequest, QuestionType, Subject, Unit};
use marksman_core::progress::{ProgressEvent, ProgressSink};
use marksman_core::results::GradingResult;
use marksman_core::traits::LlmProvider;
use marksman_providers::config::load_config_from;
use marksman_providers::create_provider;

/// Console progress sink.
struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn publish(&self, event: &ProgressEvent) -> anyhow::Result<()> {
        match event {
            ProgressEvent::Started { total_examiners } => {
                eprintln!("  Dispatching {total_examiners} examiners...");
            }
            ProgressEvent::Progress {
                examiner_id,
                percent,
                succeeded,
            } => {
                let status = if *succeeded { "ok" } else { "degraded" };
                eprintln!("  [{percent:>3}%] {examiner_id} ({status})");
            }
            ProgressEvent::Completed {
                overall_score,
                grade,
            } => {
                eprintln!("  Done: {overall_score}/10 ({grade})");
            }
            ProgressEvent::Failed { code, message } => {
                eprintln!("  Failed [{code}]: {message}");
            }
        }
        Ok(())
    }
}

pub struct GradeArgs {
    pub question: Option<String>,
    pub question_file: Option<PathBuf>,
    pub essay: Option<String>,
    pub essay_file: Option<PathBuf>,
    pub subject: String,
    pub unit: Option<String>,
    pub question_type: String,
    pub diagram: bool,
    pub identity: String,
    pub tier: Option<String>,
    pub examiners: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub json: bool,
    pub config: Option<PathBuf>,
}

pub async fn execute(args: GradeArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;

    let question = read_input(args.question, args.question_file, "question")?;
    let essay_text = read_input(args.essay, args.essay_file, "essay")?;

    let subject: Subject = args
        .subject
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{e}"))?;
    let unit: Option<Unit> = args
        .unit
        .map(|u| u.parse().map_err(|e: String| anyhow::anyhow!("{e}")))
        .transpose()?;
    let question_type: QuestionType = args
        .question_type
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{e}"))?;
    let tier: Tier = match args.tier {
        Some(t) => t.parse().map_err(|e: String| anyhow::anyhow!("{e}"))?,
        None => config.default_tier,
    };

    let examiner_set = match &args.examiners {
        Some(path) => {
            let set = parse_examiner_set(path)?;
            for w in validate_examiner_set(&set) {
                let prefix = w
                    .examiner_id
                    .as_ref()
                    .map(|id| format!("[{id}] "))
                    .unwrap_or_default();
                eprintln!("Warning: {prefix}{}", w.message);
            }
            set
        }
        None => ExaminerSet::builtin(question_type),
    };

    let provider: Option<Arc<dyn LlmProvider>> = match config.providers.get(&config.default_provider)
    {
        Some(pconfig) => Some(Arc::from(create_provider(&config.default_provider, pconfig)?)),
        None => None,
    };

    let engine = GradingEngine::new(
        provider,
        Arc::new(RateLimiter::new()),
        Arc::new(ConsoleSink),
        config.engine_config(),
    );

    let request = GradeRequest {
        question,
        essay_text,
        subject,
        unit,
        question_type,
        has_diagram: args.diagram,
    };

    eprintln!(
        "marksman — grading a {} {} response with {} examiners",
        subject,
        question_type,
        examiner_set.examiners.len()
    );

    let result = match engine
        .grade(&args.identity, tier, &request, &examiner_set.examiners)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            anyhow::bail!("grading failed [{}]: {e}", e.code());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&examiner_set, &result);
    }

    let output_dir = args.output.unwrap_or(config.output_dir);
    std::fs::create_dir_all(&output_dir)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let path = output_dir.join(format!("grading-{timestamp}.json"));
    result.save_json(&path)?;
    eprintln!("Report saved to: {}", path.display());

    Ok(())
}

fn read_input(inline: Option<String>, file: Option<PathBuf>, what: &str) -> Result<String> {
    match (inline, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {what} from {}", path.display())),
        (None, None) => anyhow::bail!("provide --{what} or --{what}-file"),
    }
}

fn print_summary(set: &ExaminerSet, result: &GradingResult) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Examiner", "AO", "Score", "Status", "Feedback"]);

    for (examiner, res) in set.examiners.iter().zip(&result.examiner_results) {
        let status = if res.succeeded { "ok" } else { "degraded" };
        table.add_row(vec![
            Cell::new(&examiner.name),
            Cell::new(examiner.objective.to_string()),
            Cell::new(format!("{}/{}", res.score, res.max_score)),
            Cell::new(status),
            Cell::new(&res.feedback),
        ]);
    }

    eprintln!("\n{table}");
    println!("Overall: {}/10 (grade {})", result.overall_score, result.grade);
    if !result.summary.is_empty() {
        println!("\n{}", result.summary);
    }
    if !result.improvements.is_empty() {
        println!("\nImprovements:");
        for improvement in &result.improvements {
            println!("  - {improvement}");
        }
    }
}
