//! Quick grade example — minimal programmatic usage of marksman.
//!
//! This example demonstrates how to use marksman as a library to grade a
//! response programmatically.
//!
//! ```bash
//! # Set your API key first:
//! export MARKSMAN_ANTHROPIC_KEY="your-key-here"
//!
//! # Run the example:
//! cargo run --example quick_grade
//! ```

use std::sync::Arc;

use marksman_core::engine::GradingEngine;
use marksman_core::examiners::ExaminerSet;
use marksman_core::limiter::RateLimiter;
use marksman_core::model::{GradeRequest, QuestionType, Subject};
use marksman_core::progress::NoopSink;
use marksman_providers::config::load_config;
use marksman_providers::create_provider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load backend config from marksman.toml
    let config = load_config()?;

    // Create the default backend
    let provider = config
        .providers
        .get(&config.default_provider)
        .map(|pconfig| create_provider(&config.default_provider, pconfig))
        .transpose()?
        .map(Arc::from);

    // The built-in essay panel: four examiners, one per assessment objective
    let panel = ExaminerSet::builtin(QuestionType::Essay);

    let engine = GradingEngine::new(
        provider,
        Arc::new(RateLimiter::new()),
        Arc::new(NoopSink),
        config.engine_config(),
    );

    let request = GradeRequest {
        question: "Evaluate the case for a national minimum wage increase.".to_string(),
        essay_text: "A minimum wage increase raises incomes for low-paid workers, \
                     but may reduce employment where labour demand is elastic..."
            .to_string(),
        subject: Subject::Economics,
        unit: None,
        question_type: QuestionType::Essay,
        has_diagram: false,
    };

    let result = engine
        .grade("example-user", config.default_tier, &request, &panel.examiners)
        .await?;

    println!("Overall: {}/10 (grade {})", result.overall_score, result.grade);
    for examiner_result in &result.examiner_results {
        println!(
            "  {}: {}/{}",
            examiner_result.examiner_id, examiner_result.score, examiner_result.max_score
        );
    }
    if !result.summary.is_empty() {
        println!("\n{}", result.summary);
    }

    Ok(())
}
