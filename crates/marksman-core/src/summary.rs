//! Second-stage summary synthesis.
//!
//! After aggregation, one additional completion call turns the per-examiner
//! score breakdown into a short natural-language summary and up to three
//! improvement suggestions. The full essay is never re-sent; the breakdown
//! bounds token usage. Failure here is soft: the result simply carries
//! empty fields.

use std::sync::Arc;

use serde::Deserialize;

use crate::model::ExaminerConfig;
use crate::results::ExaminerResult;
use crate::runner::RunnerOptions;
use crate::traits::{
    extract_first_json_object, truncate_chars, CompletionRequest, LlmProvider, TokenUsage,
};

/// Improvement suggestions are capped at this many entries.
const MAX_IMPROVEMENTS: usize = 3;
/// Characters of each examiner's feedback included in the breakdown.
const FEEDBACK_EXCERPT_CHARS: usize = 160;

const SUMMARY_SYSTEM_PROMPT: &str = "You are an experienced examiner writing \
    a short overall comment on a marked response, based on the per-criterion \
    breakdown provided. Respond with a JSON object: {\"summary\": \"<3-4 \
    sentences addressed to the student>\", \"improvements\": [\"<short, \
    actionable suggestion>\", ...]}. Give at most three improvements. Do not \
    include any other text.";

/// Output of the synthesis call. Empty on failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryOutput {
    pub summary: String,
    pub improvements: Vec<String>,
}

#[derive(Deserialize)]
struct RawSummaryOutput {
    summary: Option<String>,
    #[serde(default)]
    improvements: Option<Vec<String>>,
}

/// Synthesizes the overall summary from aggregated examiner results.
pub struct SummaryGenerator {
    provider: Arc<dyn LlmProvider>,
    options: RunnerOptions,
}

impl SummaryGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, options: RunnerOptions) -> Self {
        Self { provider, options }
    }

    /// Run the synthesis call. Never returns an error; total failure
    /// yields empty fields.
    pub async fn summarize(
        &self,
        examiners: &[ExaminerConfig],
        results: &[ExaminerResult],
        question_excerpt: &str,
    ) -> (SummaryOutput, TokenUsage) {
        let request = CompletionRequest {
            model: self.options.model.clone(),
            system_prompt: SUMMARY_SYSTEM_PROMPT.to_string(),
            user_prompt: build_breakdown(examiners, results, question_excerpt),
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };

        let response =
            match tokio::time::timeout(self.options.timeout, self.provider.complete(&request))
                .await
            {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "summary call failed");
                    return (SummaryOutput::default(), TokenUsage::default());
                }
                Err(_) => {
                    tracing::warn!(
                        "summary call timed out after {}s",
                        self.options.timeout.as_secs()
                    );
                    return (SummaryOutput::default(), TokenUsage::default());
                }
            };

        (parse_summary_output(&response.text), response.token_usage)
    }
}

/// Parse the synthesis response, degrading to empty output when the model
/// returned no usable JSON.
pub fn parse_summary_output(raw: &str) -> SummaryOutput {
    if let Some(json) = extract_first_json_object(raw) {
        if let Ok(parsed) = serde_json::from_str::<RawSummaryOutput>(json) {
            if let Some(summary) = parsed.summary {
                let mut improvements = parsed.improvements.unwrap_or_default();
                improvements.truncate(MAX_IMPROVEMENTS);
                return SummaryOutput {
                    summary,
                    improvements,
                };
            }
        }
    }
    tracing::warn!("summary output was not parseable JSON");
    SummaryOutput::default()
}

fn build_breakdown(
    examiners: &[ExaminerConfig],
    results: &[ExaminerResult],
    question_excerpt: &str,
) -> String {
    let mut prompt = format!("Question (excerpt): {question_excerpt}\n\nMarks awarded:\n");
    for (examiner, result) in examiners.iter().zip(results) {
        prompt.push_str(&format!(
            "- {} ({}): {}/{}",
            examiner.name, examiner.objective, result.score, result.max_score
        ));
        if result.succeeded && !result.feedback.is_empty() {
            prompt.push_str(&format!(
                " | {}",
                truncate_chars(&result.feedback, FEEDBACK_EXCERPT_CHARS)
            ));
        }
        prompt.push('\n');
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::examiners::ExaminerSet;
    use crate::model::QuestionType;
    use crate::traits::CompletionResponse;
    use async_trait::async_trait;

    struct FixedProvider {
        text: String,
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> anyhow::Result<CompletionResponse> {
            if self.fail {
                anyhow::bail!("backend down");
            }
            Ok(CompletionResponse {
                text: self.text.clone(),
                model: request.model.clone(),
                token_usage: TokenUsage {
                    prompt_tokens: 50,
                    completion_tokens: 30,
                    total_tokens: 80,
                },
                latency_ms: 1,
            })
        }
    }

    fn results() -> (Vec<ExaminerConfig>, Vec<ExaminerResult>) {
        let set = ExaminerSet::builtin(QuestionType::ShortAnswer);
        let results = set
            .examiners
            .iter()
            .map(|e| ExaminerResult {
                examiner_id: e.id.clone(),
                score: 3.0,
                max_score: e.max_score,
                feedback: "Accurate definitions.".into(),
                strengths: vec![],
                succeeded: true,
                failure_reason: None,
            })
            .collect();
        (set.examiners, results)
    }

    #[test]
    fn parse_valid_summary() {
        let raw = r#"{"summary": "A solid response.", "improvements": ["More data", "Sharper conclusion"]}"#;
        let output = parse_summary_output(raw);
        assert_eq!(output.summary, "A solid response.");
        assert_eq!(output.improvements.len(), 2);
    }

    #[test]
    fn parse_caps_improvements_at_three() {
        let raw = r#"{"summary": "ok", "improvements": ["a", "b", "c", "d", "e"]}"#;
        let output = parse_summary_output(raw);
        assert_eq!(output.improvements, vec!["a", "b", "c"]);
    }

    #[test]
    fn parse_garbage_yields_empty() {
        assert_eq!(parse_summary_output("no json at all"), SummaryOutput::default());
        assert_eq!(
            parse_summary_output(r#"{"improvements": ["x"]}"#),
            SummaryOutput::default()
        );
    }

    #[test]
    fn breakdown_lists_every_examiner_without_essay() {
        let (examiners, results) = results();
        let prompt = build_breakdown(&examiners, &results, "Define opportunity cost.");
        assert!(prompt.contains("Knowledge & Understanding (AO1): 3/4"));
        assert!(prompt.contains("Application (AO2): 3/4"));
        assert!(prompt.contains("Define opportunity cost."));
        assert!(prompt.contains("Accurate definitions."));
    }

    #[tokio::test]
    async fn summarize_success() {
        let (examiners, results) = results();
        let generator = SummaryGenerator::new(
            Arc::new(FixedProvider {
                text: r#"{"summary": "Well argued.", "improvements": ["Add a diagram"]}"#.into(),
                fail: false,
            }),
            RunnerOptions::default(),
        );
        let (output, usage) = generator.summarize(&examiners, &results, "Q").await;
        assert_eq!(output.summary, "Well argued.");
        assert_eq!(output.improvements, vec!["Add a diagram"]);
        assert_eq!(usage.total_tokens, 80);
    }

    #[tokio::test]
    async fn summarize_failure_is_soft() {
        let (examiners, results) = results();
        let generator = SummaryGenerator::new(
            Arc::new(FixedProvider {
                text: String::new(),
                fail: true,
            }),
            RunnerOptions::default(),
        );
        let (output, usage) = generator.summarize(&examiners, &results, "Q").await;
        assert_eq!(output, SummaryOutput::default());
        assert_eq!(usage.total_tokens, 0);
    }
}
