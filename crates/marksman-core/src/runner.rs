//! Single-examiner execution.
//!
//! One runner call issues one completion request and always resolves to an
//! `ExaminerResult`: timeouts, transport errors, and unparseable model
//! output all degrade to a placeholder result instead of propagating. A
//! single bad examiner must not fail the whole grading pass.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ProviderError;
use crate::model::ExaminerConfig;
use crate::results::ExaminerResult;
use crate::traits::{
    extract_first_json_object, truncate_chars, CompletionRequest, LlmProvider, TokenUsage,
};

/// Characters of raw model output kept as fallback feedback.
const FALLBACK_FEEDBACK_CHARS: usize = 280;

/// Options shared by every examiner call in one grading request.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Model identifier passed to the backend.
    pub model: String,
    /// Sampling temperature. Kept low so repeated marking is stable.
    pub temperature: f64,
    /// Token budget per examiner call.
    pub max_tokens: u32,
    /// Per-call timeout. Each examiner times out independently.
    pub timeout: Duration,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.2,
            max_tokens: 1024,
            timeout: Duration::from_secs(45),
        }
    }
}

/// What the model's response parsed into.
///
/// Modelling this as a variant keeps result construction a total function
/// instead of nested error handling.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedExaminerOutput {
    /// The response contained a JSON object with a numeric score.
    Structured {
        score: f64,
        feedback: String,
        strengths: Vec<String>,
    },
    /// No usable JSON; the raw text prefix stands in as feedback.
    Fallback { raw_prefix: String },
}

#[derive(Deserialize)]
struct RawExaminerOutput {
    score: Option<f64>,
    #[serde(default)]
    feedback: Option<String>,
    #[serde(default)]
    strengths: Option<Vec<String>>,
}

/// Parse raw model output into the structured-or-fallback variant.
///
/// Upstream output is not guaranteed to be well-formed JSON, so anything
/// without a balanced object carrying a numeric `score` falls back.
pub fn parse_examiner_output(raw: &str) -> ParsedExaminerOutput {
    if let Some(json) = extract_first_json_object(raw) {
        if let Ok(parsed) = serde_json::from_str::<RawExaminerOutput>(json) {
            if let Some(score) = parsed.score {
                return ParsedExaminerOutput::Structured {
                    score,
                    feedback: parsed.feedback.unwrap_or_default(),
                    strengths: parsed.strengths.unwrap_or_default(),
                };
            }
        }
    }
    ParsedExaminerOutput::Fallback {
        raw_prefix: truncate_chars(raw, FALLBACK_FEEDBACK_CHARS).to_string(),
    }
}

/// Default score awarded when an examiner cannot produce a real one:
/// half the maximum, rounded down.
pub fn fallback_score(max_score: u32) -> f64 {
    (max_score / 2) as f64
}

/// Runs one examiner against the language-model backend.
pub struct ExaminerRunner {
    provider: Arc<dyn LlmProvider>,
    options: RunnerOptions,
}

impl ExaminerRunner {
    pub fn new(provider: Arc<dyn LlmProvider>, options: RunnerOptions) -> Self {
        Self { provider, options }
    }

    /// Run one examiner. Never returns an error: every failure path
    /// resolves to a `succeeded = false` result with the default score.
    pub async fn run(
        &self,
        examiner: &ExaminerConfig,
        system_prompt: &str,
        question: &str,
        essay: &str,
        has_diagram: bool,
    ) -> (ExaminerResult, TokenUsage) {
        let request = CompletionRequest {
            model: self.options.model.clone(),
            system_prompt: system_prompt.to_string(),
            user_prompt: build_user_prompt(question, essay, has_diagram),
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };

        let response =
            match tokio::time::timeout(self.options.timeout, self.provider.complete(&request))
                .await
            {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    // Permanent backend errors (bad key, unknown model) point at
                    // deployment configuration rather than a flaky call.
                    let permanent = e
                        .downcast_ref::<ProviderError>()
                        .is_some_and(|pe| pe.is_permanent());
                    if permanent {
                        tracing::error!(examiner = %examiner.id, error = %e, "examiner call failed");
                    } else {
                        tracing::warn!(examiner = %examiner.id, error = %e, "examiner call failed");
                    }
                    return (self.failure_result(examiner, e.to_string()), TokenUsage::default());
                }
                Err(_) => {
                    let secs = self.options.timeout.as_secs();
                    tracing::warn!(examiner = %examiner.id, "examiner call timed out after {secs}s");
                    return (
                        self.failure_result(examiner, format!("timed out after {secs}s")),
                        TokenUsage::default(),
                    );
                }
            };

        let usage = response.token_usage;
        let result = match parse_examiner_output(&response.text) {
            ParsedExaminerOutput::Structured {
                score,
                feedback,
                strengths,
            } => ExaminerResult {
                examiner_id: examiner.id.clone(),
                score: score.clamp(0.0, examiner.max_score as f64),
                max_score: examiner.max_score,
                feedback,
                strengths,
                succeeded: true,
                failure_reason: None,
            },
            ParsedExaminerOutput::Fallback { raw_prefix } => {
                tracing::warn!(examiner = %examiner.id, "examiner output was not parseable JSON");
                ExaminerResult {
                    examiner_id: examiner.id.clone(),
                    score: fallback_score(examiner.max_score),
                    max_score: examiner.max_score,
                    feedback: raw_prefix,
                    strengths: vec!["Assessment attempted".to_string()],
                    succeeded: false,
                    failure_reason: Some("unparseable model output".to_string()),
                }
            }
        };

        (result, usage)
    }

    fn failure_result(&self, examiner: &ExaminerConfig, reason: String) -> ExaminerResult {
        ExaminerResult {
            examiner_id: examiner.id.clone(),
            score: fallback_score(examiner.max_score),
            max_score: examiner.max_score,
            feedback: "This examiner could not complete its assessment.".to_string(),
            strengths: vec![],
            succeeded: false,
            failure_reason: Some(reason),
        }
    }
}

fn build_user_prompt(question: &str, essay: &str, has_diagram: bool) -> String {
    let mut prompt = format!("Question:\n{question}\n\nStudent response:\n{essay}\n");
    if has_diagram {
        prompt.push_str("\n[The student included a diagram with this response.]\n");
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AssessmentObjective;
    use crate::traits::CompletionResponse;
    use async_trait::async_trait;

    fn examiner(max_score: u32) -> ExaminerConfig {
        ExaminerConfig {
            id: "analysis".into(),
            name: "Analysis".into(),
            objective: AssessmentObjective::AO3,
            max_score,
            prompt_template: "Mark out of {max_score}.".into(),
            display_color: "#f59e0b".into(),
        }
    }

    enum Behaviour {
        Respond(String),
        Fail(String),
        FailPermanent,
        Hang,
    }

    struct ScriptedProvider {
        behaviour: Behaviour,
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> anyhow::Result<CompletionResponse> {
            match &self.behaviour {
                Behaviour::Respond(text) => Ok(CompletionResponse {
                    text: text.clone(),
                    model: request.model.clone(),
                    token_usage: TokenUsage {
                        prompt_tokens: 100,
                        completion_tokens: 40,
                        total_tokens: 140,
                    },
                    latency_ms: 1,
                }),
                Behaviour::Fail(msg) => Err(anyhow::anyhow!("{msg}")),
                Behaviour::FailPermanent => {
                    Err(ProviderError::AuthenticationFailed("bad key".into()).into())
                }
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!()
                }
            }
        }
    }

    fn runner(behaviour: Behaviour) -> ExaminerRunner {
        ExaminerRunner::new(
            Arc::new(ScriptedProvider { behaviour }),
            RunnerOptions {
                model: "test-model".into(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn parse_structured_output() {
        let raw = r#"Sure! {"score": 7, "feedback": "Good chains of reasoning.", "strengths": ["a", "b"]} done."#;
        assert_eq!(
            parse_examiner_output(raw),
            ParsedExaminerOutput::Structured {
                score: 7.0,
                feedback: "Good chains of reasoning.".into(),
                strengths: vec!["a".into(), "b".into()],
            }
        );
    }

    #[test]
    fn parse_structured_with_missing_optionals() {
        let raw = r#"{"score": 4}"#;
        assert_eq!(
            parse_examiner_output(raw),
            ParsedExaminerOutput::Structured {
                score: 4.0,
                feedback: String::new(),
                strengths: vec![],
            }
        );
    }

    #[test]
    fn parse_json_without_score_falls_back() {
        let raw = r#"{"feedback": "no score given"}"#;
        assert!(matches!(
            parse_examiner_output(raw),
            ParsedExaminerOutput::Fallback { .. }
        ));
    }

    #[test]
    fn parse_plain_text_falls_back_with_prefix() {
        let raw = "The response demonstrates reasonable understanding but lacks depth.";
        match parse_examiner_output(raw) {
            ParsedExaminerOutput::Fallback { raw_prefix } => {
                assert_eq!(raw_prefix, raw);
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn parse_long_text_truncates_prefix() {
        let raw = "x".repeat(1000);
        match parse_examiner_output(&raw) {
            ParsedExaminerOutput::Fallback { raw_prefix } => {
                assert_eq!(raw_prefix.chars().count(), FALLBACK_FEEDBACK_CHARS);
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[test]
    fn fallback_score_is_half_rounded_down() {
        assert_eq!(fallback_score(4), 2.0);
        assert_eq!(fallback_score(7), 3.0);
        assert_eq!(fallback_score(1), 0.0);
        assert_eq!(fallback_score(0), 0.0);
    }

    #[tokio::test]
    async fn structured_response_round_trips() {
        let runner = runner(Behaviour::Respond(
            r#"{"score": 5, "feedback": "Clear analysis.", "strengths": ["diagrams", "logic"]}"#
                .into(),
        ));
        let (result, usage) = runner
            .run(&examiner(6), "system", "Q", "essay text", false)
            .await;

        assert!(result.succeeded);
        assert_eq!(result.score, 5.0);
        assert_eq!(result.max_score, 6);
        assert_eq!(result.feedback, "Clear analysis.");
        assert_eq!(result.strengths, vec!["diagrams", "logic"]);
        assert!(result.failure_reason.is_none());
        assert_eq!(usage.total_tokens, 140);
    }

    #[tokio::test]
    async fn out_of_range_score_is_clamped() {
        let runner = runner(Behaviour::Respond(r#"{"score": 99, "feedback": "x"}"#.into()));
        let (result, _) = runner.run(&examiner(6), "system", "Q", "essay", false).await;
        assert!(result.succeeded);
        assert_eq!(result.score, 6.0);

        let runner = runner_negative();
        let (result, _) = runner.run(&examiner(6), "system", "Q", "essay", false).await;
        assert_eq!(result.score, 0.0);
    }

    fn runner_negative() -> ExaminerRunner {
        runner(Behaviour::Respond(r#"{"score": -3}"#.into()))
    }

    #[tokio::test]
    async fn unparseable_response_degrades() {
        let runner = runner(Behaviour::Respond("I would award good marks overall.".into()));
        let (result, _) = runner.run(&examiner(4), "system", "Q", "essay", false).await;

        assert!(!result.succeeded);
        assert_eq!(result.score, 2.0);
        assert_eq!(result.feedback, "I would award good marks overall.");
        assert_eq!(result.failure_reason.as_deref(), Some("unparseable model output"));
    }

    #[tokio::test]
    async fn transport_error_degrades() {
        let runner = runner(Behaviour::Fail("connection refused".into()));
        let (result, usage) = runner.run(&examiner(4), "system", "Q", "essay", false).await;

        assert!(!result.succeeded);
        assert_eq!(result.score, 2.0);
        assert!(result
            .failure_reason
            .as_deref()
            .unwrap()
            .contains("connection refused"));
        assert_eq!(usage.total_tokens, 0);
    }

    #[tokio::test]
    async fn permanent_backend_error_still_degrades() {
        let runner = runner(Behaviour::FailPermanent);
        let (result, _) = runner.run(&examiner(6), "system", "Q", "essay", false).await;

        assert!(!result.succeeded);
        assert_eq!(result.score, 3.0);
        assert!(result
            .failure_reason
            .as_deref()
            .unwrap()
            .contains("authentication"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let runner = ExaminerRunner::new(
            Arc::new(ScriptedProvider {
                behaviour: Behaviour::Hang,
            }),
            RunnerOptions {
                model: "test-model".into(),
                timeout: Duration::from_millis(100),
                ..Default::default()
            },
        );
        let (result, _) = runner.run(&examiner(8), "system", "Q", "essay", false).await;

        assert!(!result.succeeded);
        assert_eq!(result.score, 4.0);
        assert!(result.failure_reason.as_deref().unwrap().contains("timed out"));
    }

    #[test]
    fn diagram_flag_reaches_user_prompt() {
        let prompt = build_user_prompt("Q", "essay", true);
        assert!(prompt.contains("diagram"));
        let prompt = build_user_prompt("Q", "essay", false);
        assert!(!prompt.contains("diagram"));
    }
}
