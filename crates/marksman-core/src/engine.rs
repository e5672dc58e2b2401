//! Central grading orchestrator.
//!
//! Coordinates one grading request: admission, validation, concurrent
//! examiner fan-out, fixed-order aggregation, second-stage summary, and
//! progress broadcasting.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use uuid::Uuid;

use crate::error::GradingError;
use crate::limiter::{RateLimiter, Tier};
use crate::model::{ExaminerConfig, GradeRequest};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::prompt::build_system_prompt;
use crate::results::{ExaminerResult, GradingResult};
use crate::runner::{ExaminerRunner, RunnerOptions};
use crate::scoring::{aggregate, GradeBands};
use crate::summary::SummaryGenerator;
use crate::traits::{truncate_chars, LlmProvider, TokenUsage};

/// Characters of the question forwarded to the summary call.
const QUESTION_EXCERPT_CHARS: usize = 200;

/// Configuration for the grading engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model identifier used for every completion call.
    pub model: String,
    /// Sampling temperature for examiner calls.
    pub temperature: f64,
    /// Token budget per examiner call.
    pub examiner_max_tokens: u32,
    /// Per-examiner call timeout. Examiners time out independently.
    pub examiner_timeout: Duration,
    /// Token budget for the summary call.
    pub summary_max_tokens: u32,
    /// Timeout for the summary call.
    pub summary_timeout: Duration,
    /// Grade thresholds.
    pub grade_bands: GradeBands,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            temperature: 0.2,
            examiner_max_tokens: 1024,
            examiner_timeout: Duration::from_secs(45),
            summary_max_tokens: 768,
            summary_timeout: Duration::from_secs(30),
            grade_bands: GradeBands::default(),
        }
    }
}

/// The central grading engine.
///
/// The provider is optional so a deployment without a configured backend
/// fails with a service-unavailable condition on the first request rather
/// than at startup.
pub struct GradingEngine {
    provider: Option<Arc<dyn LlmProvider>>,
    limiter: Arc<RateLimiter>,
    sink: Arc<dyn ProgressSink>,
    config: EngineConfig,
}

impl GradingEngine {
    pub fn new(
        provider: Option<Arc<dyn LlmProvider>>,
        limiter: Arc<RateLimiter>,
        sink: Arc<dyn ProgressSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            limiter,
            sink,
            config,
        }
    }

    /// Grade one request with the given examiner panel.
    ///
    /// Individual examiner failures and summary failures are absorbed into
    /// the result; the only fatal conditions are rate-limit denial, request
    /// validation, and an unconfigured backend.
    pub async fn grade(
        &self,
        identity: &str,
        tier: Tier,
        request: &GradeRequest,
        examiners: &[ExaminerConfig],
    ) -> Result<GradingResult, GradingError> {
        let start = Instant::now();

        let decision = self.limiter.check(identity, tier);
        if !decision.allowed {
            let err = GradingError::RateLimited {
                retry_after_secs: decision.retry_after_secs(Instant::now()),
            };
            self.emit(&failure_event(&err));
            return Err(err);
        }

        if let Err(err) = request.validate() {
            self.emit(&failure_event(&err));
            return Err(err);
        }

        let Some(provider) = self.provider.as_ref() else {
            let err = GradingError::NotConfigured("no language-model provider".to_string());
            self.emit(&failure_event(&err));
            return Err(err);
        };

        self.emit(&ProgressEvent::Started {
            total_examiners: examiners.len(),
        });

        let unit = request.resolved_unit();
        let prompts: Vec<String> = examiners
            .iter()
            .map(|e| build_system_prompt(e, unit, request.question_type, request.has_diagram))
            .collect();

        let runner = ExaminerRunner::new(
            Arc::clone(provider),
            RunnerOptions {
                model: self.config.model.clone(),
                temperature: self.config.temperature,
                max_tokens: self.config.examiner_max_tokens,
                timeout: self.config.examiner_timeout,
            },
        );

        // Fan out one task per examiner. Results are slotted back by index
        // so the final list keeps configuration order even though progress
        // events arrive in completion order.
        let mut futures = FuturesUnordered::new();
        for (idx, (examiner, system_prompt)) in examiners.iter().zip(&prompts).enumerate() {
            let runner = &runner;
            futures.push(async move {
                let outcome = runner
                    .run(
                        examiner,
                        system_prompt,
                        &request.question,
                        &request.essay_text,
                        request.has_diagram,
                    )
                    .await;
                (idx, outcome)
            });
        }

        let total = examiners.len();
        let mut slots: Vec<Option<ExaminerResult>> = vec![None; total];
        let mut token_usage = TokenUsage::default();
        let mut completed = 0usize;

        while let Some((idx, (result, usage))) = futures.next().await {
            completed += 1;
            token_usage.add(&usage);
            self.emit(&ProgressEvent::Progress {
                examiner_id: result.examiner_id.clone(),
                percent: percent_done(completed, total),
                succeeded: result.succeeded,
            });
            slots[idx] = Some(result);
        }

        // Every runner resolves, so every slot is filled.
        let examiner_results: Vec<ExaminerResult> = slots.into_iter().flatten().collect();

        let scored = aggregate(&examiner_results, &self.config.grade_bands);

        let generator = SummaryGenerator::new(
            Arc::clone(provider),
            RunnerOptions {
                model: self.config.model.clone(),
                temperature: self.config.temperature,
                max_tokens: self.config.summary_max_tokens,
                timeout: self.config.summary_timeout,
            },
        );
        let excerpt = truncate_chars(&request.question, QUESTION_EXCERPT_CHARS);
        let (summary, summary_usage) = generator
            .summarize(examiners, &examiner_results, excerpt)
            .await;
        token_usage.add(&summary_usage);

        let result = GradingResult {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            overall_score: scored.overall_score,
            grade: scored.grade,
            examiner_results,
            summary: summary.summary,
            improvements: summary.improvements,
            token_usage,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        self.emit(&ProgressEvent::Completed {
            overall_score: result.overall_score,
            grade: result.grade.clone(),
        });

        Ok(result)
    }

    /// Publish a progress event, swallowing sink failures.
    fn emit(&self, event: &ProgressEvent) {
        if let Err(e) = self.sink.publish(event) {
            tracing::warn!(error = %e, "progress publish failed");
        }
    }
}

fn failure_event(err: &GradingError) -> ProgressEvent {
    ProgressEvent::Failed {
        code: err.code().to_string(),
        message: err.to_string(),
    }
}

fn percent_done(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u8
}
