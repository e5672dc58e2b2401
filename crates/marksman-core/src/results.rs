//! Grading result types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::traits::TokenUsage;

/// Outcome of one examiner run.
///
/// Produced by the examiner runner and owned by the orchestrator that
/// requested it; immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExaminerResult {
    /// Which examiner produced this result.
    pub examiner_id: String,
    /// Awarded score, already clamped to `0..=max_score`.
    pub score: f64,
    /// The examiner's maximum score, carried so aggregation stays a pure
    /// function of the result list.
    pub max_score: u32,
    /// Natural-language feedback.
    pub feedback: String,
    /// Specific strengths identified in the response.
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Whether the examiner produced a genuine assessment.
    pub succeeded: bool,
    /// Present iff `succeeded` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// Aggregate outcome of one grading request.
///
/// Created once, after all examiner runners join; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingResult {
    /// Unique result identifier.
    pub id: Uuid,
    /// When grading completed.
    pub created_at: DateTime<Utc>,
    /// Overall score on a 0-10 scale, one decimal place.
    pub overall_score: f64,
    /// Letter grade derived from the score.
    pub grade: String,
    /// One entry per configured examiner, in configuration order,
    /// regardless of individual success.
    pub examiner_results: Vec<ExaminerResult>,
    /// Synthesized summary. Empty if the second-stage call failed.
    pub summary: String,
    /// Up to three short improvement suggestions.
    pub improvements: Vec<String>,
    /// Token usage totalled across all completion calls.
    pub token_usage: TokenUsage,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl GradingResult {
    /// Save the result as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize result")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write result to {}", path.display()))?;
        Ok(())
    }

    /// Load a result from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read result from {}", path.display()))?;
        let result: GradingResult =
            serde_json::from_str(&content).context("failed to parse result JSON")?;
        Ok(result)
    }
}
