//! Score aggregation and grade derivation.

use serde::{Deserialize, Serialize};

use crate::results::ExaminerResult;

/// Grade thresholds as data: `(minimum fraction, label)` rows checked in
/// descending order. Cut points are deployment configuration, not logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeBands {
    bands: Vec<GradeBand>,
    /// Label awarded when no band matches.
    floor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeBand {
    pub min_fraction: f64,
    pub label: String,
}

impl Default for GradeBands {
    fn default() -> Self {
        Self {
            bands: [
                (0.90, "A*"),
                (0.80, "A"),
                (0.70, "B"),
                (0.60, "C"),
                (0.50, "D"),
                (0.40, "E"),
            ]
            .into_iter()
            .map(|(min_fraction, label)| GradeBand {
                min_fraction,
                label: label.to_string(),
            })
            .collect(),
            floor: "U".to_string(),
        }
    }
}

impl GradeBands {
    /// Look up the grade for a score fraction in `[0, 1]`.
    pub fn grade_for(&self, fraction: f64) -> &str {
        self.bands
            .iter()
            .find(|b| fraction >= b.min_fraction)
            .map(|b| b.label.as_str())
            .unwrap_or(self.floor.as_str())
    }
}

/// Aggregate outcome of the scoring pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    /// Overall score on a 0-10 scale, rounded to one decimal place.
    pub overall_score: f64,
    /// Letter grade from the band table.
    pub grade: String,
}

/// Compute the overall score and grade from the complete result list.
///
/// Failed examiners' placeholder scores are included in both numerator and
/// denominator exactly like any other result: excluding them would bias the
/// aggregate upward in the failure case, which is the wrong direction for
/// an assessment tool.
pub fn aggregate(results: &[ExaminerResult], bands: &GradeBands) -> Aggregate {
    let total_max: u32 = results.iter().map(|r| r.max_score).sum();
    if total_max == 0 {
        return Aggregate {
            overall_score: 0.0,
            grade: bands.grade_for(0.0).to_string(),
        };
    }

    let total_score: f64 = results.iter().map(|r| r.score).sum();
    let fraction = total_score / total_max as f64;
    let overall_score = (fraction * 100.0).round() / 10.0;

    Aggregate {
        overall_score,
        grade: bands.grade_for(fraction).to_string(),
    }
}
