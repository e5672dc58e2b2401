//! Examiner set definitions: built-in panels and the TOML loader.
//!
//! Each question type maps to a fixed panel of examiners, one per
//! assessment objective. Deployments can override the built-ins with a
//! TOML file, validated on load.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{AssessmentObjective, ExaminerConfig, QuestionType};

/// A named panel of examiners applied to one grading request.
#[derive(Debug, Clone)]
pub struct ExaminerSet {
    pub id: String,
    pub name: String,
    pub examiners: Vec<ExaminerConfig>,
}

impl ExaminerSet {
    /// The built-in panel for a question type.
    pub fn builtin(question_type: QuestionType) -> Self {
        match question_type {
            QuestionType::Essay => Self {
                id: "essay".into(),
                name: "Essay panel".into(),
                examiners: vec![
                    examiner(
                        "knowledge",
                        "Knowledge & Understanding",
                        AssessmentObjective::AO1,
                        6,
                        "#0ea5e9",
                    ),
                    examiner(
                        "application",
                        "Application",
                        AssessmentObjective::AO2,
                        6,
                        "#22c55e",
                    ),
                    examiner(
                        "analysis",
                        "Analysis",
                        AssessmentObjective::AO3,
                        6,
                        "#f59e0b",
                    ),
                    examiner(
                        "evaluation",
                        "Evaluation",
                        AssessmentObjective::AO4,
                        7,
                        "#a855f7",
                    ),
                ],
            },
            QuestionType::DataResponse => Self {
                id: "data_response".into(),
                name: "Data response panel".into(),
                examiners: vec![
                    examiner(
                        "knowledge",
                        "Knowledge & Understanding",
                        AssessmentObjective::AO1,
                        3,
                        "#0ea5e9",
                    ),
                    examiner(
                        "application",
                        "Application of Data",
                        AssessmentObjective::AO2,
                        3,
                        "#22c55e",
                    ),
                    examiner(
                        "analysis",
                        "Analysis",
                        AssessmentObjective::AO3,
                        2,
                        "#f59e0b",
                    ),
                    examiner(
                        "evaluation",
                        "Evaluation",
                        AssessmentObjective::AO4,
                        2,
                        "#a855f7",
                    ),
                ],
            },
            QuestionType::ShortAnswer => Self {
                id: "short_answer".into(),
                name: "Short answer panel".into(),
                examiners: vec![
                    examiner(
                        "knowledge",
                        "Knowledge & Understanding",
                        AssessmentObjective::AO1,
                        4,
                        "#0ea5e9",
                    ),
                    examiner(
                        "application",
                        "Application",
                        AssessmentObjective::AO2,
                        4,
                        "#22c55e",
                    ),
                ],
            },
        }
    }
}

fn examiner(
    id: &str,
    name: &str,
    objective: AssessmentObjective,
    max_score: u32,
    color: &str,
) -> ExaminerConfig {
    ExaminerConfig {
        id: id.into(),
        name: name.into(),
        objective,
        max_score,
        prompt_template: builtin_template(objective),
        display_color: color.into(),
    }
}

fn builtin_template(objective: AssessmentObjective) -> String {
    let focus = match objective {
        AssessmentObjective::AO1 => {
            "knowledge and understanding: accuracy of definitions, terminology, \
             and subject content"
        }
        AssessmentObjective::AO2 => {
            "application: how well the response applies concepts to the specific \
             context of the question{diagram_note}"
        }
        AssessmentObjective::AO3 => {
            "analysis: chains of reasoning, use of evidence, and logical \
             development of arguments"
        }
        AssessmentObjective::AO4 => {
            "evaluation: balanced judgement, counter-arguments, and supported \
             conclusions"
        }
    };
    format!(
        "You are an experienced examiner marking a {{question_type}} question \
         from the {{unit}} unit. Assess ONLY {focus}. Award a score out of \
         {{max_score}}. Respond with a JSON object: \
         {{\"score\": <number>, \"feedback\": \"<2-3 sentences>\", \
         \"strengths\": [\"<specific strength>\", ...]}}. \
         Do not include any other text."
    )
}

// ---------------------------------------------------------------------------
// TOML loading
// ---------------------------------------------------------------------------

/// Intermediate TOML structure for parsing examiner set files.
#[derive(Debug, Deserialize)]
struct TomlExaminerFile {
    examiner_set: TomlExaminerSetHeader,
    #[serde(default)]
    examiners: Vec<TomlExaminer>,
}

#[derive(Debug, Deserialize)]
struct TomlExaminerSetHeader {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TomlExaminer {
    id: String,
    name: String,
    objective: AssessmentObjective,
    max_score: u32,
    prompt_template: String,
    #[serde(default)]
    display_color: Option<String>,
}

/// Parse a single TOML file into an `ExaminerSet`.
pub fn parse_examiner_set(path: &Path) -> Result<ExaminerSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read examiner set file: {}", path.display()))?;

    parse_examiner_set_str(&content, path)
}

/// Parse a TOML string into an `ExaminerSet` (useful for testing).
pub fn parse_examiner_set_str(content: &str, source_path: &Path) -> Result<ExaminerSet> {
    let parsed: TomlExaminerFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let examiners = parsed
        .examiners
        .into_iter()
        .map(|e| ExaminerConfig {
            id: e.id,
            name: e.name,
            objective: e.objective,
            max_score: e.max_score,
            prompt_template: e.prompt_template,
            display_color: e.display_color.unwrap_or_else(|| "#64748b".to_string()),
        })
        .collect();

    Ok(ExaminerSet {
        id: parsed.examiner_set.id,
        name: parsed.examiner_set.name,
        examiners,
    })
}

/// A warning from examiner set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The examiner ID (if applicable).
    pub examiner_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate an examiner set for common issues.
pub fn validate_examiner_set(set: &ExaminerSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if set.examiners.is_empty() {
        warnings.push(ValidationWarning {
            examiner_id: None,
            message: "examiner set has no examiners".into(),
        });
    }

    let mut seen_ids = std::collections::HashSet::new();
    for e in &set.examiners {
        if !seen_ids.insert(&e.id) {
            warnings.push(ValidationWarning {
                examiner_id: Some(e.id.clone()),
                message: format!("duplicate examiner ID: {}", e.id),
            });
        }
    }

    for e in &set.examiners {
        if e.max_score == 0 {
            warnings.push(ValidationWarning {
                examiner_id: Some(e.id.clone()),
                message: "max_score must be positive".into(),
            });
        }
    }

    for e in &set.examiners {
        if e.prompt_template.trim().is_empty() {
            warnings.push(ValidationWarning {
                examiner_id: Some(e.id.clone()),
                message: "prompt_template is empty".into(),
            });
        } else if !e.prompt_template.contains("{max_score}") {
            warnings.push(ValidationWarning {
                examiner_id: Some(e.id.clone()),
                message: "prompt_template does not mention {max_score}; the model \
                          will not know the marking scale"
                    .into(),
            });
        }
    }

    warnings
}
