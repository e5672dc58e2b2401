//! Core data model types for marksman.
//!
//! These are the fundamental types that the entire marksman system uses
//! to represent grading requests and examiner definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GradingError;

/// Maximum question length in characters.
pub const MAX_QUESTION_CHARS: usize = 2000;
/// Maximum essay length in characters.
pub const MAX_ESSAY_CHARS: usize = 10_000;

/// Subjects the grading engine knows mark schemes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Economics,
    Geography,
}

impl Subject {
    /// The unit assumed when a request doesn't name one.
    pub fn default_unit(&self) -> Unit {
        match self {
            Subject::Economics => Unit::Micro,
            Subject::Geography => Unit::Physical,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Economics => write!(f, "economics"),
            Subject::Geography => write!(f, "geography"),
        }
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "economics" | "econ" => Ok(Subject::Economics),
            "geography" | "geo" => Ok(Subject::Geography),
            other => Err(format!("unknown subject: {other}")),
        }
    }
}

/// Syllabus units. Each subject uses its own pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Micro,
    Macro,
    Physical,
    Human,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Micro => write!(f, "micro"),
            Unit::Macro => write!(f, "macro"),
            Unit::Physical => write!(f, "physical"),
            Unit::Human => write!(f, "human"),
        }
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "micro" | "microeconomics" => Ok(Unit::Micro),
            "macro" | "macroeconomics" => Ok(Unit::Macro),
            "physical" => Ok(Unit::Physical),
            "human" => Ok(Unit::Human),
            other => Err(format!("unknown unit: {other}")),
        }
    }
}

/// Question formats. The type selects the mark scheme and examiner set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Essay,
    DataResponse,
    ShortAnswer,
}

impl Default for QuestionType {
    fn default() -> Self {
        QuestionType::Essay
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionType::Essay => write!(f, "essay"),
            QuestionType::DataResponse => write!(f, "data_response"),
            QuestionType::ShortAnswer => write!(f, "short_answer"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "essay" => Ok(QuestionType::Essay),
            "data_response" | "data-response" | "data" => Ok(QuestionType::DataResponse),
            "short_answer" | "short-answer" | "short" => Ok(QuestionType::ShortAnswer),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Assessment objective an examiner marks against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssessmentObjective {
    AO1,
    AO2,
    AO3,
    AO4,
}

impl fmt::Display for AssessmentObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessmentObjective::AO1 => write!(f, "AO1"),
            AssessmentObjective::AO2 => write!(f, "AO2"),
            AssessmentObjective::AO3 => write!(f, "AO3"),
            AssessmentObjective::AO4 => write!(f, "AO4"),
        }
    }
}

/// One grading attempt. Immutable once constructed; discarded when the
/// request completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeRequest {
    /// The exam question being answered.
    pub question: String,
    /// The student's response.
    pub essay_text: String,
    /// Subject the question belongs to.
    pub subject: Subject,
    /// Syllabus unit; defaults per subject when absent.
    #[serde(default)]
    pub unit: Option<Unit>,
    /// Question format; selects the examiner set.
    #[serde(default)]
    pub question_type: QuestionType,
    /// Whether the response references an attached diagram.
    #[serde(default)]
    pub has_diagram: bool,
}

impl GradeRequest {
    /// The unit to grade against, applying the subject default.
    pub fn resolved_unit(&self) -> Unit {
        self.unit.unwrap_or_else(|| self.subject.default_unit())
    }

    /// Check the length bounds before any grading work begins.
    pub fn validate(&self) -> Result<(), GradingError> {
        let question_len = self.question.chars().count();
        if question_len == 0 || question_len > MAX_QUESTION_CHARS {
            return Err(GradingError::InvalidRequest(format!(
                "question must be 1-{MAX_QUESTION_CHARS} characters, got {question_len}"
            )));
        }
        let essay_len = self.essay_text.chars().count();
        if essay_len == 0 || essay_len > MAX_ESSAY_CHARS {
            return Err(GradingError::InvalidRequest(format!(
                "essay must be 1-{MAX_ESSAY_CHARS} characters, got {essay_len}"
            )));
        }
        Ok(())
    }
}

/// Static definition of one examiner. Loaded once at startup and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExaminerConfig {
    /// Stable identifier (e.g. "knowledge").
    pub id: String,
    /// Human-readable name shown in reports.
    pub name: String,
    /// The assessment objective this examiner marks.
    pub objective: AssessmentObjective,
    /// Maximum score this examiner can award. Always positive.
    pub max_score: u32,
    /// System prompt template. Supports `{unit}`, `{question_type}`,
    /// `{diagram_note}` and `{max_score}` placeholders.
    pub prompt_template: String,
    /// Display colour used by front-ends.
    #[serde(default = "default_color")]
    pub display_color: String,
}

fn default_color() -> String {
    "#64748b".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GradeRequest {
        GradeRequest {
            question: "Evaluate the impact of a minimum price on the sugar market.".into(),
            essay_text: "A minimum price set above equilibrium raises price...".into(),
            subject: Subject::Economics,
            unit: None,
            question_type: QuestionType::Essay,
            has_diagram: false,
        }
    }

    #[test]
    fn subject_display_and_parse() {
        assert_eq!(Subject::Economics.to_string(), "economics");
        assert_eq!("geo".parse::<Subject>().unwrap(), Subject::Geography);
        assert_eq!("Economics".parse::<Subject>().unwrap(), Subject::Economics);
        assert!("history".parse::<Subject>().is_err());
    }

    #[test]
    fn question_type_parse_aliases() {
        assert_eq!(
            "data-response".parse::<QuestionType>().unwrap(),
            QuestionType::DataResponse
        );
        assert_eq!(
            "short".parse::<QuestionType>().unwrap(),
            QuestionType::ShortAnswer
        );
        assert!("mcq".parse::<QuestionType>().is_err());
    }

    #[test]
    fn unit_defaults_per_subject() {
        let mut req = request();
        assert_eq!(req.resolved_unit(), Unit::Micro);
        req.subject = Subject::Geography;
        assert_eq!(req.resolved_unit(), Unit::Physical);
        req.unit = Some(Unit::Human);
        assert_eq!(req.resolved_unit(), Unit::Human);
    }

    #[test]
    fn validate_accepts_in_bounds() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_question() {
        let mut req = request();
        req.question = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn validate_rejects_oversized_essay() {
        let mut req = request();
        req.essay_text = "x".repeat(MAX_ESSAY_CHARS + 1);
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("essay"));
    }

    #[test]
    fn grade_request_serde_roundtrip() {
        let req = request();
        let json = serde_json::to_string(&req).unwrap();
        let back: GradeRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.subject, Subject::Economics);
        assert_eq!(back.question_type, QuestionType::Essay);
        assert!(!back.has_diagram);
    }
}
