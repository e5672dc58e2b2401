//! System prompt construction.
//!
//! Pure template resolution: each examiner's template is filled in with the
//! mark-scheme parameters for the request. Question-type validity is a
//! caller precondition, so there is no failure mode here.

use crate::model::{ExaminerConfig, QuestionType, Unit};

/// Resolve an examiner's prompt template against the request parameters.
pub fn build_system_prompt(
    examiner: &ExaminerConfig,
    unit: Unit,
    question_type: QuestionType,
    has_diagram: bool,
) -> String {
    let diagram_note = if has_diagram {
        ", taking the attached diagram into account"
    } else {
        ""
    };

    examiner
        .prompt_template
        .replace("{unit}", &unit.to_string())
        .replace("{question_type}", &question_type.to_string())
        .replace("{diagram_note}", diagram_note)
        .replace("{max_score}", &examiner.max_score.to_string())
}
