//! The `marksman examiners` command.

use std::path::PathBuf;

use anyhow::Result;

use marksman_core::examiners::{parse_examiner_set, ExaminerSet};
use marksman_core::model::QuestionType;

pub fn execute(question_type: String, examiners: Option<PathBuf>) -> Result<()> {
    use comfy_table::{Cell, Table};

    let set = match examiners {
        Some(path) => parse_examiner_set(&path)?,
        None => {
            let qt: QuestionType = question_type
                .parse()
                .map_err(|e: String| anyhow::anyhow!("{e}"))?;
            ExaminerSet::builtin(qt)
        }
    };

    println!("{} ({} examiners)", set.name, set.examiners.len());

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "AO", "Max score", "Colour"]);
    for e in &set.examiners {
        table.add_row(vec![
            Cell::new(&e.id),
            Cell::new(&e.name),
            Cell::new(e.objective.to_string()),
            Cell::new(e.max_score),
            Cell::new(&e.display_color),
        ]);
    }

    println!("{table}");
    Ok(())
}
