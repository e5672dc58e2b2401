//! The `marksman validate` command.

use std::path::PathBuf;

use anyhow::Result;

use marksman_core::examiners::{parse_examiner_set, validate_examiner_set};

pub fn execute(examiners_path: PathBuf) -> Result<()> {
    let set = parse_examiner_set(&examiners_path)?;

    println!("Examiner set: {} ({} examiners)", set.name, set.examiners.len());

    let warnings = validate_examiner_set(&set);
    for w in &warnings {
        let prefix = w
            .examiner_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Examiner set valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
