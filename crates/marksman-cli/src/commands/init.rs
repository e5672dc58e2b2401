//! The `marksman init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create marksman.toml
    if std::path::Path::new("marksman.toml").exists() {
        println!("marksman.toml already exists, skipping.");
    } else {
        std::fs::write("marksman.toml", SAMPLE_CONFIG)?;
        println!("Created marksman.toml");
    }

    // Create example examiner set
    std::fs::create_dir_all("examiner-sets")?;
    let example_path = std::path::Path::new("examiner-sets/example.toml");
    if example_path.exists() {
        println!("examiner-sets/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_EXAMINER_SET)?;
        println!("Created examiner-sets/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit marksman.toml with your API keys");
    println!("  2. Run: marksman validate --examiners examiner-sets/example.toml");
    println!("  3. Run: marksman grade --subject economics --question \"...\" --essay-file response.txt");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# marksman configuration

default_provider = "anthropic"
default_model = "claude-sonnet-4-20250514"
temperature = 0.2
examiner_timeout_secs = 45
default_tier = "free"

[providers.anthropic]
type = "anthropic"
api_key = "${ANTHROPIC_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"
"#;

const EXAMPLE_EXAMINER_SET: &str = r##"[examiner_set]
id = "example-essay"
name = "Example Essay Panel"

[[examiners]]
id = "knowledge"
name = "Knowledge & Understanding"
objective = "AO1"
max_score = 6
display_color = "#0ea5e9"
prompt_template = """
You are an experienced examiner marking a {question_type} question from the
{unit} unit. Assess ONLY knowledge and understanding: accuracy of
definitions, terminology, and subject content. Award a score out of
{max_score}. Respond with a JSON object:
{"score": <number>, "feedback": "<2-3 sentences>", "strengths": ["<specific strength>", ...]}.
Do not include any other text.
"""

[[examiners]]
id = "evaluation"
name = "Evaluation"
objective = "AO4"
max_score = 7
display_color = "#a855f7"
prompt_template = """
You are an experienced examiner marking a {question_type} question from the
{unit} unit. Assess ONLY evaluation: balanced judgement, counter-arguments,
and supported conclusions{diagram_note}. Award a score out of {max_score}.
Respond with a JSON object:
{"score": <number>, "feedback": "<2-3 sentences>", "strengths": ["<specific strength>", ...]}.
Do not include any other text.
"""
"##;
