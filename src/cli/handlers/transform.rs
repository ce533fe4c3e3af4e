//! CLI handler for style transformation.

use anyhow::Result;
use colored::Colorize;

use crate::cli::input::read_input;
use crate::cli::output::{output_json, print_header, print_table, OutputMode};
use crate::init::AppContext;
use crate::models::TargetTone;
use crate::services::DiffKind;

pub async fn handle_transform(
    ctx: &AppContext,
    input: &str,
    tone: TargetTone,
    mode: OutputMode,
) -> Result<()> {
    let text = read_input(input)?;
    let (transformed, diff) = ctx
        .pipeline
        .transform(&text, tone)
        .await
        .map_err(|e| anyhow::anyhow!("Style transformation failed: {}", e))?;

    if mode == OutputMode::Json {
        output_json(&serde_json::json!({
            "transformation": transformed,
            "diff": diff,
        }));
        return Ok(());
    }

    print_header(&format!(
        "Transformed toward {} ({} changes)",
        transformed.target_tone, transformed.num_changes
    ));
    println!("{}", transformed.transformed_text);

    print_header("Changes");
    let rows = diff
        .iter()
        .map(|d| {
            let kind = match d.kind {
                DiffKind::Insert => "insert".green().to_string(),
                DiffKind::Delete => "delete".red().to_string(),
                DiffKind::Replace => "replace".yellow().to_string(),
                DiffKind::Equal => "equal".to_string(),
            };
            vec![kind, d.original.clone(), d.replacement.clone()]
        })
        .collect();
    print_table(&["Kind", "Original", "Replacement"], rows);

    Ok(())
}
