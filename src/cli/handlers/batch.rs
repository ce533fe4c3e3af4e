//! Batch analysis handler: several files, analyzed concurrently.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::input::read_file;
use crate::cli::output::{output_json, print_error, print_success, print_table, OutputMode};
use crate::init::AppContext;
use crate::pipeline::{AnalysisOptions, StageResult};
use crate::services::TracingProgressReporter;

pub async fn handle_batch(
    ctx: &AppContext,
    files: &[PathBuf],
    options: AnalysisOptions,
    output: Option<&Path>,
    mode: OutputMode,
) -> Result<()> {
    let texts = files
        .iter()
        .map(|path| read_file(path))
        .collect::<Result<Vec<_>>>()?;

    let batch = ctx
        .pipeline
        .process_batch(&texts, options, Arc::new(TracingProgressReporter))
        .await;

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&batch).context("Failed to serialize batch report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write batch report to '{}'", path.display()))?;
    }

    if mode == OutputMode::Json {
        output_json(&batch);
        return Ok(());
    }

    let rows = batch
        .results
        .iter()
        .map(|item| {
            let file = files
                .get(item.index)
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            match (&item.report, &item.error) {
                (Some(report), _) => {
                    let (score, assessment) = match &report.summary {
                        Some(StageResult::Ok(s)) => {
                            (s.quality_score.to_string(), s.assessment.to_string())
                        }
                        _ => ("-".to_string(), "-".to_string()),
                    };
                    let suggestions = match &report.suggestions {
                        Some(StageResult::Ok(s)) => s.len().to_string(),
                        _ => "-".to_string(),
                    };
                    vec![file, score, assessment, suggestions, report.failures().len().to_string()]
                }
                (None, _) => vec![
                    file,
                    "-".to_string(),
                    "rejected".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                ],
            }
        })
        .collect();
    print_table(
        &["File", "Score", "Assessment", "Suggestions", "Failed stages"],
        rows,
    );
    for item in batch.results.iter().filter(|item| item.report.is_none()) {
        if let (Some(path), Some(error)) = (files.get(item.index), &item.error) {
            print_error(&format!("{}: {}", path.display(), error));
        }
    }
    print_success(&format!(
        "{} analyzed, {} rejected",
        batch.successes, batch.errors
    ));
    if let Some(path) = output {
        print_success(&format!("Batch report written to {}", path.display()));
    }

    Ok(())
}
