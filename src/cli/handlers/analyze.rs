//! CLI handlers for full and quick analysis.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::cli::input::read_input;
use crate::cli::output::{
    output_json, print_header, print_hint, print_kv, print_stage_error, print_success,
    print_table, severity_label, OutputMode,
};
use crate::init::AppContext;
use crate::pipeline::{AnalysisOptions, AnalysisReport, StageResult};

pub async fn handle_analyze(
    ctx: &AppContext,
    input: &str,
    options: AnalysisOptions,
    output: Option<&Path>,
    mode: OutputMode,
) -> Result<()> {
    let text = read_input(input)?;
    let report = ctx
        .pipeline
        .process(&text, options)
        .await
        .map_err(|e| anyhow::anyhow!("Analysis failed: {}", e))?;

    if let Some(path) = output {
        report
            .export(path)
            .map_err(|e| anyhow::anyhow!("Failed to write report to '{}': {}", path.display(), e))?;
    }

    if mode == OutputMode::Json {
        output_json(&report);
    } else {
        print_report(&report);
        if let Some(path) = output {
            print_success(&format!("Report written to {}", path.display()));
        }
    }

    Ok(())
}

pub async fn handle_quick(ctx: &AppContext, input: &str, mode: OutputMode) -> Result<()> {
    let text = read_input(input)?;
    let summary = ctx
        .pipeline
        .quick_analysis(&text)
        .await
        .map_err(|e| anyhow::anyhow!("Quick analysis failed: {}", e))?;

    if mode == OutputMode::Json {
        output_json(&serde_json::json!({ "summary": summary }));
    } else {
        println!("{}", summary);
    }
    Ok(())
}

fn print_report(report: &AnalysisReport) {
    if let Some(StageResult::Ok(summary)) = &report.summary {
        print_header(&format!(
            "Quality score: {}/100 ({})",
            summary.quality_score, summary.assessment
        ));
        print_kv(
            "Breakdown",
            &format!(
                "{} high, {} medium, {} low",
                summary.severity_breakdown.high,
                summary.severity_breakdown.medium,
                summary.severity_breakdown.low
            ),
        );
        print_kv("Strengths", &summary.key_strengths.join("; "));
        print_kv("Weaknesses", &summary.key_weaknesses.join("; "));
    }

    if let Some(StageResult::Ok(narrative)) = &report.narrative {
        print_kv(
            "Graph",
            &format!(
                "{} entities, {} relations, {} contradictions",
                narrative.stats.num_entities,
                narrative.stats.num_relationships,
                narrative.contradictions.len()
            ),
        );
    }
    if let Some(StageResult::Ok(drift)) = &report.thematic_drift {
        print_kv(
            "Drift",
            &format!(
                "{} point(s) across {} paragraphs, average similarity {:.3}",
                drift.drift_points.len(),
                drift.num_paragraphs,
                drift.average_similarity
            ),
        );
    }
    if let Some(StageResult::Ok(coherence)) = &report.coherence {
        print_kv(
            "Coherence",
            &format!("{:.3} ({})", coherence.coherence_score, coherence.coherence_level),
        );
    }
    if let Some(StageResult::Ok(tone)) = &report.tone {
        print_kv(
            "Tone",
            &format!(
                "{} (formality {:.2}, confidence {:.2})",
                tone.tone, tone.formality_score, tone.confidence
            ),
        );
    }
    if let Some(StageResult::Ok(structure)) = &report.structure {
        print_kv(
            "Sentences",
            &format!(
                "{} (avg {:.1} tokens, {} passive)",
                structure.num_sentences, structure.avg_sentence_length, structure.passive_voice_count
            ),
        );
    }
    if let Some(StageResult::Ok(transformed)) = &report.style_transformation {
        print_header(&format!("Transformed ({})", transformed.target_tone));
        println!("{}", transformed.transformed_text);
    }

    let failures = report.failures();
    if !failures.is_empty() {
        print_header("Failed stages");
        for (stage, error) in failures {
            print_stage_error(stage, error);
        }
    }

    if let Some(StageResult::Ok(suggestions)) = &report.suggestions {
        print_header("Suggestions");
        let rows = suggestions
            .iter()
            .enumerate()
            .map(|(i, s)| {
                vec![
                    format!("{}", i + 1),
                    severity_label(s.severity()).to_string(),
                    s.kind().to_string(),
                    s.message().to_string(),
                ]
            })
            .collect();
        print_table(&["#", "Severity", "Type", "Suggestion"], rows);
    }

    print_hint(&format!(
        "request {} | {:.3}s",
        report.request_id.to_string().dimmed(),
        report.processing_time
    ));
}
