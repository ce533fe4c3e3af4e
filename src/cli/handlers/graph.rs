//! CLI handlers for the knowledge graph and paragraph similarity.

use anyhow::Result;
use uuid::Uuid;

use crate::cli::input::read_input;
use crate::cli::output::{output_json, print_header, print_table, severity_label, OutputMode};
use crate::init::AppContext;

pub async fn handle_graph(ctx: &AppContext, input: &str, mode: OutputMode) -> Result<()> {
    let text = read_input(input)?;
    let narrative = ctx
        .pipeline
        .narrative(&text)
        .await
        .map_err(|e| anyhow::anyhow!("Graph extraction failed: {}", e))?;

    if mode == OutputMode::Json {
        output_json(&narrative);
        return Ok(());
    }

    print_header(&format!(
        "Entities ({}, {} mentions)",
        narrative.stats.num_entities, narrative.stats.num_mentions
    ));
    let rows = narrative
        .graph
        .nodes
        .iter()
        .map(|n| vec![n.id.to_string(), n.label.clone(), n.text.clone()])
        .collect();
    print_table(&["ID", "Label", "Text"], rows);

    print_header(&format!("Relations ({})", narrative.stats.num_relationships));
    let rows = narrative
        .graph
        .edges
        .iter()
        .map(|e| {
            vec![
                e.source.to_string(),
                e.predicate.clone(),
                e.target.to_string(),
                e.sentence.clone(),
            ]
        })
        .collect();
    print_table(&["Subject", "Predicate", "Object", "Sentence"], rows);

    if !narrative.contradictions.is_empty() {
        print_header(&format!("Contradictions ({})", narrative.contradictions.len()));
        let rows = narrative
            .contradictions
            .iter()
            .map(|c| {
                vec![
                    severity_label(c.severity).to_string(),
                    c.entity.to_string(),
                    c.predicate.clone(),
                    c.objects
                        .iter()
                        .map(|o| o.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                ]
            })
            .collect();
        print_table(&["Severity", "Entity", "Predicate", "Objects"], rows);
    }

    Ok(())
}

pub async fn handle_similar(
    ctx: &AppContext,
    input: &str,
    queries: &[String],
    top_k: usize,
    mode: OutputMode,
) -> Result<()> {
    let text = read_input(input)?;

    if queries.is_empty() {
        let pairs = ctx
            .pipeline
            .similar_paragraphs(&text, top_k)
            .await
            .map_err(|e| anyhow::anyhow!("Similarity analysis failed: {}", e))?;
        if mode == OutputMode::Json {
            output_json(&pairs);
        } else {
            let rows = pairs
                .iter()
                .map(|p| {
                    vec![
                        format!("{} / {}", p.paragraph_1_index, p.paragraph_2_index),
                        format!("{:.3}", p.similarity),
                        p.paragraph_1.clone(),
                        p.paragraph_2.clone(),
                    ]
                })
                .collect();
            print_table(&["Pair", "Similarity", "First", "Second"], rows);
        }
        return Ok(());
    }

    // One scope for every query, so the paragraphs are embedded once
    let scope = Uuid::new_v4();
    let mut results = Vec::with_capacity(queries.len());
    for query in queries {
        let hits = ctx
            .pipeline
            .search_in(scope, &text, query, top_k)
            .await
            .map_err(|e| anyhow::anyhow!("Similarity search failed: {}", e))?;
        results.push(serde_json::json!({ "query": query, "hits": hits }));

        if mode == OutputMode::Human {
            print_header(&format!("Query: {}", query));
            let rows = hits
                .iter()
                .map(|h| {
                    vec![
                        h.rank.to_string(),
                        h.paragraph_index.to_string(),
                        format!("{:.3}", h.similarity),
                        h.paragraph.clone(),
                    ]
                })
                .collect();
            print_table(&["Rank", "Paragraph", "Similarity", "Text"], rows);
        }
    }

    if mode == OutputMode::Json {
        output_json(&results);
    }
    Ok(())
}
