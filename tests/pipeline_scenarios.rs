//! End-to-end pipeline runs with controlled collaborators.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{
    CountingEmbedder, FailingToneService, FixedAnnotator, FixedEmbedder, FixedToneService,
    PipelineBuilder, SlowEmbedder, TWO_TOPICS,
};
use pretty_assertions::assert_eq;
use proseflow::graph::{EntityId, EntityResolver};
use proseflow::models::{
    DocumentAnnotation, SentenceAnnotation, Severity, SuggestionKind, TokenAnnotation,
};
use proseflow::pipeline::AnalysisOptions;
use proseflow::services::CoherenceLevel;
use uuid::Uuid;

const HARBOR: &str = "The harbor filled with fishing boats at dawn.";
const TAXES: &str = "Quarterly tax filings are due before the end of April.";

// =============================================================================
// DRIFT AND FORMALITY SCENARIOS
// =============================================================================

#[tokio::test]
async fn unrelated_paragraphs_produce_one_high_drift_point() {
    let pipeline = PipelineBuilder::new()
        .embedding(FixedEmbedder::pair(HARBOR, TAXES, 0.15))
        .tone(FixedToneService { formality: 0.5 })
        .build();

    let report = pipeline
        .process(TWO_TOPICS, AnalysisOptions::default())
        .await
        .expect("valid input should produce a report");

    let drift = report.thematic_drift.unwrap().into_ok().unwrap();
    assert!(drift.drift_detected);
    assert_eq!(drift.drift_points.len(), 1);
    assert_eq!(drift.drift_points[0].position, 1);
    assert_eq!(drift.drift_points[0].severity, Severity::High);
    assert!((drift.drift_points[0].similarity_score - 0.15).abs() < 1e-4);

    let coherence = report.coherence.unwrap().into_ok().unwrap();
    assert_eq!(coherence.coherence_level, CoherenceLevel::Poor);

    // Drift is evaluated before coherence, both high
    let suggestions = report.suggestions.unwrap().into_ok().unwrap();
    let high: Vec<SuggestionKind> = suggestions
        .iter()
        .filter(|s| s.severity() == Severity::High)
        .map(|s| s.kind())
        .collect();
    assert_eq!(
        high,
        vec![SuggestionKind::NarrativeDrift, SuggestionKind::Coherence]
    );
    assert_eq!(suggestions[0].position(), Some(1));
}

#[tokio::test]
async fn low_formality_produces_one_too_informal_suggestion() {
    let pipeline = PipelineBuilder::new()
        .tone(FixedToneService { formality: 0.25 })
        .build();

    let report = pipeline
        .process(TWO_TOPICS, AnalysisOptions::default())
        .await
        .unwrap();

    let suggestions = report.suggestions.unwrap().into_ok().unwrap();
    let formality: Vec<_> = suggestions
        .iter()
        .filter(|s| s.kind() == SuggestionKind::Formality)
        .collect();
    assert_eq!(formality.len(), 1);
    assert_eq!(formality[0].severity(), Severity::Medium);
    assert_eq!(formality[0].key(), "too_informal");
}

#[tokio::test]
async fn neutral_formality_produces_no_formality_suggestion() {
    let pipeline = PipelineBuilder::new()
        .tone(FixedToneService { formality: 0.5 })
        .build();
    let report = pipeline
        .process(TWO_TOPICS, AnalysisOptions::default())
        .await
        .unwrap();
    let suggestions = report.suggestions.unwrap().into_ok().unwrap();
    assert!(suggestions
        .iter()
        .all(|s| s.kind() != SuggestionKind::Formality));
}

#[tokio::test]
async fn single_paragraph_is_not_an_error() {
    let report = PipelineBuilder::new()
        .build()
        .process(HARBOR, AnalysisOptions::default())
        .await
        .unwrap();

    let drift = report.thematic_drift.unwrap().into_ok().unwrap();
    assert!(!drift.drift_detected);
    assert!(drift.message.is_some());

    let coherence = report.coherence.unwrap().into_ok().unwrap();
    assert_eq!(coherence.coherence_score, 1.0);
    assert_eq!(coherence.coherence_level, CoherenceLevel::Excellent);
}

// =============================================================================
// STAGE FAILURE ISOLATION
// =============================================================================

#[tokio::test]
async fn failed_tone_stage_is_error_tagged_and_later_stages_run() {
    let pipeline = PipelineBuilder::new().tone(FailingToneService).build();
    let options = AnalysisOptions {
        transform_style: true,
        ..AnalysisOptions::default()
    };

    let report = pipeline.process(TWO_TOPICS, options).await.unwrap();

    let failed: Vec<&str> = report.failures().into_iter().map(|(name, _)| name).collect();
    assert_eq!(failed, vec!["tone", "tone_features"]);
    assert!(report.style_transformation.as_ref().unwrap().is_ok());
    assert!(report.diff.as_ref().unwrap().is_ok());

    // Absent tone means no formality suggestion, not an aggregation failure
    let suggestions = report.suggestions.clone().unwrap().into_ok().unwrap();
    assert!(suggestions
        .iter()
        .all(|s| s.kind() != SuggestionKind::Formality));

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["tone"]["error"]
        .as_str()
        .unwrap()
        .contains("classifier crashed"));
    assert!(json["suggestions"].is_array());
}

#[tokio::test]
async fn slow_embedding_times_out_theme_only() {
    let pipeline = PipelineBuilder::new()
        .embedding(SlowEmbedder {
            delay: Duration::from_millis(500),
        })
        .timeout(Duration::from_millis(50))
        .build();

    let report = pipeline
        .process(TWO_TOPICS, AnalysisOptions::default())
        .await
        .unwrap();

    let failed: Vec<(&str, &str)> = report.failures();
    assert_eq!(failed.len(), 2);
    assert_eq!(failed[0].0, "thematic_drift");
    assert_eq!(failed[1].0, "coherence");
    assert!(failed[0].1.contains("timed out after 50ms"));

    assert!(report.narrative.unwrap().is_ok());
    assert!(report.tone.unwrap().is_ok());
    assert!(report.summary.unwrap().is_ok());
}

#[tokio::test]
async fn annotation_with_dangling_heads_does_not_panic() {
    let token = |text: &str, dep: &str| TokenAnnotation {
        text: text.to_string(),
        lemma: text.to_lowercase(),
        idx: 0,
        dep: dep.to_string(),
        head: Some(42),
    };
    let annotation = DocumentAnnotation {
        sentences: vec![SentenceAnnotation {
            text: "The cake was eaten quickly.".to_string(),
            start: 0,
            end: 27,
            tokens: vec![token("cake", "nsubjpass"), token("was", "auxpass")],
        }],
        ..Default::default()
    };
    let pipeline = PipelineBuilder::new()
        .annotation(FixedAnnotator { annotation })
        .build();
    let options = AnalysisOptions {
        transform_style: true,
        ..AnalysisOptions::default()
    };

    let report = pipeline
        .process("The cake was eaten quickly.", options)
        .await
        .unwrap();

    let structure = report.structure.unwrap().into_ok().unwrap();
    assert_eq!(structure.num_sentences, 1);
    assert_eq!(structure.passive_voice_count, 0);
}

// =============================================================================
// EMBEDDING CACHE
// =============================================================================

#[tokio::test]
async fn shared_scope_embeds_each_paragraph_once() {
    let (embedder, calls) = CountingEmbedder::new();
    let pipeline = PipelineBuilder::new().embedding(embedder).build();
    let scope = Uuid::new_v4();

    let boats = pipeline.search_in(scope, TWO_TOPICS, "boats", 1).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    pipeline.search_in(scope, TWO_TOPICS, "boats", 1).await.unwrap();
    pipeline.similar_paragraphs_in(scope, TWO_TOPICS, 1).await.unwrap();
    pipeline.search_in(scope, TWO_TOPICS, "taxes", 1).await.unwrap();

    // Two paragraphs and two distinct queries
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(boats.len(), 1);
}

#[tokio::test]
async fn separate_calls_without_scope_do_not_share_embeddings() {
    let (embedder, calls) = CountingEmbedder::new();
    let pipeline = PipelineBuilder::new().embedding(embedder).build();

    pipeline.similar_paragraphs(TWO_TOPICS, 1).await.unwrap();
    pipeline.similar_paragraphs(TWO_TOPICS, 1).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

// =============================================================================
// REQUEST ISOLATION
// =============================================================================

#[tokio::test]
async fn concurrent_requests_build_separate_graphs() {
    let pipeline = Arc::new(PipelineBuilder::new().build());
    let first = "John visited Paris in 2020.\n\nJohn visited Rome in 2021.";
    let second = "Mary founded Acme in Boston.\n\nMary later moved to Denver.";

    let (a, b) = tokio::join!(
        pipeline.process(first, AnalysisOptions::default()),
        pipeline.process(second, AnalysisOptions::default()),
    );
    let a = a.unwrap().narrative.unwrap().into_ok().unwrap();
    let b = b.unwrap().narrative.unwrap().into_ok().unwrap();

    assert!(a.graph.nodes.iter().all(|n| !n.text.contains("Mary")));
    assert!(b.graph.nodes.iter().all(|n| !n.text.contains("John")));
    assert_eq!(a.contradictions.len(), 1);
    assert!(b.contradictions.is_empty());
}

/// Refuses every token.
struct NoMatchResolver;

impl EntityResolver for NoMatchResolver {
    fn resolve(&self, _token_text: &str) -> Option<EntityId> {
        None
    }
}

#[tokio::test]
async fn supplied_resolver_replaces_configured_strategy() {
    let text = "John visited Paris in 2020.\n\nJohn visited Rome in 2021.";

    let default = PipelineBuilder::new().build().narrative(text).await.unwrap();
    assert_eq!(default.contradictions.len(), 1);

    let custom = PipelineBuilder::new()
        .resolver(NoMatchResolver)
        .build()
        .narrative(text)
        .await
        .unwrap();
    assert!(custom.graph.edges.is_empty());
    assert!(custom.contradictions.is_empty());
    assert_eq!(custom.extraction.relations_added, 0);
    assert!(custom.extraction.relations_dropped >= default.extraction.relations_added);
}

#[tokio::test]
async fn empty_input_is_rejected_before_any_stage() {
    let pipeline = PipelineBuilder::new().tone(FailingToneService).build();
    let err = pipeline
        .process("  \n\n ", AnalysisOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Input error: Text cannot be empty");
}
