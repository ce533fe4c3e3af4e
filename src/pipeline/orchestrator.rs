//! Request orchestration.
//!
//! [`Pipeline::process`] runs the stages in a fixed order (narrative,
//! structure, theme, tone, style transform, suggestions, diff). Every
//! collaborator call is bounded by the stage timeout, and a failing stage is
//! recorded in its report slot without stopping the stages after it.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{AppConfig, PipelineConfig, ResolverConfig};
use crate::graph::{build_graph, build_graph_with_config, EntityResolver, GraphExport};
use crate::models::{DocumentAnnotation, StyleTransformation, TargetTone};
use crate::pipeline::report::{
    AnalysisOptions, AnalysisReport, BatchItem, BatchReport, NarrativeAnalysis,
};
use crate::pipeline::stage::{Stage, StageResult};
use crate::services::annotation::AnnotationService;
use crate::services::diff::{word_diff, DiffEntry};
use crate::services::drift::{CoherenceAnalysis, DriftAnalysis, SearchHit, SimilarPair, ThematicAnalyzer};
use crate::services::embedding::{EmbeddingCache, EmbeddingService};
use crate::services::progress::ProgressReporter;
use crate::services::structure::{analyze_structure, passive_conversions};
use crate::services::style::SubstitutionService;
use crate::services::suggestion::{render_quick_summary, SignalBag, SuggestionAggregator};
use crate::services::tone::ToneService;
use crate::utils::text::segment_paragraphs;
use crate::ProseError;

/// Log and tag a stage outcome.
fn settle<T>(request_id: Uuid, stage: Stage, result: Result<T, ProseError>) -> StageResult<T> {
    match result {
        Ok(value) => {
            debug!(request_id = %request_id, stage = %stage, "Stage finished");
            StageResult::Ok(value)
        }
        Err(err) => {
            warn!(request_id = %request_id, stage = %stage, error = %err, "Stage failed");
            StageResult::failed(err)
        }
    }
}

/// The analysis pipeline. Holds shared collaborator handles and immutable
/// configuration only; every request builds its own graph and buffers.
pub struct Pipeline {
    annotation: Arc<dyn AnnotationService>,
    embedding: Arc<dyn EmbeddingService>,
    tone: Arc<dyn ToneService>,
    substitution: Arc<dyn SubstitutionService>,
    cache: EmbeddingCache,
    analyzer: ThematicAnalyzer,
    aggregator: SuggestionAggregator,
    settings: PipelineConfig,
    resolver: ResolverConfig,
    custom_resolver: Option<Arc<dyn EntityResolver>>,
    timeout: Duration,
}

impl Pipeline {
    pub fn new(
        config: &AppConfig,
        annotation: Arc<dyn AnnotationService>,
        embedding: Arc<dyn EmbeddingService>,
        tone: Arc<dyn ToneService>,
        substitution: Arc<dyn SubstitutionService>,
    ) -> Self {
        Self {
            annotation,
            embedding,
            tone,
            substitution,
            cache: EmbeddingCache::new(
                config.pipeline.embedding_cache_capacity,
                config.pipeline.embedding_cache_ttl_secs,
            ),
            analyzer: ThematicAnalyzer::new(config.drift.clone(), config.coherence.clone()),
            aggregator: SuggestionAggregator::new(config.scoring.clone(), &config.drift),
            settings: config.pipeline.clone(),
            resolver: config.resolver.clone(),
            custom_resolver: None,
            timeout: Duration::from_secs(config.pipeline.stage_timeout_secs),
        }
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve relation endpoints with `resolver` instead of the configured
    /// strategy.
    pub fn with_resolver(mut self, resolver: Arc<dyn EntityResolver>) -> Self {
        self.custom_resolver = Some(resolver);
        self
    }

    pub fn analyzer(&self) -> &ThematicAnalyzer {
        &self.analyzer
    }

    /// Reject input before any stage runs.
    pub fn validate_input(&self, text: &str) -> Result<(), ProseError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ProseError::Input("Text cannot be empty".to_string()));
        }
        let length = trimmed.chars().count();
        if length < self.settings.min_text_chars {
            return Err(ProseError::Input(format!(
                "Text must be at least {} characters (got {})",
                self.settings.min_text_chars, length
            )));
        }
        Ok(())
    }

    /// Run a collaborator call under the stage timeout.
    async fn bounded<T>(
        &self,
        call_name: &str,
        call: impl Future<Output = Result<T, ProseError>>,
    ) -> Result<T, ProseError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProseError::Timeout {
                stage: call_name.to_string(),
                after: self.timeout,
            }),
        }
    }

    async fn annotate(&self, text: &str) -> Result<DocumentAnnotation, ProseError> {
        self.bounded("annotation", self.annotation.annotate(text)).await
    }

    async fn embed(&self, request_id: Uuid, paragraphs: &[String]) -> Result<Vec<Vec<f32>>, ProseError> {
        self.bounded(
            "embedding",
            self.cache
                .embed_paragraphs(self.embedding.as_ref(), request_id, paragraphs),
        )
        .await
    }

    fn narrative_from(&self, annotation: &DocumentAnnotation) -> NarrativeAnalysis {
        let (graph, extraction) = match &self.custom_resolver {
            Some(resolver) => build_graph(annotation, resolver.as_ref()),
            None => build_graph_with_config(annotation, &self.resolver),
        };
        NarrativeAnalysis {
            graph: graph.export(),
            stats: graph.stats(),
            extraction,
            contradictions: graph.detect_contradictions(),
        }
    }

    async fn theme(
        &self,
        request_id: Uuid,
        text: &str,
    ) -> Result<(DriftAnalysis, CoherenceAnalysis), ProseError> {
        let paragraphs = segment_paragraphs(text);
        let embeddings = self.embed(request_id, &paragraphs).await?;
        let drift =
            self.analyzer
                .compute_drift(&paragraphs, &embeddings, self.analyzer.threshold())?;
        let coherence = self.analyzer.compute_coherence(&paragraphs, &embeddings)?;
        Ok((drift, coherence))
    }

    /// Analyze one document.
    ///
    /// Only input validation can fail the whole request; every stage failure
    /// is recorded in the report instead.
    pub async fn process(
        &self,
        text: &str,
        options: AnalysisOptions,
    ) -> Result<AnalysisReport, ProseError> {
        self.validate_input(text)?;

        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let mut report = AnalysisReport::empty(request_id, text.chars().count(), options);
        let mut signals = SignalBag::default();
        debug!(request_id = %request_id, chars = report.input_length, "Processing request");

        // Annotation is shared by the narrative and structure stages.
        let annotation = if options.analyze_narrative || options.analyze_structure {
            Some(self.annotate(text).await.map_err(|e| e.to_string()))
        } else {
            None
        };
        let annotated = |stage: Stage| match &annotation {
            Some(Ok(doc)) => Ok(doc),
            Some(Err(message)) => Err(ProseError::stage(stage.as_str(), message)),
            None => Err(ProseError::stage(stage.as_str(), "annotation was not run")),
        };

        if options.analyze_narrative {
            let narrative = settle(
                request_id,
                Stage::Narrative,
                annotated(Stage::Narrative).map(|doc| self.narrative_from(doc)),
            );
            signals.contradictions = narrative.as_ok().map(|n| n.contradictions.clone());
            report.narrative = Some(narrative);
        }

        if options.analyze_structure {
            let structure = settle(
                request_id,
                Stage::Structure,
                annotated(Stage::Structure).map(|doc| {
                    (
                        analyze_structure(doc),
                        passive_conversions(doc, self.settings.max_passive_conversions),
                    )
                }),
            );
            match structure {
                StageResult::Ok((stats, conversions)) => {
                    signals.structure = Some(stats.clone());
                    signals.passive_conversions = Some(conversions.clone());
                    report.structure = Some(StageResult::Ok(stats));
                    report.passive_voice = Some(StageResult::Ok(conversions));
                }
                StageResult::Failed { error } => {
                    report.structure = Some(StageResult::failed(&error));
                    report.passive_voice = Some(StageResult::failed(error));
                }
            }
        }

        if options.analyze_theme {
            match settle(request_id, Stage::Theme, self.theme(request_id, text).await) {
                StageResult::Ok((drift, coherence)) => {
                    signals.thematic_drift = Some(drift.clone());
                    signals.coherence = Some(coherence.clone());
                    report.thematic_drift = Some(StageResult::Ok(drift));
                    report.coherence = Some(StageResult::Ok(coherence));
                }
                StageResult::Failed { error } => {
                    report.thematic_drift = Some(StageResult::failed(&error));
                    report.coherence = Some(StageResult::failed(error));
                }
            }
        }

        if options.analyze_tone {
            let (tone, features) = tokio::join!(
                self.bounded("tone", self.tone.classify(text)),
                self.bounded("tone", self.tone.feature_importance(text)),
            );
            let tone = settle(request_id, Stage::Tone, tone);
            signals.tone = tone.as_ok().cloned();
            report.tone = Some(tone);
            report.tone_features = Some(settle(request_id, Stage::Tone, features));
        }

        if options.transform_style {
            let transformed = self
                .bounded(
                    "style_transform",
                    self.substitution.transform(text, options.target_tone),
                )
                .await;
            report.style_transformation =
                Some(settle(request_id, Stage::StyleTransform, transformed));
        }

        if options.suggest_enhancements {
            match settle(
                request_id,
                Stage::Suggestions,
                self.aggregator.aggregate(&signals),
            ) {
                StageResult::Ok((suggestions, summary)) => {
                    report.suggestions = Some(StageResult::Ok(suggestions));
                    report.summary = Some(StageResult::Ok(summary));
                }
                StageResult::Failed { error } => {
                    report.suggestions = Some(StageResult::failed(&error));
                    report.summary = Some(StageResult::failed(error));
                }
            }
        }

        if let Some(StageResult::Ok(transformed)) = &report.style_transformation {
            report.diff = Some(StageResult::Ok(word_diff(
                &transformed.original_text,
                &transformed.transformed_text,
            )));
        }

        report.processing_time = started.elapsed().as_secs_f64();
        let failures = report.failures().len();
        info!(
            request_id = %request_id,
            suggestions = report
                .suggestions
                .as_ref()
                .and_then(|s| s.as_ok())
                .map_or(0, |s| s.len()),
            score = report
                .summary
                .as_ref()
                .and_then(|s| s.as_ok())
                .map(|s| s.quality_score),
            failed_stages = failures,
            elapsed_secs = report.processing_time,
            "Analysis complete"
        );
        Ok(report)
    }

    /// Knowledge graph, stats and contradictions for a text.
    pub async fn narrative(&self, text: &str) -> Result<NarrativeAnalysis, ProseError> {
        self.validate_input(text)?;
        let annotation = self.annotate(text).await?;
        Ok(self.narrative_from(&annotation))
    }

    /// Node/edge view of the knowledge graph for visualization.
    pub async fn export_graph(&self, text: &str) -> Result<GraphExport, ProseError> {
        Ok(self.narrative(text).await?.graph)
    }

    /// Run every analysis and render the plain-text digest.
    pub async fn quick_analysis(&self, text: &str) -> Result<String, ProseError> {
        let report = self.process(text, AnalysisOptions::default()).await?;
        match (report.summary, report.suggestions) {
            (Some(StageResult::Ok(summary)), Some(StageResult::Ok(suggestions))) => {
                Ok(render_quick_summary(&summary, &suggestions))
            }
            (Some(StageResult::Failed { error }), _) => {
                Err(ProseError::stage(Stage::Suggestions.as_str(), error))
            }
            _ => Err(ProseError::stage(
                Stage::Suggestions.as_str(),
                "no summary was produced",
            )),
        }
    }

    /// Style transformation toward `target` and the word diff it implies.
    pub async fn transform(
        &self,
        text: &str,
        target: TargetTone,
    ) -> Result<(StyleTransformation, Vec<DiffEntry>), ProseError> {
        self.validate_input(text)?;
        let transformed = self
            .bounded("style_transform", self.substitution.transform(text, target))
            .await?;
        let diff = word_diff(&transformed.original_text, &transformed.transformed_text);
        Ok((transformed, diff))
    }

    /// The `top_k` most similar paragraph pairs of a text.
    pub async fn similar_paragraphs(
        &self,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<SimilarPair>, ProseError> {
        self.similar_paragraphs_in(Uuid::new_v4(), text, top_k).await
    }

    /// [`Pipeline::similar_paragraphs`] with embeddings cached under a
    /// caller-supplied `scope`. Calls sharing a scope embed each paragraph
    /// once.
    pub async fn similar_paragraphs_in(
        &self,
        scope: Uuid,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<SimilarPair>, ProseError> {
        self.validate_input(text)?;
        let paragraphs = segment_paragraphs(text);
        let embeddings = self.embed(scope, &paragraphs).await?;
        self.analyzer.similar_pairs(&paragraphs, &embeddings, top_k)
    }

    /// Paragraphs of `text` ranked by similarity to `query`.
    pub async fn search(
        &self,
        text: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, ProseError> {
        self.search_in(Uuid::new_v4(), text, query, top_k).await
    }

    /// [`Pipeline::search`] with embeddings cached under a caller-supplied
    /// `scope`, so several queries over one document embed its paragraphs
    /// once.
    pub async fn search_in(
        &self,
        scope: Uuid,
        text: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchHit>, ProseError> {
        self.validate_input(text)?;
        let query = query.trim();
        if query.is_empty() {
            return Err(ProseError::Input("Query cannot be empty".to_string()));
        }
        let paragraphs = segment_paragraphs(text);
        let embeddings = self.embed(scope, &paragraphs).await?;
        let query_vector = self
            .embed(scope, &[query.to_string()])
            .await?
            .pop()
            .unwrap_or_default();
        self.analyzer
            .search_similar(&query_vector, &paragraphs, &embeddings, top_k)
    }

    /// Analyze independent documents concurrently.
    ///
    /// Each document is its own request. Results come back in input order.
    pub async fn process_batch(
        &self,
        texts: &[String],
        options: AnalysisOptions,
        progress: Arc<dyn ProgressReporter>,
    ) -> BatchReport {
        let total = texts.len();
        let concurrency = self.settings.batch_concurrency.max(1);

        progress
            .report(0.0, 1.0, Some(format!("Analyzing {} documents", total)))
            .await;

        let mut buffered = tokio_stream::iter(texts.iter().enumerate())
            .map(|(index, text)| async move { (index, self.process(text, options).await) })
            .buffer_unordered(concurrency);

        let mut results = Vec::with_capacity(total);
        let mut processed = 0usize;
        while let Some((index, result)) = buffered.next().await {
            processed += 1;
            progress
                .step(processed, total, &format!("Analyzed {}/{}", processed, total))
                .await;
            results.push(match result {
                Ok(report) => BatchItem {
                    index,
                    report: Some(report),
                    error: None,
                },
                Err(err) => {
                    warn!(index, error = %err, "Batch document rejected");
                    BatchItem {
                        index,
                        report: None,
                        error: Some(err.to_string()),
                    }
                }
            });
        }
        results.sort_by_key(|item| item.index);

        let errors = results.iter().filter(|item| item.error.is_some()).count();
        info!(total, errors, "Batch complete");
        BatchReport {
            total_processed: total,
            successes: total - errors,
            errors,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::annotation::HeuristicAnnotator;
    use crate::services::embedding::HashingEmbedder;
    use crate::services::progress::noop_progress;
    use crate::services::style::LexiconSubstituter;
    use crate::services::tone::{LexiconToneClassifier, NoopToneService};

    fn local_pipeline() -> Pipeline {
        Pipeline::new(
            &AppConfig::default(),
            Arc::new(HeuristicAnnotator::new()),
            Arc::new(HashingEmbedder::default()),
            Arc::new(LexiconToneClassifier::new()),
            Arc::new(LexiconSubstituter::new()),
        )
    }

    const STORY: &str = "John visited Paris in 2020. John visited Rome.\n\n\
        The harbor filled with fishing boats at dawn.";

    #[tokio::test]
    async fn test_rejects_short_input_before_stages() {
        let pipeline = local_pipeline();
        assert!(matches!(
            pipeline.process("   ", AnalysisOptions::default()).await,
            Err(ProseError::Input(_))
        ));
        assert!(matches!(
            pipeline.process("Too short", AnalysisOptions::default()).await,
            Err(ProseError::Input(_))
        ));
    }

    #[tokio::test]
    async fn test_full_local_run() {
        let report = local_pipeline()
            .process(STORY, AnalysisOptions::default())
            .await
            .unwrap();
        assert!(report.failures().is_empty(), "{:?}", report.failures());

        let narrative = report.narrative.unwrap().into_ok().unwrap();
        assert_eq!(narrative.contradictions.len(), 1);
        assert_eq!(narrative.contradictions[0].predicate, "visit");

        let drift = report.thematic_drift.unwrap().into_ok().unwrap();
        assert_eq!(drift.num_paragraphs, 2);
        assert!(report.style_transformation.is_none());
        assert!(report.diff.is_none());
        assert!(report.summary.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_failed_tone_does_not_stop_later_stages() {
        let pipeline = Pipeline::new(
            &AppConfig::default(),
            Arc::new(HeuristicAnnotator::new()),
            Arc::new(HashingEmbedder::default()),
            Arc::new(NoopToneService::new()),
            Arc::new(LexiconSubstituter::new()),
        );
        let options = AnalysisOptions {
            transform_style: true,
            ..AnalysisOptions::default()
        };
        let report = pipeline.process(STORY, options).await.unwrap();
        assert!(report.tone.as_ref().unwrap().error().is_some());
        assert!(report.tone_features.as_ref().unwrap().error().is_some());
        assert!(report.style_transformation.unwrap().is_ok());
        assert!(report.diff.unwrap().is_ok());
        assert!(report.suggestions.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_disabled_stages_are_absent() {
        let options = AnalysisOptions {
            analyze_narrative: false,
            analyze_structure: false,
            analyze_theme: false,
            analyze_tone: false,
            suggest_enhancements: false,
            transform_style: false,
            target_tone: TargetTone::Formal,
        };
        let report = local_pipeline().process(STORY, options).await.unwrap();
        assert!(report.narrative.is_none());
        assert!(report.tone.is_none());
        assert!(report.suggestions.is_none());
    }

    #[tokio::test]
    async fn test_transform_returns_diff() {
        let (transformed, diff) = local_pipeline()
            .transform("We are gonna buy stuff tomorrow.", TargetTone::Formal)
            .await
            .unwrap();
        assert_eq!(
            transformed.transformed_text,
            "We are going to purchase items tomorrow."
        );
        assert_eq!(diff.len(), 1);
    }

    #[tokio::test]
    async fn test_export_graph() {
        let graph = local_pipeline().export_graph(STORY).await.unwrap();
        assert!(graph.nodes.len() >= 3);
        assert_eq!(graph.edges.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_keeps_input_order() {
        let texts = vec![
            STORY.to_string(),
            "tiny".to_string(),
            "The committee approved the budget. Members voted in favor.".to_string(),
        ];
        let batch = local_pipeline()
            .process_batch(&texts, AnalysisOptions::default(), noop_progress())
            .await;
        assert_eq!(batch.total_processed, 3);
        assert_eq!(batch.errors, 1);
        let indices: Vec<usize> = batch.results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(batch.results[1].error.is_some());
        assert_ne!(
            batch.results[0].report.as_ref().unwrap().request_id,
            batch.results[2].report.as_ref().unwrap().request_id
        );
    }

    #[tokio::test]
    async fn test_search_ranks_matching_paragraph_first() {
        let hits = local_pipeline()
            .search(STORY, "fishing boats in the harbor", 2)
            .await
            .unwrap();
        assert_eq!(hits[0].paragraph_index, 1);
        assert_eq!(hits[0].rank, 1);
    }
}
