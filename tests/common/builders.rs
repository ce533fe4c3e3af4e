//! Pipeline builder for integration tests.
//!
//! Every collaborator defaults to the local implementation; tests swap in
//! fakes for the one they want to control.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use proseflow::config::AppConfig;
use proseflow::graph::EntityResolver;
use proseflow::pipeline::Pipeline;
use proseflow::services::{
    AnnotationService, EmbeddingService, HashingEmbedder, HeuristicAnnotator,
    LexiconSubstituter, LexiconToneClassifier, SubstitutionService, ToneService,
};

/// Two paragraphs about unrelated topics.
pub const TWO_TOPICS: &str = "The harbor filled with fishing boats at dawn.\n\n\
    Quarterly tax filings are due before the end of April.";

pub struct PipelineBuilder {
    config: AppConfig,
    annotation: Arc<dyn AnnotationService>,
    embedding: Arc<dyn EmbeddingService>,
    tone: Arc<dyn ToneService>,
    substitution: Arc<dyn SubstitutionService>,
    timeout: Option<Duration>,
    resolver: Option<Arc<dyn EntityResolver>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            annotation: Arc::new(HeuristicAnnotator::new()),
            embedding: Arc::new(HashingEmbedder::default()),
            tone: Arc::new(LexiconToneClassifier::new()),
            substitution: Arc::new(LexiconSubstituter::new()),
            timeout: None,
            resolver: None,
        }
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    pub fn annotation(mut self, service: impl AnnotationService + 'static) -> Self {
        self.annotation = Arc::new(service);
        self
    }

    pub fn embedding(mut self, service: impl EmbeddingService + 'static) -> Self {
        self.embedding = Arc::new(service);
        self
    }

    pub fn tone(mut self, service: impl ToneService + 'static) -> Self {
        self.tone = Arc::new(service);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn resolver(mut self, resolver: impl EntityResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn build(self) -> Pipeline {
        let pipeline = Pipeline::new(
            &self.config,
            self.annotation,
            self.embedding,
            self.tone,
            self.substitution,
        );
        let pipeline = match self.timeout {
            Some(timeout) => pipeline.with_timeout(timeout),
            None => pipeline,
        };
        match self.resolver {
            Some(resolver) => pipeline.with_resolver(resolver),
            None => pipeline,
        }
    }
}
