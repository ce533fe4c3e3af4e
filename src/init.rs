//! Shared initialization for the CLI and library callers.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::config::{load_config, AppConfig};
use crate::pipeline::Pipeline;
use crate::services::{
    AnnotationService, EmbeddingService, HashingEmbedder, HeuristicAnnotator,
    LexiconSubstituter, LexiconToneClassifier, SubstitutionService, ToneService,
};

/// Application context holding configuration and the shared collaborator
/// handles. Built once at startup and passed down explicitly.
pub struct AppContext {
    pub config: AppConfig,
    pub annotation_service: Arc<dyn AnnotationService>,
    pub embedding_service: Arc<dyn EmbeddingService>,
    pub tone_service: Arc<dyn ToneService>,
    pub substitution_service: Arc<dyn SubstitutionService>,
    pub pipeline: Arc<Pipeline>,
}

impl AppContext {
    /// Load configuration and wire up the local collaborators.
    ///
    /// Config priority: explicit path > PROSEFLOW_CONFIG env > ./proseflow.toml
    /// > ~/.config/proseflow/config.toml > defaults
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config(config_path)?;
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: AppConfig) -> Self {
        let annotation_service: Arc<dyn AnnotationService> = Arc::new(HeuristicAnnotator::new());
        let embedding_service: Arc<dyn EmbeddingService> =
            Arc::new(HashingEmbedder::new(config.embedding.dimensions));
        let tone_service: Arc<dyn ToneService> = Arc::new(LexiconToneClassifier::new());
        let substitution_service: Arc<dyn SubstitutionService> =
            Arc::new(LexiconSubstituter::new());

        Self::with_services(
            config,
            annotation_service,
            embedding_service,
            tone_service,
            substitution_service,
        )
    }

    /// Build a context around caller-supplied collaborators.
    pub fn with_services(
        config: AppConfig,
        annotation_service: Arc<dyn AnnotationService>,
        embedding_service: Arc<dyn EmbeddingService>,
        tone_service: Arc<dyn ToneService>,
        substitution_service: Arc<dyn SubstitutionService>,
    ) -> Self {
        if embedding_service.is_available() {
            tracing::info!(
                "Embedding service ready ({} dimensions)",
                embedding_service.dimensions()
            );
        } else {
            tracing::warn!("Embedding service not available; theme analysis will fail");
        }
        if !annotation_service.is_available() {
            tracing::warn!("Annotation service not available; narrative and structure analysis will fail");
        }
        if !tone_service.is_available() {
            tracing::warn!("Tone service not available");
        }

        let pipeline = Arc::new(Pipeline::new(
            &config,
            annotation_service.clone(),
            embedding_service.clone(),
            tone_service.clone(),
            substitution_service.clone(),
        ));

        Self {
            config,
            annotation_service,
            embedding_service,
            tone_service,
            substitution_service,
            pipeline,
        }
    }
}
