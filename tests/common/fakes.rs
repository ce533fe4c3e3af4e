//! Fake collaborators with canned outputs.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use proseflow::models::{DocumentAnnotation, ToneAnalysis, ToneFeatures, ToneLabel};
use proseflow::services::{AnnotationService, EmbeddingService, HashingEmbedder, ToneService};
use proseflow::ProseError;

/// Returns a fixed vector per paragraph; unknown text falls back to the
/// hashing embedder.
pub struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: HashingEmbedder,
}

impl FixedEmbedder {
    pub fn new() -> Self {
        Self {
            vectors: HashMap::new(),
            fallback: HashingEmbedder::new(2),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    /// Two unit vectors whose cosine similarity is exactly `similarity`.
    pub fn pair(first: &str, second: &str, similarity: f32) -> Self {
        let orthogonal = (1.0 - similarity * similarity).sqrt();
        Self::new()
            .with(first, vec![1.0, 0.0])
            .with(second, vec![similarity, orthogonal])
    }
}

#[async_trait]
impl EmbeddingService for FixedEmbedder {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, ProseError> {
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.fallback.embed(text)))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProseError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed_text(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Counts every text it is asked to embed. The counter is shared so the
/// test keeps a handle after the embedder moves into the pipeline.
pub struct CountingEmbedder {
    pub calls: Arc<AtomicUsize>,
    inner: HashingEmbedder,
}

impl CountingEmbedder {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let embedder = Self {
            calls: calls.clone(),
            inner: HashingEmbedder::default(),
        };
        (embedder, calls)
    }
}

#[async_trait]
impl EmbeddingService for CountingEmbedder {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, ProseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.embed(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProseError> {
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.inner.embed(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Returns the same annotation whatever the text.
pub struct FixedAnnotator {
    pub annotation: DocumentAnnotation,
}

#[async_trait]
impl AnnotationService for FixedAnnotator {
    async fn annotate(&self, _text: &str) -> Result<DocumentAnnotation, ProseError> {
        Ok(self.annotation.clone())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Sleeps before every call.
pub struct SlowEmbedder {
    pub delay: Duration,
}

#[async_trait]
impl EmbeddingService for SlowEmbedder {
    async fn embed_text(&self, _text: &str) -> Result<Vec<f32>, ProseError> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![1.0, 0.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProseError> {
        tokio::time::sleep(self.delay).await;
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Classifies every text with the same formality.
pub struct FixedToneService {
    pub formality: f32,
}

#[async_trait]
impl ToneService for FixedToneService {
    async fn classify(&self, _text: &str) -> Result<ToneAnalysis, ProseError> {
        Ok(ToneAnalysis {
            tone: ToneLabel::from_formality(self.formality),
            formality_score: self.formality,
            confidence: 0.9,
            is_formal: self.formality > 0.5,
        })
    }

    async fn feature_importance(&self, _text: &str) -> Result<ToneFeatures, ProseError> {
        Ok(ToneFeatures::default())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Fails every call the way a crashed classifier would.
pub struct FailingToneService;

#[async_trait]
impl ToneService for FailingToneService {
    async fn classify(&self, _text: &str) -> Result<ToneAnalysis, ProseError> {
        Err(ProseError::stage("tone", "classifier crashed"))
    }

    async fn feature_importance(&self, _text: &str) -> Result<ToneFeatures, ProseError> {
        Err(ProseError::stage("tone", "classifier crashed"))
    }

    fn is_available(&self) -> bool {
        false
    }
}
