//! Paragraph embedding service and the request-scoped embedding cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;
use uuid::Uuid;

use crate::services::annotation::lemmatize;
use crate::utils::math::l2_normalize;
use crate::ProseError;

/// Service trait for generating text embeddings.
///
/// Implementations return one fixed-dimension vector per input, in input order.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generate the embedding for a single text.
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, ProseError>;

    /// Generate embeddings for multiple texts in one call.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProseError>;

    /// Vector dimension.
    fn dimensions(&self) -> usize;

    /// Whether the embedding backend is loaded and available.
    fn is_available(&self) -> bool;
}

/// Words that carry no topical signal.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "of", "in", "on", "at", "to", "from", "by", "with",
    "for", "about", "as", "is", "are", "was", "were", "be", "been", "it", "its", "this", "that",
    "these", "those", "he", "she", "they", "we", "i", "you", "his", "her", "their", "our", "my",
    "your", "him", "them", "us", "me", "not", "no", "so", "if", "then", "than", "there", "has",
    "have", "had", "do", "does", "did", "will", "would", "can", "could", "also", "very", "just",
];

/// 64-bit FNV-1a, stable across platforms and releases.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Feature-hashing bag-of-lemmas embedder.
///
/// Each content word is lemmatized and hashed into one signed bucket; the
/// result is L2-normalized. Paragraphs sharing vocabulary land close together,
/// paragraphs with disjoint vocabulary are near-orthogonal.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Embed synchronously.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];
        let words = text
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .map(|w| w.trim_matches('\'').to_lowercase())
            .filter(|w| w.chars().count() > 1 && !STOPWORDS.contains(&w.as_str()));

        for word in words {
            let hash = fnv1a(lemmatize(&word).as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingService for HashingEmbedder {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, ProseError> {
        Ok(self.embed(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProseError> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// No-op embedding service.
///
/// Always reports as unavailable and returns errors for embed operations.
pub struct NoopEmbeddingService;

impl Default for NoopEmbeddingService {
    fn default() -> Self {
        Self::new()
    }
}

impl NoopEmbeddingService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmbeddingService for NoopEmbeddingService {
    async fn embed_text(&self, _text: &str) -> Result<Vec<f32>, ProseError> {
        Err(ProseError::ServiceUnavailable(
            "Embedding service is not available (noop)".to_string(),
        ))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, ProseError> {
        Err(ProseError::ServiceUnavailable(
            "Embedding service is not available (noop)".to_string(),
        ))
    }

    fn dimensions(&self) -> usize {
        256
    }

    fn is_available(&self) -> bool {
        false
    }
}

// ============================================================================
// Request-scoped cache
// ============================================================================

/// Embedding cache shared by all requests.
///
/// Keys are `(scope, paragraph)`. A scope is either one request id or a
/// caller-chosen id shared by several calls over the same document (see
/// `Pipeline::search_in`). Two scopes that happen to contain the same
/// paragraph never see each other's vectors.
#[derive(Clone)]
pub struct EmbeddingCache {
    cache: Cache<(Uuid, String), Arc<Vec<f32>>>,
}

impl EmbeddingCache {
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();
        Self { cache }
    }

    /// Embeddings for `paragraphs`, in order. Only cache misses are sent to
    /// the service, in one batch.
    pub async fn embed_paragraphs(
        &self,
        service: &dyn EmbeddingService,
        scope: Uuid,
        paragraphs: &[String],
    ) -> Result<Vec<Vec<f32>>, ProseError> {
        let mut slots: Vec<Option<Arc<Vec<f32>>>> = Vec::with_capacity(paragraphs.len());
        let mut misses: Vec<String> = Vec::new();

        for paragraph in paragraphs {
            let hit = self.cache.get(&(scope, paragraph.clone())).await;
            if hit.is_none() && !misses.contains(paragraph) {
                misses.push(paragraph.clone());
            }
            slots.push(hit);
        }

        if !misses.is_empty() {
            debug!(
                scope = %scope,
                hits = paragraphs.len() - slots.iter().filter(|s| s.is_none()).count(),
                misses = misses.len(),
                "Embedding cache lookup"
            );
            let vectors = service.embed_batch(&misses).await?;
            if vectors.len() != misses.len() {
                return Err(ProseError::stage(
                    "embedding",
                    format!(
                        "expected {} embeddings, service returned {}",
                        misses.len(),
                        vectors.len()
                    ),
                ));
            }
            for (paragraph, vector) in misses.into_iter().zip(vectors) {
                let vector = Arc::new(vector);
                for (slot, p) in slots.iter_mut().zip(paragraphs) {
                    if slot.is_none() && *p == paragraph {
                        *slot = Some(vector.clone());
                    }
                }
                self.cache.insert((scope, paragraph), vector).await;
            }
        }

        Ok(slots
            .into_iter()
            .map(|slot| slot.map(|v| v.as_ref().clone()).unwrap_or_default())
            .collect())
    }

    /// Drop every entry, e.g. after a config reload.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Approximate number of cached vectors.
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

// ============================================================================
// Tests
// ============================================================================
