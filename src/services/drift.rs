//! Thematic drift and coherence analysis over paragraph embeddings.
//!
//! Everything here is a pure function of `(paragraphs, embeddings)`; the
//! analyzer only carries its cutpoints.

use serde::{Deserialize, Serialize};

use crate::config::{CoherenceConfig, DriftConfig};
use crate::models::Severity;
use crate::utils::math::{adjacent_similarities, cosine_similarity, mean, similarity_matrix};
use crate::utils::text::excerpt;
use crate::ProseError;

/// Sharp similarity drop between paragraphs `position - 1` and `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftPoint {
    /// Index of the later paragraph of the pair
    pub position: usize,
    pub paragraph_before: String,
    pub paragraph_after: String,
    pub similarity_score: f32,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftAnalysis {
    pub drift_detected: bool,
    /// Set when the document is too short to analyze
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub num_paragraphs: usize,
    /// Adjacent-pair similarities, length `num_paragraphs - 1`
    pub similarity_scores: Vec<f32>,
    pub average_similarity: f32,
    pub drift_points: Vec<DriftPoint>,
    pub threshold: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoherenceLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl CoherenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoherenceLevel::Excellent => "excellent",
            CoherenceLevel::Good => "good",
            CoherenceLevel::Fair => "fair",
            CoherenceLevel::Poor => "poor",
        }
    }
}

impl std::fmt::Display for CoherenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherenceAnalysis {
    pub coherence_score: f32,
    pub coherence_level: CoherenceLevel,
    /// Pairwise similarities, zero diagonal; empty for fewer than 2 paragraphs
    #[serde(default)]
    pub similarity_matrix: Vec<Vec<f32>>,
    pub paragraph_count: usize,
    pub analysis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarPair {
    pub paragraph_1_index: usize,
    pub paragraph_2_index: usize,
    pub paragraph_1: String,
    pub paragraph_2: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// 1-based rank
    pub rank: usize,
    pub paragraph_index: usize,
    pub paragraph: String,
    pub similarity: f32,
}

/// Drift and coherence analyzer.
#[derive(Debug, Clone, Default)]
pub struct ThematicAnalyzer {
    drift: DriftConfig,
    coherence: CoherenceConfig,
}

impl ThematicAnalyzer {
    pub fn new(drift: DriftConfig, coherence: CoherenceConfig) -> Self {
        Self { drift, coherence }
    }

    /// Configured drift threshold.
    pub fn threshold(&self) -> f32 {
        self.drift.threshold
    }

    /// Fixed step function from similarity to drift severity.
    pub fn severity_for(&self, similarity: f32) -> Severity {
        if similarity < self.drift.high_cutoff {
            Severity::High
        } else if similarity < self.drift.medium_cutoff {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn level_for(&self, score: f32) -> CoherenceLevel {
        if score > self.coherence.excellent {
            CoherenceLevel::Excellent
        } else if score > self.coherence.good {
            CoherenceLevel::Good
        } else if score > self.coherence.fair {
            CoherenceLevel::Fair
        } else {
            CoherenceLevel::Poor
        }
    }

    /// Drift points between adjacent paragraphs whose similarity falls below
    /// `threshold`.
    ///
    /// Fewer than two paragraphs is not an error: the result reports no drift
    /// and carries an explanatory message.
    pub fn compute_drift(
        &self,
        paragraphs: &[String],
        embeddings: &[Vec<f32>],
        threshold: f32,
    ) -> Result<DriftAnalysis, ProseError> {
        // Under two paragraphs the embeddings are never read
        if paragraphs.len() < 2 {
            let reason = ProseError::InsufficientInput(format!(
                "{} paragraph(s), at least 2 are needed to measure drift",
                paragraphs.len()
            ));
            return Ok(DriftAnalysis {
                drift_detected: false,
                message: Some(reason.to_string()),
                num_paragraphs: paragraphs.len(),
                similarity_scores: Vec::new(),
                average_similarity: 0.0,
                drift_points: Vec::new(),
                threshold,
            });
        }
        check_aligned(paragraphs, embeddings)?;

        let scores = adjacent_similarities(embeddings);
        let drift_points: Vec<DriftPoint> = scores
            .iter()
            .enumerate()
            .filter(|(_, score)| **score < threshold)
            .map(|(i, &score)| DriftPoint {
                position: i + 1,
                paragraph_before: paragraphs[i].clone(),
                paragraph_after: paragraphs[i + 1].clone(),
                similarity_score: score,
                severity: self.severity_for(score),
            })
            .collect();

        Ok(DriftAnalysis {
            drift_detected: !drift_points.is_empty(),
            message: None,
            num_paragraphs: paragraphs.len(),
            average_similarity: mean(&scores).unwrap_or(0.0),
            similarity_scores: scores,
            drift_points,
            threshold,
        })
    }

    /// Mean pairwise similarity over every unordered paragraph pair.
    ///
    /// A single paragraph is trivially coherent: `1.0`, `excellent`.
    pub fn compute_coherence(
        &self,
        paragraphs: &[String],
        embeddings: &[Vec<f32>],
    ) -> Result<CoherenceAnalysis, ProseError> {
        if paragraphs.len() < 2 {
            return Ok(CoherenceAnalysis {
                coherence_score: 1.0,
                coherence_level: CoherenceLevel::Excellent,
                similarity_matrix: Vec::new(),
                paragraph_count: paragraphs.len(),
                analysis: "Single paragraph - cannot calculate coherence".to_string(),
            });
        }
        check_aligned(paragraphs, embeddings)?;

        let matrix = similarity_matrix(embeddings);
        let pairs: Vec<f32> = matrix
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row[i + 1..].iter().copied())
            .collect();
        let score = mean(&pairs).unwrap_or(0.0);
        let level = self.level_for(score);

        Ok(CoherenceAnalysis {
            coherence_score: score,
            coherence_level: level,
            similarity_matrix: matrix,
            paragraph_count: paragraphs.len(),
            analysis: describe_coherence(score, level),
        })
    }

    /// The `top_k` most similar paragraph pairs, most similar first.
    pub fn similar_pairs(
        &self,
        paragraphs: &[String],
        embeddings: &[Vec<f32>],
        top_k: usize,
    ) -> Result<Vec<SimilarPair>, ProseError> {
        check_aligned(paragraphs, embeddings)?;

        let mut pairs = Vec::new();
        for i in 0..paragraphs.len() {
            for j in (i + 1)..paragraphs.len() {
                pairs.push(SimilarPair {
                    paragraph_1_index: i,
                    paragraph_2_index: j,
                    paragraph_1: excerpt(&paragraphs[i], self.drift.excerpt_chars),
                    paragraph_2: excerpt(&paragraphs[j], self.drift.excerpt_chars),
                    similarity: cosine_similarity(&embeddings[i], &embeddings[j]),
                });
            }
        }
        pairs.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pairs.truncate(top_k);
        Ok(pairs)
    }

    /// Paragraphs ranked by similarity to a query embedding.
    pub fn search_similar(
        &self,
        query: &[f32],
        paragraphs: &[String],
        embeddings: &[Vec<f32>],
        top_k: usize,
    ) -> Result<Vec<SearchHit>, ProseError> {
        check_aligned(paragraphs, embeddings)?;

        let mut scored: Vec<(usize, f32)> = embeddings
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query, e)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(top_k)
            .enumerate()
            .map(|(rank, (i, similarity))| SearchHit {
                rank: rank + 1,
                paragraph_index: i,
                paragraph: paragraphs[i].clone(),
                similarity,
            })
            .collect())
    }
}

fn check_aligned(paragraphs: &[String], embeddings: &[Vec<f32>]) -> Result<(), ProseError> {
    if paragraphs.len() != embeddings.len() {
        return Err(ProseError::Input(format!(
            "{} paragraphs but {} embeddings",
            paragraphs.len(),
            embeddings.len()
        )));
    }
    if let Some(first) = embeddings.first() {
        if let Some((i, e)) = embeddings.iter().enumerate().find(|(_, e)| e.len() != first.len()) {
            return Err(ProseError::Input(format!(
                "embedding {} has dimension {}, expected {}",
                i,
                e.len(),
                first.len()
            )));
        }
    }
    Ok(())
}

fn describe_coherence(score: f32, level: CoherenceLevel) -> String {
    match level {
        CoherenceLevel::Excellent => format!(
            "The text shows strong thematic coherence (score: {:.2}). Paragraphs flow naturally and maintain consistent focus.",
            score
        ),
        CoherenceLevel::Good => format!(
            "The text has good coherence (score: {:.2}). Most paragraphs connect well, with minor transitions needed.",
            score
        ),
        CoherenceLevel::Fair => format!(
            "The text has moderate coherence (score: {:.2}). Some paragraphs may benefit from better transitions or restructuring.",
            score
        ),
        CoherenceLevel::Poor => format!(
            "The text shows weak coherence (score: {:.2}). Paragraphs may be disconnected or cover unrelated topics.",
            score
        ),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit vector at cosine `s` from `[1, 0]`.
    fn at_similarity(s: f32) -> Vec<f32> {
        vec![s, (1.0 - s * s).sqrt()]
    }

    fn paragraphs(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Paragraph {}", i)).collect()
    }

    fn analyzer() -> ThematicAnalyzer {
        ThematicAnalyzer::default()
    }

    fn single_pair(similarity: f32) -> DriftAnalysis {
        analyzer()
            .compute_drift(
                &paragraphs(2),
                &[vec![1.0, 0.0], at_similarity(similarity)],
                0.4,
            )
            .unwrap()
    }

    #[test]
    fn test_severity_cutpoints() {
        assert_eq!(single_pair(0.19).drift_points[0].severity, Severity::High);
        assert_eq!(single_pair(0.25).drift_points[0].severity, Severity::Medium);
        assert_eq!(single_pair(0.35).drift_points[0].severity, Severity::Low);
        assert!(single_pair(0.41).drift_points.is_empty());
    }

    #[test]
    fn test_unrelated_paragraphs_drift_at_position_one() {
        let result = single_pair(0.15);
        assert!(result.drift_detected);
        assert_eq!(result.drift_points.len(), 1);
        let point = &result.drift_points[0];
        assert_eq!(point.position, 1);
        assert_eq!(point.severity, Severity::High);
        assert_eq!(point.paragraph_before, "Paragraph 0");
        assert_eq!(point.paragraph_after, "Paragraph 1");
        assert!((point.similarity_score - 0.15).abs() < 1e-5);
    }

    #[test]
    fn test_single_paragraph_reports_no_drift() {
        let result = analyzer()
            .compute_drift(&paragraphs(1), &[vec![1.0]], 0.4)
            .unwrap();
        assert!(!result.drift_detected);
        assert!(result.message.is_some());
        assert!(result.similarity_scores.is_empty());
    }

    #[test]
    fn test_single_paragraph_ignores_missing_embeddings() {
        let drift = analyzer().compute_drift(&paragraphs(1), &[], 0.4).unwrap();
        assert!(!drift.drift_detected);
        assert_eq!(drift.num_paragraphs, 1);

        let coherence = analyzer().compute_coherence(&paragraphs(1), &[]).unwrap();
        assert_eq!(coherence.coherence_level, CoherenceLevel::Excellent);
    }

    #[test]
    fn test_length_mismatch_is_input_error() {
        let err = analyzer()
            .compute_drift(&paragraphs(3), &[vec![1.0], vec![1.0]], 0.4)
            .unwrap_err();
        assert!(matches!(err, ProseError::Input(_)));
    }

    #[test]
    fn test_dimension_mismatch_is_input_error() {
        let err = analyzer()
            .compute_coherence(&paragraphs(2), &[vec![1.0, 0.0], vec![1.0]])
            .unwrap_err();
        assert!(matches!(err, ProseError::Input(_)));
    }

    #[test]
    fn test_similarity_sequence_in_index_order() {
        let embeddings = vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        let result = analyzer()
            .compute_drift(&paragraphs(3), &embeddings, 0.4)
            .unwrap();
        assert_eq!(result.similarity_scores, vec![1.0, 0.0]);
        assert_eq!(result.drift_points.len(), 1);
        assert_eq!(result.drift_points[0].position, 2);
        assert!((result.average_similarity - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_coherence_mean_over_pairs() {
        // sims: (0,1)=1, (0,2)=0, (1,2)=0 -> mean 1/3
        let embeddings = vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        let result = analyzer()
            .compute_coherence(&paragraphs(3), &embeddings)
            .unwrap();
        assert!((result.coherence_score - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(result.coherence_level, CoherenceLevel::Fair);
        assert_eq!(result.similarity_matrix[0][0], 0.0);
        assert_eq!(result.similarity_matrix[2][1], result.similarity_matrix[1][2]);
    }

    #[test]
    fn test_coherence_levels() {
        let a = analyzer();
        assert_eq!(a.level_for(0.71), CoherenceLevel::Excellent);
        assert_eq!(a.level_for(0.7), CoherenceLevel::Good);
        assert_eq!(a.level_for(0.51), CoherenceLevel::Good);
        assert_eq!(a.level_for(0.5), CoherenceLevel::Fair);
        assert_eq!(a.level_for(0.3), CoherenceLevel::Poor);
    }

    #[test]
    fn test_single_paragraph_is_trivially_coherent() {
        let result = analyzer()
            .compute_coherence(&paragraphs(1), &[vec![0.3, 0.2]])
            .unwrap();
        assert_eq!(result.coherence_score, 1.0);
        assert_eq!(result.coherence_level, CoherenceLevel::Excellent);
    }

    #[test]
    fn test_similar_pairs_ranked() {
        let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.9, 0.1]];
        let pairs = analyzer()
            .similar_pairs(&paragraphs(3), &embeddings, 2)
            .unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].paragraph_1_index, pairs[0].paragraph_2_index), (0, 2));
        assert!(pairs[0].similarity >= pairs[1].similarity);
    }

    #[test]
    fn test_search_similar() {
        let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let hits = analyzer()
            .search_similar(&[0.1, 0.9], &paragraphs(2), &embeddings, 5)
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].rank, 1);
        assert_eq!(hits[0].paragraph_index, 1);
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_short_documents_never_fail(n in 0usize..2, dim in 1usize..8) {
                let embeddings = vec![vec![0.5; dim]; n];
                let result = analyzer().compute_drift(&paragraphs(n), &embeddings, 0.4);
                prop_assert!(result.is_ok());
                prop_assert!(!result.unwrap().drift_detected);
            }

            #[test]
            fn prop_drift_points_match_cutpoints(
                sims in proptest::collection::vec(0.0f32..1.0, 1..12),
                threshold in 0.05f32..0.95,
            ) {
                let mut embeddings = vec![vec![1.0, 0.0]];
                // Alternate from the reference vector so each adjacent pair has the
                // requested similarity against [1, 0].
                for s in &sims {
                    embeddings.push(at_similarity(*s));
                    embeddings.push(vec![1.0, 0.0]);
                }
                let n = embeddings.len();
                let result = analyzer().compute_drift(&paragraphs(n), &embeddings, threshold).unwrap();

                prop_assert_eq!(result.similarity_scores.len(), n - 1);
                let a = analyzer();
                for point in &result.drift_points {
                    prop_assert!(point.similarity_score < threshold);
                    prop_assert_eq!(point.severity, a.severity_for(point.similarity_score));
                }
                let below = result.similarity_scores.iter().filter(|s| **s < threshold).count();
                prop_assert_eq!(result.drift_points.len(), below);
            }
        }
    }
}
