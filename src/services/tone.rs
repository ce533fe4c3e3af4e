//! Tone classification service.
//!
//! [`LexiconToneClassifier`] scores formality from indicator lexicons,
//! contractions and average word length, and attributes the decision to
//! individual words.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::models::{ToneAnalysis, ToneFeatures, ToneLabel, WordWeight};
use crate::ProseError;

/// Service trait for tone classification.
#[async_trait]
pub trait ToneService: Send + Sync {
    /// Classify the tone of a whole text.
    async fn classify(&self, text: &str) -> Result<ToneAnalysis, ProseError>;

    /// Word-level attribution for the classification.
    async fn feature_importance(&self, text: &str) -> Result<ToneFeatures, ProseError>;

    /// Whether the classifier is loaded and available.
    fn is_available(&self) -> bool;
}

const FORMAL_INDICATORS: &[&str] = &[
    "furthermore", "moreover", "consequently", "therefore", "thus", "hereby", "wherein",
    "pursuant", "regarding", "respectively", "subsequently", "accordingly", "aforementioned",
    "nevertheless", "notwithstanding", "whereas", "demonstrate", "utilize", "commence",
    "numerous", "substantial", "essentially", "obtain", "purchase", "assist",
];

const INFORMAL_INDICATORS: &[&str] = &[
    "gonna", "wanna", "yeah", "nah", "cool", "awesome", "basically", "stuff", "things", "kinda",
    "sorta", "dunno", "gotta", "super", "pretty", "lol", "ok", "okay", "hey", "guys",
];

const INDICATOR_WEIGHT: f32 = 0.35;
const LENGTH_WEIGHT: f32 = 0.15;
/// Average word length treated as neutral.
const NEUTRAL_WORD_LENGTH: f32 = 4.5;

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'' && c != '’')
        .map(|w| w.trim_matches(|c| c == '\'' || c == '’').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn is_contraction(word: &str) -> bool {
    word.contains('\'') || word.contains('’')
}

/// Signed contribution of a single word.
fn word_weight(word: &str) -> f32 {
    if FORMAL_INDICATORS.contains(&word) {
        1.0
    } else if INFORMAL_INDICATORS.contains(&word) {
        -1.0
    } else if is_contraction(word) {
        -0.5
    } else if word.chars().count() >= 10 {
        0.25
    } else {
        0.0
    }
}

/// Formality in `[0, 1]`; 0.5 for text with no signal.
pub fn formality_score(text: &str) -> f32 {
    let words = words(text);
    if words.is_empty() {
        return 0.5;
    }

    let formal = words.iter().filter(|w| FORMAL_INDICATORS.contains(&w.as_str())).count();
    let informal = words
        .iter()
        .filter(|w| INFORMAL_INDICATORS.contains(&w.as_str()) || is_contraction(w))
        .count();

    let indicators = (formal + informal) as f32;
    let balance = if indicators > 0.0 {
        (formal as f32 - informal as f32) / indicators
    } else {
        0.0
    };
    let density = (indicators * 10.0 / words.len() as f32).min(1.0);

    let avg_len =
        words.iter().map(|w| w.chars().count()).sum::<usize>() as f32 / words.len() as f32;
    let length_signal = ((avg_len - NEUTRAL_WORD_LENGTH) / 3.0).clamp(-1.0, 1.0);

    (0.5 + INDICATOR_WEIGHT * balance * density + LENGTH_WEIGHT * length_signal).clamp(0.0, 1.0)
}

/// Lexicon-based formality classifier. Always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconToneClassifier;

impl LexiconToneClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify_text(&self, text: &str) -> ToneAnalysis {
        let score = formality_score(text);
        ToneAnalysis {
            tone: ToneLabel::from_formality(score),
            formality_score: score,
            confidence: score.max(1.0 - score),
            is_formal: score >= 0.5,
        }
    }

    pub fn features(&self, text: &str) -> ToneFeatures {
        let weights: BTreeMap<String, f32> = words(text)
            .into_iter()
            .filter_map(|w| {
                let weight = word_weight(&w);
                (weight != 0.0).then_some((w, weight))
            })
            .collect();

        let mut ranked: Vec<WordWeight> = weights
            .into_iter()
            .map(|(word, weight)| WordWeight { word, weight })
            .collect();
        // Stable sort keeps alphabetical order among equal weights.
        ranked.sort_by(|a, b| {
            b.weight
                .abs()
                .partial_cmp(&a.weight.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        ToneFeatures {
            top_formal_words: ranked.iter().filter(|w| w.weight > 0.0).take(10).cloned().collect(),
            top_informal_words: ranked.iter().filter(|w| w.weight < 0.0).take(10).cloned().collect(),
            word_importance: ranked.into_iter().take(20).collect(),
        }
    }
}

#[async_trait]
impl ToneService for LexiconToneClassifier {
    async fn classify(&self, text: &str) -> Result<ToneAnalysis, ProseError> {
        Ok(self.classify_text(text))
    }

    async fn feature_importance(&self, text: &str) -> Result<ToneFeatures, ProseError> {
        Ok(self.features(text))
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// No-op tone service for degraded mode and tests.
pub struct NoopToneService;

impl Default for NoopToneService {
    fn default() -> Self {
        Self::new()
    }
}

impl NoopToneService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToneService for NoopToneService {
    async fn classify(&self, _text: &str) -> Result<ToneAnalysis, ProseError> {
        Err(ProseError::ServiceUnavailable(
            "Tone service is not available (noop)".to_string(),
        ))
    }

    async fn feature_importance(&self, _text: &str) -> Result<ToneFeatures, ProseError> {
        Err(ProseError::ServiceUnavailable(
            "Tone service is not available (noop)".to_string(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }
}

// ============================================================================
// Tests
// ============================================================================
