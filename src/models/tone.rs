//! Tone classification output.

use serde::{Deserialize, Serialize};

/// Coarse tone bucket derived from the formality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneLabel {
    VeryFormal,
    Formal,
    Neutral,
    Informal,
    VeryInformal,
}

impl ToneLabel {
    /// Bucket a formality score in `[0, 1]`.
    pub fn from_formality(score: f32) -> Self {
        if score > 0.7 {
            ToneLabel::VeryFormal
        } else if score > 0.55 {
            ToneLabel::Formal
        } else if score > 0.45 {
            ToneLabel::Neutral
        } else if score > 0.3 {
            ToneLabel::Informal
        } else {
            ToneLabel::VeryInformal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ToneLabel::VeryFormal => "very_formal",
            ToneLabel::Formal => "formal",
            ToneLabel::Neutral => "neutral",
            ToneLabel::Informal => "informal",
            ToneLabel::VeryInformal => "very_informal",
        }
    }
}

impl std::fmt::Display for ToneLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of tone classification for a whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneAnalysis {
    pub tone: ToneLabel,
    /// 0.0 = very informal, 1.0 = very formal
    pub formality_score: f32,
    pub confidence: f32,
    pub is_formal: bool,
}

/// Per-word contribution to the formality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordWeight {
    pub word: String,
    /// Positive pushes toward formal, negative toward informal
    pub weight: f32,
}

/// Word-level attribution for the tone decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToneFeatures {
    /// Up to 20 words sorted by absolute weight
    pub word_importance: Vec<WordWeight>,
    pub top_formal_words: Vec<WordWeight>,
    pub top_informal_words: Vec<WordWeight>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_buckets() {
        assert_eq!(ToneLabel::from_formality(0.9), ToneLabel::VeryFormal);
        assert_eq!(ToneLabel::from_formality(0.7), ToneLabel::Formal);
        assert_eq!(ToneLabel::from_formality(0.5), ToneLabel::Neutral);
        assert_eq!(ToneLabel::from_formality(0.45), ToneLabel::Informal);
        assert_eq!(ToneLabel::from_formality(0.3), ToneLabel::VeryInformal);
        assert_eq!(ToneLabel::from_formality(0.0), ToneLabel::VeryInformal);
    }

    #[test]
    fn test_label_serializes_snake_case() {
        let json = serde_json::to_string(&ToneLabel::VeryInformal).expect("serialize");
        assert_eq!(json, "\"very_informal\"");
    }
}
