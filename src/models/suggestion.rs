//! Suggestion and quality summary types.

use serde::{Deserialize, Serialize};

// ============================================================================
// Severity
// ============================================================================

/// Three-level priority attached to every suggestion and drift point.
///
/// Ordered by rank: High (0) < Medium (1) < Low (2), so an ascending sort
/// puts the most urgent items first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn rank(&self) -> u8 {
        match self {
            Severity::High => 0,
            Severity::Medium => 1,
            Severity::Low => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Suggestion
// ============================================================================

/// Suggestion categories, listed in the order the aggregator evaluates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    NarrativeDrift,
    PassiveVoice,
    Formality,
    Coherence,
    Structure,
    Contradiction,
}

impl SuggestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::NarrativeDrift => "narrative_drift",
            SuggestionKind::PassiveVoice => "passive_voice",
            SuggestionKind::Formality => "formality",
            SuggestionKind::Coherence => "coherence",
            SuggestionKind::Structure => "structure",
            SuggestionKind::Contradiction => "contradiction",
        }
    }
}

impl std::fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An actionable edit suggestion.
///
/// Immutable once built: fields are private and there are no setters, so the
/// aggregator can only reorder suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    kind: SuggestionKind,
    severity: Severity,
    /// Stable message identifier, e.g. `too_informal`
    key: String,
    /// Human-readable message
    suggestion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    /// Opaque payload for traceability
    #[serde(default)]
    details: serde_json::Value,
}

impl Suggestion {
    pub fn new(
        kind: SuggestionKind,
        severity: Severity,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            key: key.into(),
            suggestion: message.into(),
            position: None,
            score: None,
            details: serde_json::Value::Null,
        }
    }

    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn kind(&self) -> SuggestionKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn message(&self) -> &str {
        &self.suggestion
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn score(&self) -> Option<f64> {
        self.score
    }

    pub fn details(&self) -> &serde_json::Value {
        &self.details
    }
}

// ============================================================================
// Quality Summary
// ============================================================================

/// Overall assessment bucket for the quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl Assessment {
    /// `>=85 excellent`, `>=70 good`, `>=50 fair`, else `needs_improvement`.
    pub fn from_score(score: u32) -> Self {
        if score >= 85 {
            Assessment::Excellent
        } else if score >= 70 {
            Assessment::Good
        } else if score >= 50 {
            Assessment::Fair
        } else {
            Assessment::NeedsImprovement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Assessment::Excellent => "excellent",
            Assessment::Good => "good",
            Assessment::Fair => "fair",
            Assessment::NeedsImprovement => "needs_improvement",
        }
    }
}

impl std::fmt::Display for Assessment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Count of suggestions per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityBreakdown {
    pub fn from_suggestions(suggestions: &[Suggestion]) -> Self {
        let mut counts = Self::default();
        for s in suggestions {
            match s.severity() {
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Per-request quality digest computed from the suggestion list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    /// 0 to 100
    pub quality_score: u32,
    pub assessment: Assessment,
    pub total_suggestions: usize,
    pub severity_breakdown: SeverityBreakdown,
    pub key_strengths: Vec<String>,
    pub key_weaknesses: Vec<String>,
    /// The first three suggestions after ordering
    pub priority_actions: Vec<Suggestion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_rank_order() {
        assert!(Severity::High < Severity::Medium);
        assert!(Severity::Medium < Severity::Low);
        assert_eq!(Severity::High.rank(), 0);
        assert_eq!(Severity::Low.rank(), 2);
    }

    #[test]
    fn test_assessment_cutpoints() {
        assert_eq!(Assessment::from_score(100), Assessment::Excellent);
        assert_eq!(Assessment::from_score(85), Assessment::Excellent);
        assert_eq!(Assessment::from_score(84), Assessment::Good);
        assert_eq!(Assessment::from_score(70), Assessment::Good);
        assert_eq!(Assessment::from_score(69), Assessment::Fair);
        assert_eq!(Assessment::from_score(50), Assessment::Fair);
        assert_eq!(Assessment::from_score(49), Assessment::NeedsImprovement);
        assert_eq!(Assessment::from_score(0), Assessment::NeedsImprovement);
    }

    #[test]
    fn test_suggestion_serializes_type_field() {
        let s = Suggestion::new(
            SuggestionKind::Formality,
            Severity::Medium,
            "too_informal",
            "Text contains informal language.",
        )
        .with_score(0.25);
        let json = serde_json::to_value(&s).expect("serialize");
        assert_eq!(json["type"], "formality");
        assert_eq!(json["severity"], "medium");
        assert_eq!(json["key"], "too_informal");
        assert!(json.get("position").is_none());
    }

    #[test]
    fn test_breakdown_counts() {
        let suggestions = vec![
            Suggestion::new(SuggestionKind::Coherence, Severity::High, "poor", "x"),
            Suggestion::new(SuggestionKind::Structure, Severity::Low, "short_sentences", "y"),
            Suggestion::new(SuggestionKind::Structure, Severity::Low, "short_sentences", "z"),
        ];
        let b = SeverityBreakdown::from_suggestions(&suggestions);
        assert_eq!(b.high, 1);
        assert_eq!(b.medium, 0);
        assert_eq!(b.low, 2);
        assert_eq!(b.total(), 3);
    }
}
