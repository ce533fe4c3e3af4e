//! Suggestion aggregation and quality scoring.
//!
//! [`SuggestionAggregator::aggregate`] turns whatever analysis signals a
//! request produced into a severity-ordered suggestion list and a
//! [`QualitySummary`]. Each category is evaluated independently, in a fixed
//! order; a missing signal simply contributes nothing.

use tracing::debug;

use crate::config::{DriftConfig, ScoringConfig};
use crate::graph::Contradiction;
use crate::models::{
    Assessment, QualitySummary, Severity, SeverityBreakdown, Suggestion, SuggestionKind,
    ToneAnalysis,
};
use crate::services::drift::{CoherenceAnalysis, CoherenceLevel, DriftAnalysis};
use crate::services::structure::{PassiveConversion, StructureAnalysis};
use crate::utils::text::excerpt;
use crate::ProseError;

/// Formality below this is flagged as too informal.
const TOO_INFORMAL_BELOW: f32 = 0.3;
/// Formality above this is flagged as too formal.
const TOO_FORMAL_ABOVE: f32 = 0.8;
/// Average sentence length (tokens) above which sentences count as long.
const LONG_SENTENCE_TOKENS: f64 = 30.0;
/// Average sentence length (tokens) below which sentences count as short.
const SHORT_SENTENCE_TOKENS: f64 = 10.0;
/// Tone confidence above which the tone counts as consistent.
const CONSISTENT_TONE_CONFIDENCE: f32 = 0.8;
const PRIORITY_ACTIONS: usize = 3;
const QUICK_SUMMARY_SUGGESTIONS: usize = 5;

/// Analysis outputs available to the aggregator. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct SignalBag {
    pub thematic_drift: Option<DriftAnalysis>,
    pub contradictions: Option<Vec<Contradiction>>,
    pub passive_conversions: Option<Vec<PassiveConversion>>,
    pub tone: Option<ToneAnalysis>,
    pub coherence: Option<CoherenceAnalysis>,
    pub structure: Option<StructureAnalysis>,
}

impl SignalBag {
    /// Reject signals that no stage should ever produce.
    pub fn validate(&self) -> Result<(), ProseError> {
        if let Some(drift) = &self.thematic_drift {
            if let Some(point) = drift.drift_points.iter().find(|p| !p.similarity_score.is_finite()) {
                return Err(ProseError::Aggregation(format!(
                    "drift point at position {} has non-finite similarity",
                    point.position
                )));
            }
        }
        if let Some(contradictions) = &self.contradictions {
            if let Some(c) = contradictions.iter().find(|c| c.objects.len() < 2) {
                return Err(ProseError::Aggregation(format!(
                    "contradiction for {} / {} lists fewer than two objects",
                    c.entity, c.predicate
                )));
            }
        }
        if let Some(tone) = &self.tone {
            if !tone.formality_score.is_finite() {
                return Err(ProseError::Aggregation(
                    "tone formality score is not finite".to_string(),
                ));
            }
        }
        if let Some(coherence) = &self.coherence {
            if !coherence.coherence_score.is_finite() {
                return Err(ProseError::Aggregation(
                    "coherence score is not finite".to_string(),
                ));
            }
        }
        if let Some(structure) = &self.structure {
            if !structure.avg_sentence_length.is_finite() {
                return Err(ProseError::Aggregation(
                    "average sentence length is not finite".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn drift_message(severity: Severity, position: usize) -> String {
    match severity {
        Severity::High => format!(
            "Strong narrative drift detected. Consider adding transitional sentences to connect paragraph {} with the previous content.",
            position
        ),
        Severity::Medium => format!(
            "Moderate topic shift in paragraph {}. A brief transition could improve flow.",
            position
        ),
        Severity::Low => format!(
            "Minor topic shift detected in paragraph {}. Flow is acceptable but could be smoother.",
            position
        ),
    }
}

fn to_details<T: serde::Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_default()
}

/// Builds suggestions and the quality summary from a [`SignalBag`].
#[derive(Debug, Clone)]
pub struct SuggestionAggregator {
    scoring: ScoringConfig,
    excerpt_chars: usize,
}

impl SuggestionAggregator {
    pub fn new(scoring: ScoringConfig, drift: &DriftConfig) -> Self {
        Self {
            scoring,
            excerpt_chars: drift.excerpt_chars,
        }
    }

    /// Validate the signals, then build suggestions and the summary.
    pub fn aggregate(
        &self,
        signals: &SignalBag,
    ) -> Result<(Vec<Suggestion>, QualitySummary), ProseError> {
        signals.validate()?;
        let suggestions = self.suggestions(signals);
        let summary = self.summarize(signals, &suggestions);
        debug!(
            suggestions = suggestions.len(),
            score = summary.quality_score,
            "Aggregated suggestions"
        );
        Ok((suggestions, summary))
    }

    /// Suggestions from every category, stably sorted by severity.
    pub fn suggestions(&self, signals: &SignalBag) -> Vec<Suggestion> {
        let mut out = Vec::new();

        if let Some(drift) = &signals.thematic_drift {
            for point in &drift.drift_points {
                out.push(
                    Suggestion::new(
                        SuggestionKind::NarrativeDrift,
                        point.severity,
                        point.severity.as_str(),
                        drift_message(point.severity, point.position),
                    )
                    .with_position(point.position)
                    .with_score(f64::from(point.similarity_score))
                    .with_details(serde_json::json!({
                        "paragraph_before": excerpt(&point.paragraph_before, self.excerpt_chars),
                        "paragraph_after": excerpt(&point.paragraph_after, self.excerpt_chars),
                    })),
                );
            }
        }

        if let Some(conversions) = &signals.passive_conversions {
            for conversion in conversions.iter().filter(|c| c.conversion_made) {
                out.push(
                    Suggestion::new(
                        SuggestionKind::PassiveVoice,
                        Severity::Medium,
                        "passive_voice",
                        format!(
                            "Change '{}' to '{}'",
                            conversion.original, conversion.converted
                        ),
                    )
                    .with_position(conversion.start)
                    .with_details(to_details(conversion)),
                );
            }
        }

        if let Some(tone) = &signals.tone {
            let fired = if tone.formality_score < TOO_INFORMAL_BELOW {
                Some((
                    Severity::Medium,
                    "too_informal",
                    "Text contains informal language. Consider making it more formal for professional contexts.",
                ))
            } else if tone.formality_score > TOO_FORMAL_ABOVE {
                Some((
                    Severity::Low,
                    "too_formal",
                    "Text may be overly formal. Consider using simpler language for better readability.",
                ))
            } else {
                None
            };
            if let Some((severity, key, message)) = fired {
                out.push(
                    Suggestion::new(SuggestionKind::Formality, severity, key, message)
                        .with_score(f64::from(tone.formality_score))
                        .with_details(to_details(tone)),
                );
            }
        }

        if let Some(coherence) = &signals.coherence {
            let fired = match coherence.coherence_level {
                CoherenceLevel::Fair => Some((
                    Severity::Medium,
                    "Moderate coherence. Several paragraphs could benefit from better connections.",
                )),
                CoherenceLevel::Poor => Some((
                    Severity::High,
                    "Weak coherence detected. Significant restructuring recommended.",
                )),
                CoherenceLevel::Good | CoherenceLevel::Excellent => None,
            };
            if let Some((severity, message)) = fired {
                out.push(
                    Suggestion::new(
                        SuggestionKind::Coherence,
                        severity,
                        coherence.coherence_level.as_str(),
                        message,
                    )
                    .with_score(f64::from(coherence.coherence_score))
                    .with_details(serde_json::json!({
                        "coherence_score": coherence.coherence_score,
                        "coherence_level": coherence.coherence_level,
                        "paragraph_count": coherence.paragraph_count,
                        "analysis": coherence.analysis,
                    })),
                );
            }
        }

        if let Some(structure) = signals.structure.as_ref().filter(|s| s.num_sentences > 0) {
            let avg = structure.avg_sentence_length;
            let fired = if avg > LONG_SENTENCE_TOKENS {
                Some((
                    Severity::Medium,
                    "long_sentences",
                    "Some sentences are very long. Consider breaking them into shorter, clearer statements.",
                ))
            } else if avg < SHORT_SENTENCE_TOKENS {
                Some((
                    Severity::Low,
                    "short_sentences",
                    "Many short sentences detected. Consider combining related ideas for better flow.",
                ))
            } else {
                None
            };
            if let Some((severity, key, message)) = fired {
                out.push(
                    Suggestion::new(SuggestionKind::Structure, severity, key, message)
                        .with_score(avg)
                        .with_details(to_details(structure)),
                );
            }
        }

        if let Some(contradictions) = &signals.contradictions {
            for contradiction in contradictions {
                out.push(
                    Suggestion::new(
                        SuggestionKind::Contradiction,
                        contradiction.severity,
                        "conflicting_info",
                        format!(
                            "Potential contradiction detected: {} has conflicting {}. Review for consistency.",
                            contradiction.entity, contradiction.predicate
                        ),
                    )
                    .with_details(to_details(contradiction)),
                );
            }
        }

        // Stable: equal severities keep category evaluation order.
        out.sort_by_key(|s| s.severity().rank());
        out
    }

    /// Penalty-based score in `[0, 100]`.
    pub fn quality_score(&self, suggestions: &[Suggestion]) -> u32 {
        let counts = SeverityBreakdown::from_suggestions(suggestions);
        let penalty = counts.high as u64 * u64::from(self.scoring.high_penalty)
            + counts.medium as u64 * u64::from(self.scoring.medium_penalty)
            + counts.low as u64 * u64::from(self.scoring.low_penalty);
        100_u64.saturating_sub(penalty) as u32
    }

    pub fn summarize(&self, signals: &SignalBag, suggestions: &[Suggestion]) -> QualitySummary {
        let quality_score = self.quality_score(suggestions);
        QualitySummary {
            quality_score,
            assessment: Assessment::from_score(quality_score),
            total_suggestions: suggestions.len(),
            severity_breakdown: SeverityBreakdown::from_suggestions(suggestions),
            key_strengths: strengths(signals),
            key_weaknesses: weaknesses(suggestions),
            priority_actions: suggestions.iter().take(PRIORITY_ACTIONS).cloned().collect(),
        }
    }
}

impl Default for SuggestionAggregator {
    fn default() -> Self {
        Self::new(ScoringConfig::default(), &DriftConfig::default())
    }
}

fn strengths(signals: &SignalBag) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(coherence) = &signals.coherence {
        if matches!(
            coherence.coherence_level,
            CoherenceLevel::Excellent | CoherenceLevel::Good
        ) {
            out.push(format!(
                "Strong thematic coherence ({})",
                coherence.coherence_level
            ));
        }
    }
    if let Some(tone) = &signals.tone {
        if tone.confidence > CONSISTENT_TONE_CONFIDENCE {
            out.push("Consistent tone throughout".to_string());
        }
    }
    if let Some(structure) = &signals.structure {
        if structure.passive_voice_count == 0 {
            out.push("Active voice used effectively".to_string());
        }
    }
    if out.is_empty() {
        out.push("Text structure is functional".to_string());
    }
    out
}

fn weaknesses(suggestions: &[Suggestion]) -> Vec<String> {
    let count = |kind: SuggestionKind| suggestions.iter().filter(|s| s.kind() == kind).count();

    let mut out = Vec::new();
    let drift = count(SuggestionKind::NarrativeDrift);
    if drift >= 2 {
        out.push(format!("Multiple narrative drift points ({})", drift));
    }
    let passive = count(SuggestionKind::PassiveVoice);
    if passive >= 3 {
        out.push(format!("Frequent passive voice usage ({} instances)", passive));
    }
    let contradictions = count(SuggestionKind::Contradiction);
    if contradictions > 0 {
        out.push(format!(
            "Potential contradictions detected ({})",
            contradictions
        ));
    }
    if out.is_empty() {
        out.push("Minor areas for improvement".to_string());
    }
    out
}

/// Plain-text digest: score, assessment, strengths, weaknesses and the top
/// suggestions.
pub fn render_quick_summary(summary: &QualitySummary, suggestions: &[Suggestion]) -> String {
    let bullets = |items: &[String]| {
        items
            .iter()
            .map(|s| format!("  • {}", s))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let top = suggestions
        .iter()
        .take(QUICK_SUMMARY_SUGGESTIONS)
        .enumerate()
        .map(|(i, s)| {
            format!(
                "  {}. [{}] {}",
                i + 1,
                s.severity().as_str().to_uppercase(),
                s.message()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "=== PROSEFLOW ANALYSIS ===\n\n\
         Quality Score: {}/100\n\
         Assessment: {}\n\n\
         Strengths:\n{}\n\n\
         Areas for Improvement:\n{}\n\n\
         Top Suggestions:\n{}\n",
        summary.quality_score,
        summary.assessment.as_str().to_uppercase(),
        bullets(&summary.key_strengths),
        bullets(&summary.key_weaknesses),
        top
    )
}

// ============================================================================
// Tests
// ============================================================================
