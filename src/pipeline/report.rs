//! Request options and the assembled analysis report.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

use crate::graph::{Contradiction, ExtractionStats, GraphExport, GraphStats};
use crate::models::{
    QualitySummary, StyleTransformation, Suggestion, TargetTone, ToneAnalysis, ToneFeatures,
};
use crate::pipeline::stage::StageResult;
use crate::services::diff::DiffEntry;
use crate::services::drift::{CoherenceAnalysis, DriftAnalysis};
use crate::services::structure::{PassiveConversion, StructureAnalysis};
use crate::ProseError;

/// Which stages a request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub analyze_narrative: bool,
    pub analyze_structure: bool,
    pub analyze_theme: bool,
    pub analyze_tone: bool,
    pub suggest_enhancements: bool,
    pub transform_style: bool,
    pub target_tone: TargetTone,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            analyze_narrative: true,
            analyze_structure: true,
            analyze_theme: true,
            analyze_tone: true,
            suggest_enhancements: true,
            transform_style: false,
            target_tone: TargetTone::Formal,
        }
    }
}

/// Output of the narrative stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeAnalysis {
    pub graph: GraphExport,
    pub stats: GraphStats,
    pub extraction: ExtractionStats,
    pub contradictions: Vec<Contradiction>,
}

/// Everything one request produced. Stages that were not requested are
/// omitted; stages that failed carry `{"error": ...}`.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub request_id: Uuid,
    /// Input length in characters
    pub input_length: usize,
    pub options: AnalysisOptions,
    pub narrative: Option<StageResult<NarrativeAnalysis>>,
    pub structure: Option<StageResult<StructureAnalysis>>,
    pub passive_voice: Option<StageResult<Vec<PassiveConversion>>>,
    pub thematic_drift: Option<StageResult<DriftAnalysis>>,
    pub coherence: Option<StageResult<CoherenceAnalysis>>,
    pub tone: Option<StageResult<ToneAnalysis>>,
    pub tone_features: Option<StageResult<ToneFeatures>>,
    pub style_transformation: Option<StageResult<StyleTransformation>>,
    pub diff: Option<StageResult<Vec<DiffEntry>>>,
    pub suggestions: Option<StageResult<Vec<Suggestion>>>,
    pub summary: Option<StageResult<QualitySummary>>,
    /// Wall-clock seconds
    pub processing_time: f64,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub(crate) fn empty(request_id: Uuid, input_length: usize, options: AnalysisOptions) -> Self {
        Self {
            request_id,
            input_length,
            options,
            narrative: None,
            structure: None,
            passive_voice: None,
            thematic_drift: None,
            coherence: None,
            tone: None,
            tone_features: None,
            style_transformation: None,
            diff: None,
            suggestions: None,
            summary: None,
            processing_time: 0.0,
            generated_at: Utc::now(),
        }
    }

    /// Names and messages of every failed stage slot.
    pub fn failures(&self) -> Vec<(&'static str, &str)> {
        let slots: [(&'static str, Option<&str>); 11] = [
            ("narrative", self.narrative.as_ref().and_then(|s| s.error())),
            ("structure", self.structure.as_ref().and_then(|s| s.error())),
            ("passive_voice", self.passive_voice.as_ref().and_then(|s| s.error())),
            ("thematic_drift", self.thematic_drift.as_ref().and_then(|s| s.error())),
            ("coherence", self.coherence.as_ref().and_then(|s| s.error())),
            ("tone", self.tone.as_ref().and_then(|s| s.error())),
            ("tone_features", self.tone_features.as_ref().and_then(|s| s.error())),
            (
                "style_transformation",
                self.style_transformation.as_ref().and_then(|s| s.error()),
            ),
            ("diff", self.diff.as_ref().and_then(|s| s.error())),
            ("suggestions", self.suggestions.as_ref().and_then(|s| s.error())),
            ("summary", self.summary.as_ref().and_then(|s| s.error())),
        ];
        slots
            .into_iter()
            .filter_map(|(name, error)| error.map(|e| (name, e)))
            .collect()
    }

    pub fn to_json(&self) -> Result<String, ProseError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the pretty-printed JSON report to `path`.
    pub fn export(&self, path: &Path) -> Result<(), ProseError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// One entry of a batch run, in input order.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub index: usize,
    pub report: Option<AnalysisReport>,
    pub error: Option<String>,
}

/// Summary of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub total_processed: usize,
    pub successes: usize,
    pub errors: usize,
    pub results: Vec<BatchItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_options() {
        let options = AnalysisOptions::default();
        assert!(options.analyze_narrative && options.suggest_enhancements);
        assert!(!options.transform_style);
        assert_eq!(options.target_tone, TargetTone::Formal);
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: AnalysisOptions =
            serde_json::from_str(r#"{"transform_style": true, "target_tone": "informal"}"#)
                .unwrap();
        assert!(options.transform_style);
        assert!(options.analyze_theme);
        assert_eq!(options.target_tone, TargetTone::Informal);
    }

    #[test]
    fn test_unrequested_stages_are_omitted() {
        let report = AnalysisReport::empty(Uuid::new_v4(), 12, AnalysisOptions::default());
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("narrative").is_none());
        assert!(value.get("suggestions").is_none());
        assert_eq!(value["input_length"], 12);
    }

    #[test]
    fn test_failures_lists_error_slots() {
        let mut report = AnalysisReport::empty(Uuid::new_v4(), 12, AnalysisOptions::default());
        report.tone = Some(StageResult::failed("classifier offline"));
        report.structure = Some(StageResult::Ok(StructureAnalysis {
            num_sentences: 1,
            avg_sentence_length: 4.0,
            min_sentence_length: 4,
            max_sentence_length: 4,
            passive_voice_count: 0,
            complexity_score: 1.0,
        }));
        assert_eq!(report.failures(), vec![("tone", "classifier offline")]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["tone"]["error"], "classifier offline");
    }

    #[test]
    fn test_export_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = AnalysisReport::empty(Uuid::new_v4(), 5, AnalysisOptions::default());
        report.export(&path).unwrap();
        let parsed: AnalysisReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.request_id, report.request_id);
    }
}
