pub mod annotation;
pub mod style;
pub mod suggestion;
pub mod tone;

pub use annotation::{
    DocumentAnnotation, EntityAnnotation, Mention, RelationCandidate, SentenceAnnotation,
    TokenAnnotation,
};
pub use style::{StyleTransformation, Substitution, TargetTone};
pub use suggestion::{
    Assessment, QualitySummary, Severity, SeverityBreakdown, Suggestion, SuggestionKind,
};
pub use tone::{ToneAnalysis, ToneFeatures, ToneLabel, WordWeight};
