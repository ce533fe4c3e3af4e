pub mod annotation;
pub mod diff;
pub mod drift;
pub mod embedding;
pub mod progress;
pub mod structure;
pub mod style;
pub mod suggestion;
pub mod tone;

pub use annotation::{annotate_text, AnnotationService, HeuristicAnnotator, NoopAnnotationService};
pub use diff::{diff_runs, word_diff, DiffEntry, DiffKind};
pub use drift::{
    CoherenceAnalysis, CoherenceLevel, DriftAnalysis, DriftPoint, SearchHit, SimilarPair,
    ThematicAnalyzer,
};
pub use embedding::{EmbeddingCache, EmbeddingService, HashingEmbedder, NoopEmbeddingService};
pub use progress::{noop_progress, NoopProgressReporter, ProgressReporter, TracingProgressReporter};
pub use structure::{
    analyze_structure, convert_passive, detect_passive, passive_conversions, PassiveConversion,
    PassiveSentence, StructureAnalysis,
};
pub use style::{LexiconSubstituter, NoopSubstitutionService, SubstitutionService};
pub use suggestion::{render_quick_summary, SignalBag, SuggestionAggregator};
pub use tone::{formality_score, LexiconToneClassifier, NoopToneService, ToneService};
