pub mod builders;
pub mod fakes;

// Re-export commonly used test utilities
pub use builders::{PipelineBuilder, TWO_TOPICS};
pub use fakes::{
    CountingEmbedder, FailingToneService, FixedAnnotator, FixedEmbedder, FixedToneService,
    SlowEmbedder,
};
