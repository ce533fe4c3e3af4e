//! Request orchestration: stage sequencing, failure isolation and report
//! assembly.

pub mod orchestrator;
pub mod report;
pub mod stage;

pub use orchestrator::Pipeline;
pub use report::{AnalysisOptions, AnalysisReport, BatchItem, BatchReport, NarrativeAnalysis};
pub use stage::{Stage, StageResult};
