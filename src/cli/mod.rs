//! CLI interface for Proseflow.

pub mod handlers;
pub mod input;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::TargetTone;
use crate::pipeline::AnalysisOptions;
use output::OutputMode;

/// Proseflow - prose analysis: narrative consistency, thematic drift, tone and edit suggestions
#[derive(Parser)]
#[command(name = "proseflow", version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ./proseflow.toml, then ~/.config/proseflow/config.toml)
    #[arg(long, env = "PROSEFLOW_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Stage switches shared by `analyze` and `batch`.
#[derive(clap::Args, Debug, Clone)]
pub struct StageArgs {
    /// Skip knowledge graph and contradiction detection
    #[arg(long)]
    pub no_narrative: bool,
    /// Skip sentence structure and passive voice analysis
    #[arg(long)]
    pub no_structure: bool,
    /// Skip thematic drift and coherence
    #[arg(long)]
    pub no_theme: bool,
    /// Skip tone classification
    #[arg(long)]
    pub no_tone: bool,
    /// Skip suggestions and the quality summary
    #[arg(long)]
    pub no_suggestions: bool,
    /// Also run the style transformation
    #[arg(long)]
    pub transform: bool,
    /// Target tone for the style transformation (formal, informal)
    #[arg(long, default_value = "formal")]
    pub tone: TargetTone,
}

impl StageArgs {
    pub fn options(&self) -> AnalysisOptions {
        AnalysisOptions {
            analyze_narrative: !self.no_narrative,
            analyze_structure: !self.no_structure,
            analyze_theme: !self.no_theme,
            analyze_tone: !self.no_tone,
            suggest_enhancements: !self.no_suggestions,
            transform_style: self.transform,
            target_tone: self.tone,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Full analysis with suggestions and quality score
    Analyze {
        /// Input file, or - for stdin
        input: String,
        #[command(flatten)]
        stages: StageArgs,
        /// Also write the JSON report to this file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Export the knowledge graph (entities, relations, contradictions)
    Graph {
        /// Input file, or - for stdin
        input: String,
    },

    /// Short plain-text digest of the analysis
    Quick {
        /// Input file, or - for stdin
        input: String,
    },

    /// Rewrite text toward a target tone and show the word diff
    Transform {
        /// Input file, or - for stdin
        input: String,
        /// Target tone (formal, informal)
        #[arg(long, default_value = "formal")]
        tone: TargetTone,
    },

    /// Most similar paragraph pairs, or paragraphs matching a query
    Similar {
        /// Input file, or - for stdin
        input: String,
        /// Rank paragraphs against this query instead of pairing them (repeatable)
        #[arg(long)]
        query: Vec<String>,
        /// Number of results
        #[arg(long, default_value = "5")]
        top_k: usize,
    },

    /// Analyze several files concurrently
    Batch {
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        stages: StageArgs,
        /// Write the JSON batch report to this file
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// Execute a CLI command.
pub async fn execute(
    command: &Commands,
    ctx: &crate::init::AppContext,
    mode: OutputMode,
) -> anyhow::Result<()> {
    match command {
        Commands::Analyze {
            input,
            stages,
            output,
        } => {
            handlers::analyze::handle_analyze(ctx, input, stages.options(), output.as_deref(), mode)
                .await?
        }
        Commands::Graph { input } => handlers::graph::handle_graph(ctx, input, mode).await?,
        Commands::Quick { input } => handlers::analyze::handle_quick(ctx, input, mode).await?,
        Commands::Transform { input, tone } => {
            handlers::transform::handle_transform(ctx, input, *tone, mode).await?
        }
        Commands::Similar {
            input,
            query,
            top_k,
        } => handlers::graph::handle_similar(ctx, input, query, *top_k, mode).await?,
        Commands::Batch {
            files,
            stages,
            output,
        } => {
            handlers::batch::handle_batch(ctx, files, stages.options(), output.as_deref(), mode)
                .await?
        }
    }
    Ok(())
}
