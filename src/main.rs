//! Proseflow - prose analysis engine
//!
//! Usage:
//!   proseflow analyze story.txt        Full analysis with suggestions
//!   proseflow quick -                  Plain-text digest of stdin
//!   proseflow graph story.txt          Knowledge graph and contradictions
//!   proseflow transform story.txt      Rewrite toward a formal tone
//!   proseflow --help                   Show all commands

use anyhow::Result;
use clap::Parser;

use proseflow::cli::output::OutputMode;
use proseflow::cli::Cli;
use proseflow::init::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Tracing to stderr so stdout stays clean for --json
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("proseflow=info".parse()?),
        )
        .init();

    let mode = OutputMode::from_json_flag(cli.json);
    let ctx = AppContext::new(cli.config.as_deref())?;

    proseflow::cli::execute(&cli.command, &ctx, mode).await?;

    Ok(())
}
