//! Progress reporting for batch analysis.
//!
//! The pipeline reports one step per finished document. The CLI logs
//! progress through [`TracingProgressReporter`]; library callers and tests
//! use [`NoopProgressReporter`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

/// Reports progress for long-running operations.
///
/// `current` goes from 0.0 to `total` (usually 1.0).
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// Report progress. Never fails the caller.
    async fn report(&self, current: f64, total: f64, message: Option<String>);

    /// Report a step out of N total steps.
    async fn step(&self, step: usize, total_steps: usize, message: &str) {
        let current = if total_steps == 0 {
            1.0
        } else {
            step as f64 / total_steps as f64
        };
        self.report(current, 1.0, Some(message.to_string())).await;
    }
}

pub struct NoopProgressReporter;

#[async_trait]
impl ProgressReporter for NoopProgressReporter {
    async fn report(&self, _current: f64, _total: f64, _message: Option<String>) {}
}

/// Logs each update at `info`.
pub struct TracingProgressReporter;

#[async_trait]
impl ProgressReporter for TracingProgressReporter {
    async fn report(&self, current: f64, total: f64, message: Option<String>) {
        let percent = if total > 0.0 { current / total * 100.0 } else { 100.0 };
        info!(
            percent = percent.round(),
            detail = message.as_deref().unwrap_or(""),
            "Batch progress"
        );
    }
}

pub fn noop_progress() -> Arc<dyn ProgressReporter> {
    Arc::new(NoopProgressReporter)
}
