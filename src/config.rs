//! Engine configuration.
//!
//! Loaded from a TOML file with every field defaulted, so a partial file
//! only overrides what it names. Lookup order:
//! 1. explicit `--config` path
//! 2. `PROSEFLOW_CONFIG` env var
//! 3. `./proseflow.toml`
//! 4. `~/.config/proseflow/config.toml`
//! 5. built-in defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ProseError;

const CONFIG_ENV: &str = "PROSEFLOW_CONFIG";
const LOCAL_CONFIG_FILE: &str = "proseflow.toml";

/// Top-level configuration for the analysis engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub drift: DriftConfig,
    pub coherence: CoherenceConfig,
    pub pipeline: PipelineConfig,
    pub scoring: ScoringConfig,
    pub resolver: ResolverConfig,
    pub embedding: EmbeddingConfig,
}

/// Thematic drift cutpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Adjacent-paragraph similarity below this is a drift point (default: 0.4)
    pub threshold: f32,
    /// Similarity below this is a high-severity drift (default: 0.2)
    pub high_cutoff: f32,
    /// Similarity below this is a medium-severity drift (default: 0.3)
    pub medium_cutoff: f32,
    /// Paragraph excerpt length in suggestion details (default: 100)
    pub excerpt_chars: usize,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            threshold: 0.4,
            high_cutoff: 0.2,
            medium_cutoff: 0.3,
            excerpt_chars: 100,
        }
    }
}

/// Coherence level cutpoints (strictly-greater-than comparisons).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoherenceConfig {
    pub excellent: f32,
    pub good: f32,
    pub fair: f32,
}

impl Default for CoherenceConfig {
    fn default() -> Self {
        Self {
            excellent: 0.7,
            good: 0.5,
            fair: 0.3,
        }
    }
}

/// Orchestrator limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Budget for each external collaborator call (default: 30)
    pub stage_timeout_secs: u64,
    /// Texts shorter than this are rejected (default: 10)
    pub min_text_chars: usize,
    /// Passive sentences converted per request (default: 5)
    pub max_passive_conversions: usize,
    pub embedding_cache_capacity: u64,
    pub embedding_cache_ttl_secs: u64,
    /// Concurrent requests in `process_batch` (default: 4)
    pub batch_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: 30,
            min_text_chars: 10,
            max_passive_conversions: 5,
            embedding_cache_capacity: 10_000,
            embedding_cache_ttl_secs: 300,
            batch_concurrency: 4,
        }
    }
}

/// Quality score penalties per suggestion severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub high_penalty: u32,
    pub medium_penalty: u32,
    pub low_penalty: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            high_penalty: 15,
            medium_penalty: 8,
            low_penalty: 3,
        }
    }
}

/// How relation tokens are matched back to entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverStrategy {
    /// Case-insensitive substring match (default)
    #[default]
    Substring,
    /// Normalized Levenshtein similarity above `fuzzy_threshold`
    Fuzzy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub strategy: ResolverStrategy,
    pub fuzzy_threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            strategy: ResolverStrategy::Substring,
            fuzzy_threshold: 0.85,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Dimension of the local hashing embedder (default: 256)
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { dimensions: 256 }
    }
}

impl AppConfig {
    /// Parse a config file. Errors are returned, not defaulted.
    pub fn from_file(path: &Path) -> Result<Self, ProseError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ProseError::Config(format!("{}: {}", path.display(), e)))?;
        let config = toml::from_str::<AppConfig>(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject cutpoints that would make the severity mapping non-monotonic.
    pub fn validate(&self) -> Result<(), ProseError> {
        let d = &self.drift;
        if d.high_cutoff > d.medium_cutoff {
            return Err(ProseError::Config(format!(
                "drift.high_cutoff ({}) must not exceed drift.medium_cutoff ({})",
                d.high_cutoff, d.medium_cutoff
            )));
        }
        let c = &self.coherence;
        if c.fair > c.good || c.good > c.excellent {
            return Err(ProseError::Config(
                "coherence cutpoints must satisfy fair <= good <= excellent".to_string(),
            ));
        }
        if self.embedding.dimensions == 0 {
            return Err(ProseError::Config(
                "embedding.dimensions must be positive".to_string(),
            ));
        }
        if self.pipeline.batch_concurrency == 0 {
            return Err(ProseError::Config(
                "pipeline.batch_concurrency must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration following the documented lookup order.
///
/// An explicitly requested file must load; implicit locations fall back to
/// defaults with a warning when they cannot be parsed.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, ProseError> {
    if let Some(path) = explicit {
        let config = AppConfig::from_file(path)?;
        info!("Loaded config from {}", path.display());
        return Ok(config);
    }

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(path);
        let config = AppConfig::from_file(&path)?;
        info!("Loaded config from {} ({})", path.display(), CONFIG_ENV);
        return Ok(config);
    }

    let candidates = [
        Some(PathBuf::from(LOCAL_CONFIG_FILE)),
        dirs::config_dir().map(|d| d.join("proseflow").join("config.toml")),
    ];

    for path in candidates.into_iter().flatten() {
        if !path.exists() {
            continue;
        }
        match AppConfig::from_file(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                return Ok(config);
            }
            Err(e) => {
                warn!("Failed to load {}: {}. Using defaults.", path.display(), e);
                return Ok(AppConfig::default());
            }
        }
    }

    Ok(AppConfig::default())
}
