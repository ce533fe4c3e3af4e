//! Stage identifiers and the per-stage tagged result.

use serde::{Deserialize, Serialize};

use crate::ProseError;

/// Analysis stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Narrative,
    Structure,
    Theme,
    Tone,
    StyleTransform,
    Suggestions,
    Diff,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Narrative,
        Stage::Structure,
        Stage::Theme,
        Stage::Tone,
        Stage::StyleTransform,
        Stage::Suggestions,
        Stage::Diff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Narrative => "narrative",
            Stage::Structure => "structure",
            Stage::Theme => "theme",
            Stage::Tone => "tone",
            Stage::StyleTransform => "style_transform",
            Stage::Suggestions => "suggestions",
            Stage::Diff => "diff",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one stage.
///
/// Serializes as the payload itself, or as `{"error": "..."}` when the stage
/// failed, so consumers can check each report section for an `error` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageResult<T> {
    Failed { error: String },
    Ok(T),
}

impl<T> StageResult<T> {
    pub fn failed(error: impl std::fmt::Display) -> Self {
        StageResult::Failed {
            error: error.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, StageResult::Ok(_))
    }

    pub fn as_ok(&self) -> Option<&T> {
        match self {
            StageResult::Ok(value) => Some(value),
            StageResult::Failed { .. } => None,
        }
    }

    pub fn into_ok(self) -> Option<T> {
        match self {
            StageResult::Ok(value) => Some(value),
            StageResult::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            StageResult::Ok(_) => None,
            StageResult::Failed { error } => Some(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StageResult<U> {
        match self {
            StageResult::Ok(value) => StageResult::Ok(f(value)),
            StageResult::Failed { error } => StageResult::Failed { error },
        }
    }
}

impl<T> From<Result<T, ProseError>> for StageResult<T> {
    fn from(result: Result<T, ProseError>) -> Self {
        match result {
            Ok(value) => StageResult::Ok(value),
            Err(err) => StageResult::failed(err),
        }
    }
}
