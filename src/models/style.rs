//! Style transformation types shared by the substitution collaborator and
//! the diff stage.

use serde::{Deserialize, Serialize};

/// Direction of a style transformation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetTone {
    #[default]
    Formal,
    Informal,
}

impl TargetTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetTone::Formal => "formal",
            TargetTone::Informal => "informal",
        }
    }
}

impl std::fmt::Display for TargetTone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TargetTone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "formal" => Ok(TargetTone::Formal),
            "informal" => Ok(TargetTone::Informal),
            other => Err(format!(
                "unknown tone '{}' (expected 'formal' or 'informal')",
                other
            )),
        }
    }
}

/// A single lexical substitution with its justification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    pub original: String,
    pub replacement: String,
    /// Character offset of `original` in the source text
    pub position: usize,
    pub reason: String,
    #[serde(default)]
    pub part_of_speech: Option<String>,
}

/// Outcome of transforming a text toward a target tone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleTransformation {
    pub original_text: String,
    pub transformed_text: String,
    pub target_tone: TargetTone,
    pub num_changes: usize,
    pub changes: Vec<Substitution>,
}
