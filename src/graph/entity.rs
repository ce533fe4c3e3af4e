//! Entity nodes and their identity.

use serde::{Deserialize, Serialize};

use crate::models::Mention;
use crate::utils::text::normalize_whitespace;

/// Entity identity: `LABEL:normalized text`, e.g. `PERSON:John Smith`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Build an identity from a label and surface text. Whitespace inside the
    /// text is collapsed so line-wrapped mentions dedupe with inline ones.
    pub fn new(label: &str, text: &str) -> Self {
        Self(format!("{}:{}", label.trim(), normalize_whitespace(text)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named thing recognized in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// PERSON, ORG, GPE, DATE, ...
    pub label: String,
    /// Display text
    pub text: String,
    /// Mentions in the order they were added
    pub mentions: Vec<Mention>,
}

impl Entity {
    pub fn new(id: EntityId, label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            text: text.into(),
            mentions: Vec::new(),
        }
    }
}
