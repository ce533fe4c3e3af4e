//! Annotation model: linguistic output handed to the core by the
//! annotation collaborator.
//!
//! The core never tokenizes or parses on its own; everything downstream of
//! the annotation service (graph extraction, passive-voice detection,
//! sentence statistics) reads these types.

use serde::{Deserialize, Serialize};

/// Dependency label for the passive subject ("The ball" in "The ball was kicked").
pub const DEP_NSUBJPASS: &str = "nsubjpass";
/// Dependency label for the passive auxiliary ("was").
pub const DEP_AUXPASS: &str = "auxpass";
/// Dependency label for the "by" phrase introducing the agent.
pub const DEP_AGENT: &str = "agent";
/// Dependency label for the object of a preposition.
pub const DEP_POBJ: &str = "pobj";

/// Full annotation of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnnotation {
    /// Sentences in document order
    pub sentences: Vec<SentenceAnnotation>,
    /// Recognized entities, one record per distinct (label, text)
    pub entities: Vec<EntityAnnotation>,
    /// Dependency-derived subject-predicate-object candidates
    pub relations: Vec<RelationCandidate>,
}

/// A sentence with its tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentenceAnnotation {
    pub text: String,
    /// Character offset of the sentence start within the document
    pub start: usize,
    /// Character offset one past the sentence end
    pub end: usize,
    pub tokens: Vec<TokenAnnotation>,
}

/// A single token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenAnnotation {
    pub text: String,
    pub lemma: String,
    /// Character offset within the document
    pub idx: usize,
    /// Dependency label (empty when the parser did not attach one)
    #[serde(default)]
    pub dep: String,
    /// Index of the syntactic head within the sentence; `None` for the root
    #[serde(default)]
    pub head: Option<usize>,
}

impl SentenceAnnotation {
    /// Tokens whose head is the token at `index`. An index past the end of
    /// the sentence has no children.
    pub fn children(&self, index: usize) -> impl Iterator<Item = (usize, &TokenAnnotation)> {
        let in_range = index < self.tokens.len();
        self.tokens
            .iter()
            .enumerate()
            .filter(move |(i, t)| in_range && *i != index && t.head == Some(index))
    }

    /// First child of `index` carrying the given dependency label.
    pub fn child_with_dep(&self, index: usize, dep: &str) -> Option<(usize, &TokenAnnotation)> {
        self.children(index).find(|(_, t)| t.dep == dep)
    }

    /// Number of word tokens (punctuation included, as the parser counts them).
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A recognized entity with every place it was mentioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityAnnotation {
    /// Entity class, e.g. PERSON, ORG, GPE, DATE
    pub label: String,
    /// Surface text as it appeared
    pub text: String,
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

/// One mention span of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// Text of the sentence containing the mention
    pub sentence: String,
    pub start: usize,
    pub end: usize,
}

/// A subject-predicate-object candidate. Endpoints are raw token text and
/// still have to be resolved to entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationCandidate {
    pub subject: String,
    /// Lemma of the verb linking subject and object
    pub predicate: String,
    pub object: String,
    pub sentence: String,
}
