//! Token-to-entity resolution strategies.
//!
//! Relation candidates name their endpoints by raw token text ("John" in
//! "John visited Paris"). A resolver maps that text back to a known entity.
//! Unresolved tokens drop the relation, so graphs may under-report.

use rapidfuzz::distance::levenshtein;

use super::entity::{Entity, EntityId};
use super::store::KnowledgeGraph;
use crate::config::{ResolverConfig, ResolverStrategy};

/// Maps token text to an entity identity.
pub trait EntityResolver: Send + Sync {
    fn resolve(&self, token_text: &str) -> Option<EntityId>;
}

/// Lowercased candidate list in graph insertion order.
fn candidates<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> Vec<(EntityId, String)> {
    entities
        .into_iter()
        .map(|e| (e.id.clone(), e.text.to_lowercase()))
        .collect()
}

/// Case-insensitive substring match: the first entity whose text contains the
/// token wins.
pub struct SubstringResolver {
    candidates: Vec<(EntityId, String)>,
}

impl SubstringResolver {
    pub fn new<'a>(entities: impl IntoIterator<Item = &'a Entity>) -> Self {
        Self {
            candidates: candidates(entities),
        }
    }
}

impl EntityResolver for SubstringResolver {
    fn resolve(&self, token_text: &str) -> Option<EntityId> {
        let token = token_text.trim().to_lowercase();
        if token.is_empty() {
            return None;
        }
        self.candidates
            .iter()
            .find(|(_, text)| text.contains(&token))
            .map(|(id, _)| id.clone())
    }
}

/// Substring match first, then the best normalized Levenshtein similarity
/// against the full entity text or any of its words.
pub struct FuzzyResolver {
    candidates: Vec<(EntityId, String)>,
    threshold: f64,
    exact: SubstringResolver,
}

impl FuzzyResolver {
    pub fn new<'a>(entities: impl IntoIterator<Item = &'a Entity> + Clone, threshold: f64) -> Self {
        Self {
            candidates: candidates(entities.clone()),
            threshold,
            exact: SubstringResolver::new(entities),
        }
    }
}

impl EntityResolver for FuzzyResolver {
    fn resolve(&self, token_text: &str) -> Option<EntityId> {
        if let Some(id) = self.exact.resolve(token_text) {
            return Some(id);
        }

        let token = token_text.trim().to_lowercase();
        if token.is_empty() {
            return None;
        }

        let mut best: Option<(&EntityId, f64)> = None;
        for (id, text) in &self.candidates {
            let score = std::iter::once(text.as_str())
                .chain(text.split_whitespace())
                .map(|part| levenshtein::normalized_similarity(token.chars(), part.chars()))
                .fold(0.0_f64, f64::max);
            // Strictly greater keeps the earliest entity on ties.
            let better = match best {
                Some((_, b)) => score > b,
                None => true,
            };
            if score >= self.threshold && better {
                best = Some((id, score));
            }
        }
        best.map(|(id, _)| id.clone())
    }
}

/// Build the configured resolver over the entities currently in `graph`.
pub fn resolver_for(config: &ResolverConfig, graph: &KnowledgeGraph) -> Box<dyn EntityResolver> {
    match config.strategy {
        ResolverStrategy::Substring => Box::new(SubstringResolver::new(graph.entities())),
        ResolverStrategy::Fuzzy => {
            let entities: Vec<&Entity> = graph.entities().collect();
            Box::new(FuzzyResolver::new(
                entities.iter().copied(),
                config.fuzzy_threshold,
            ))
        }
    }
}
