//! Contradiction view over the knowledge graph.

use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::store::OutEdge;
use crate::models::Severity;

/// Two or more distinct objects reached from one subject under one predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contradiction {
    /// Subject entity
    pub entity: EntityId,
    pub predicate: String,
    /// Distinct objects in first-seen order (always more than one)
    pub objects: Vec<EntityId>,
    /// Every supporting sentence, one per edge
    pub sentences: Vec<String>,
    pub severity: Severity,
}

/// Group one node's outgoing edges by predicate and emit a contradiction for
/// each predicate with more than one distinct object.
///
/// Output order follows the first appearance of each predicate.
pub(crate) fn group_contradictions(subject: &EntityId, edges: &[OutEdge]) -> Vec<Contradiction> {
    let mut groups: Vec<(&str, Vec<&EntityId>, Vec<&str>)> = Vec::new();

    for edge in edges {
        let pos = match groups.iter().position(|(p, _, _)| *p == edge.predicate) {
            Some(i) => i,
            None => {
                groups.push((edge.predicate.as_str(), Vec::new(), Vec::new()));
                groups.len() - 1
            }
        };
        let group = &mut groups[pos];
        if !group.1.contains(&&edge.target) {
            group.1.push(&edge.target);
        }
        group.2.push(edge.sentence.as_str());
    }

    groups
        .into_iter()
        .filter(|(_, objects, _)| objects.len() > 1)
        .map(|(predicate, objects, sentences)| Contradiction {
            entity: subject.clone(),
            predicate: predicate.to_string(),
            objects: objects.into_iter().cloned().collect(),
            sentences: sentences.into_iter().map(String::from).collect(),
            // Single-tier until confidence signals are available.
            severity: Severity::Medium,
        })
        .collect()
}
